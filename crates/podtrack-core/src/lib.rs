//! Core library for the podtrack proof-of-delivery tracker.
//!
//! A trip delivers goods to one or more clients. For each trip/client pair the
//! back office walks a fixed sequence of POD (proof of delivery) steps,
//! `started → complete → pod_received → pod_submitted → settled`, and attaches
//! evidence documents to the steps.
//!
//! This crate provides:
//!
//! - [`models`]: the step catalog, documents and POD records
//! - [`tracker`]: [`PodTracker`], which moves a pair one step at a time and
//!   only after the authority confirms
//! - [`remote`]: the [`PodAuthority`] trait with a REST client
//!   ([`HttpAuthority`]) and a SQLite store ([`LocalAuthority`])
//! - [`grouping`]: documents grouped by step
//! - [`validation`]: the upload policy applied to every upload
//! - [`inflight`]: the registry that keeps one transition per pair in flight
//! - [`display`]: markdown formatting for all of the above
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use podtrack_core::{LocalAuthority, TrackerBuilder, UploadFile};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = LocalAuthority::builder()
//!     .with_database_path(Some("pods.db"))
//!     .build()
//!     .await?;
//! authority.register("T-100", "C-7", None).await?;
//!
//! let builder = TrackerBuilder::new(Arc::new(authority));
//! let mut tracker = builder.open("T-100", "C-7").await?;
//!
//! tracker.advance().await?;
//! tracker
//!     .upload_evidence("complete", &UploadFile::from_path("delivery.pdf").await?)
//!     .await?;
//! tracker.refresh().await?;
//!
//! println!("{}", tracker.progression());
//! println!("{}", tracker.documents_view());
//! # Ok(())
//! # }
//! ```

pub mod db;
pub mod display;
pub mod error;
pub mod grouping;
pub mod inflight;
pub mod models;
pub mod remote;
pub mod tracker;
pub mod validation;

// Re-export commonly used types
pub use db::Database;
pub use display::{CatalogView, DocumentGroupsView, OperationStatus, ProgressionView};
pub use error::{PodError, Result};
pub use grouping::{group_by_step, DocumentGroups};
pub use inflight::{InFlightGuard, InFlightRegistry};
pub use models::{
    initialize, ClientPodRecord, Document, PodKey, StatusPolicy, Step, StepCatalog, UploadFile,
};
pub use remote::{HttpAuthority, LocalAuthority, PodAuthority};
pub use tracker::{PodTracker, TrackerBuilder, TrackerConfig, TrackerEvent};
pub use validation::{UploadPolicy, UploadViolation};

//! The authority that confirms transitions and stores evidence.
//!
//! The tracker never mutates POD state itself. It asks a [`PodAuthority`]
//! and only reflects what the authority confirmed.
//!
//! ```text
//! ┌─────────────┐   update_status / upload_*   ┌──────────────────┐
//! │ PodTracker  │─────────────────────────────▶│  PodAuthority    │
//! │             │◀─────────────────────────────│ (HTTP or SQLite) │
//! └─────────────┘  {success, message, version} └──────────────────┘
//! ```
//!
//! - [`http`]: the REST API of the fleet back office
//! - [`local`]: a SQLite-backed store for offline use and tests

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::{ClientPodRecord, Document, UploadFile},
};

pub mod http;
pub mod local;

pub use http::{HttpAuthority, HttpAuthorityBuilder};
pub use local::{LocalAuthority, LocalAuthorityBuilder};

/// Body of a status transition request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusUpdate {
    /// Target step key
    pub status: String,

    /// Version the transition is based on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

/// Envelope returned for a status transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TransitionResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Record version after the transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl TransitionResponse {
    pub fn accepted(version: u64) -> Self {
        Self {
            success: true,
            message: None,
            version: Some(version),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            version: None,
        }
    }
}

/// Envelope returned for an evidence upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// The stored document descriptor
    #[serde(default, rename = "data", skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

impl UploadResponse {
    pub fn stored(document: Document) -> Self {
        Self {
            success: true,
            message: None,
            document: Some(document),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            document: None,
        }
    }
}

/// Remote authority for POD records.
///
/// Implementations report refusals in the response envelope and reserve
/// `Err` for calls that never produced a usable answer.
#[async_trait]
pub trait PodAuthority: Send + Sync {
    /// Reads the current record for a trip/client pair.
    async fn fetch_client_pod(&self, trip_id: &str, client_id: &str) -> Result<ClientPodRecord>;

    /// Requests a status transition.
    async fn update_status(
        &self,
        trip_id: &str,
        client_id: &str,
        update: &StatusUpdate,
    ) -> Result<TransitionResponse>;

    /// Stores an evidence document for one step of a trip/client pair.
    async fn upload_document(
        &self,
        trip_id: &str,
        client_id: &str,
        step_key: &str,
        file: &UploadFile,
    ) -> Result<UploadResponse>;

    /// Stores a standalone file and returns its URL.
    async fn upload_file(&self, file: &UploadFile) -> Result<String>;
}

//! Builder and configuration for [`PodTracker`] instances.

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc::UnboundedSender;

use super::{bounded, PodTracker, TrackerEvent};
use crate::{
    error::Result,
    grouping::DocumentGroups,
    inflight::InFlightRegistry,
    models::{PodKey, StatusPolicy, StepCatalog},
    remote::PodAuthority,
    validation::UploadPolicy,
};

/// Default time a single remote call may take.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunables shared by every tracker a builder produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Upper bound for each remote call
    pub request_timeout: Duration,

    /// Checks applied to every upload before it is sent
    pub upload_policy: UploadPolicy,

    /// Handling of persisted statuses missing from the catalog
    pub status_policy: StatusPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            upload_policy: UploadPolicy::default(),
            status_policy: StatusPolicy::default(),
        }
    }
}

/// Builder for creating [`PodTracker`] instances.
///
/// One builder can open trackers for many trip/client pairs; they all share
/// the builder's [`InFlightRegistry`].
#[derive(Clone)]
pub struct TrackerBuilder {
    authority: Arc<dyn PodAuthority>,
    catalog: Arc<StepCatalog>,
    registry: InFlightRegistry,
    config: TrackerConfig,
    events: Option<UnboundedSender<TrackerEvent>>,
}

impl TrackerBuilder {
    /// Creates a builder over an authority with the standard catalog.
    pub fn new(authority: Arc<dyn PodAuthority>) -> Self {
        Self {
            authority,
            catalog: Arc::new(StepCatalog::standard()),
            registry: InFlightRegistry::new(),
            config: TrackerConfig::default(),
            events: None,
        }
    }

    pub fn with_catalog(mut self, catalog: StepCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    /// Shares an existing registry, e.g. with trackers from another builder.
    pub fn with_registry(mut self, registry: InFlightRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn with_status_policy(mut self, policy: StatusPolicy) -> Self {
        self.config.status_policy = policy;
        self
    }

    /// Sends refetch requests and user notices to `events`.
    pub fn with_events(mut self, events: UnboundedSender<TrackerEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    /// Loads the record for a trip/client pair and opens a tracker on it.
    ///
    /// # Errors
    ///
    /// Returns `PodError::ClientPodNotFound` if the authority has no record,
    /// `PodError::UnknownStatus` if the persisted status is not in the
    /// catalog under [`StatusPolicy::Strict`], or a transport error.
    pub async fn open(&self, trip_id: &str, client_id: &str) -> Result<PodTracker> {
        let record = bounded(
            self.config.request_timeout,
            "Loading POD record",
            None,
            self.authority.fetch_client_pod(trip_id, client_id),
        )
        .await?;

        let mut tracker = self.attach(trip_id, client_id, None)?;
        tracker.apply_record(record)?;
        Ok(tracker)
    }

    /// Opens a tracker from a status the caller already holds, without a
    /// remote read. The tracker sends no version token until it refreshes.
    pub fn attach(
        &self,
        trip_id: &str,
        client_id: &str,
        persisted_status: Option<&str>,
    ) -> Result<PodTracker> {
        let current_index = self
            .catalog
            .resolve(persisted_status, self.config.status_policy)?;

        Ok(PodTracker {
            authority: Arc::clone(&self.authority),
            catalog: Arc::clone(&self.catalog),
            registry: self.registry.clone(),
            config: self.config.clone(),
            events: self.events.clone(),
            key: PodKey::new(trip_id, client_id),
            current_index,
            version: None,
            documents: DocumentGroups::default(),
        })
    }
}

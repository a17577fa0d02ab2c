//! POD progression tracker.
//!
//! A [`PodTracker`] shows the current delivery stage of one trip/client pair
//! and moves it one step forward or back through a
//! [`PodAuthority`](crate::remote::PodAuthority). The local index only changes
//! after the authority confirms a transition.
//!
//! ```text
//! started ─▶ complete ─▶ pod_received ─▶ pod_submitted ─▶ settled
//!         ◀─          ◀─              ◀─               ◀─
//! ```
//!
//! Each transition:
//!
//! 1. checks the precondition (not at the terminal/initial step),
//! 2. claims the pair in the shared [`InFlightRegistry`],
//! 3. sends one request, bounded by the configured timeout and an optional
//!    cancellation token,
//! 4. on success moves the index and emits [`TrackerEvent::Refetch`].
//!
//! Failures at any stage leave the index untouched and emit a
//! [`TrackerEvent::Notice`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use podtrack_core::{remote::LocalAuthority, tracker::TrackerBuilder};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = LocalAuthority::builder()
//!     .with_database_path(Some("pods.db"))
//!     .build()
//!     .await?;
//! authority.register("T-100", "C-7", Some("pod_received")).await?;
//!
//! let mut tracker = TrackerBuilder::new(Arc::new(authority))
//!     .open("T-100", "C-7")
//!     .await?;
//! tracker.advance().await?;
//! assert_eq!(tracker.current_step().key, "pod_submitted");
//! # Ok(())
//! # }
//! ```

use std::{future::Future, sync::Arc, time::Duration};

use log::{info, warn};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::{
    display::{DocumentGroupsView, OperationStatus, ProgressionView},
    error::{PodError, Result},
    grouping::{group_by_step, DocumentGroups},
    inflight::InFlightRegistry,
    models::{ClientPodRecord, Document, PodKey, Step, StepCatalog, UploadFile},
    remote::{PodAuthority, StatusUpdate},
};

pub mod builder;


pub use builder::{TrackerBuilder, TrackerConfig, DEFAULT_REQUEST_TIMEOUT};

/// Signals for the hosting view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerEvent {
    /// The authority confirmed a change; reload the record for this pair
    Refetch(PodKey),

    /// A message for the user
    Notice(OperationStatus),
}

/// Direction of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Advance,
    Revert,
}

impl Direction {
    fn operation(self) -> &'static str {
        match self {
            Direction::Advance => "Advancing POD status",
            Direction::Revert => "Reverting POD status",
        }
    }
}

/// Races `call` against the timeout and, if given, a cancellation token.
pub(crate) async fn bounded<T>(
    timeout: Duration,
    operation: &'static str,
    cancel: Option<&CancellationToken>,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    let timed = tokio::time::timeout(timeout, call);
    let outcome = match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => return Err(PodError::Cancelled { operation }),
            outcome = timed => outcome,
        },
        None => timed.await,
    };

    outcome.map_err(|_| PodError::Timeout {
        operation,
        after: timeout,
    })?
}

/// Progression state of one trip/client pair.
pub struct PodTracker {
    pub(crate) authority: Arc<dyn PodAuthority>,
    pub(crate) catalog: Arc<StepCatalog>,
    pub(crate) registry: InFlightRegistry,
    pub(crate) config: TrackerConfig,
    pub(crate) events: Option<UnboundedSender<TrackerEvent>>,
    pub(crate) key: PodKey,
    pub(crate) current_index: usize,
    pub(crate) version: Option<u64>,
    pub(crate) documents: DocumentGroups,
}

impl PodTracker {
    pub fn key(&self) -> &PodKey {
        &self.key
    }

    pub fn catalog(&self) -> &StepCatalog {
        &self.catalog
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_step(&self) -> &Step {
        &self.catalog.steps()[self.current_index]
    }

    /// Version token sent with the next transition, if known.
    pub fn version(&self) -> Option<u64> {
        self.version
    }

    /// Documents as of the last refresh.
    pub fn documents(&self) -> &DocumentGroups {
        &self.documents
    }

    pub fn can_advance(&self) -> bool {
        self.current_index < self.catalog.terminal_index()
    }

    pub fn can_revert(&self) -> bool {
        self.current_index > 0
    }

    /// Whether any tracker sharing this registry has a transition in flight
    /// for this pair.
    pub fn is_busy(&self) -> bool {
        self.registry.is_in_flight(&self.key)
    }

    pub fn progression(&self) -> ProgressionView<'_> {
        ProgressionView::new(&self.key, &self.catalog, self.current_index)
    }

    pub fn documents_view(&self) -> DocumentGroupsView<'_> {
        DocumentGroupsView::new(&self.documents, &self.catalog)
    }

    /// Moves to the next step once the authority confirms it.
    ///
    /// # Errors
    ///
    /// `AtTerminalStage` at the last step (no request is sent),
    /// `TransitionInFlight` if the pair is busy, `TransitionRejected`,
    /// `TransportFailure` or `Timeout` otherwise. The index is unchanged on
    /// every error.
    pub async fn advance(&mut self) -> Result<()> {
        self.transition(Direction::Advance, None).await
    }

    /// Moves to the previous step once the authority confirms it.
    ///
    /// # Errors
    ///
    /// As [`PodTracker::advance`], with `AtInitialStage` at the first step.
    pub async fn revert(&mut self) -> Result<()> {
        self.transition(Direction::Revert, None).await
    }

    /// [`PodTracker::advance`] that gives up with `Cancelled` when `cancel`
    /// fires.
    pub async fn advance_with(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.transition(Direction::Advance, Some(cancel)).await
    }

    /// [`PodTracker::revert`] that gives up with `Cancelled` when `cancel`
    /// fires.
    pub async fn revert_with(&mut self, cancel: &CancellationToken) -> Result<()> {
        self.transition(Direction::Revert, Some(cancel)).await
    }

    async fn transition(
        &mut self,
        direction: Direction,
        cancel: Option<&CancellationToken>,
    ) -> Result<()> {
        match self.try_transition(direction, cancel).await {
            Ok(step) => {
                info!("{} moved to '{}'", self.key, step.key);
                self.emit(TrackerEvent::Refetch(self.key.clone()));
                self.emit(TrackerEvent::Notice(OperationStatus::success(format!(
                    "POD status set to {}",
                    step.label
                ))));
                Ok(())
            }
            Err(e) => {
                self.report(&e, OperationStatus::failure(e.transition_notice()));
                Err(e)
            }
        }
    }

    async fn try_transition(
        &mut self,
        direction: Direction,
        cancel: Option<&CancellationToken>,
    ) -> Result<Step> {
        let target_index = match direction {
            Direction::Advance if !self.can_advance() => {
                return Err(PodError::AtTerminalStage {
                    step: self.current_step().key.clone(),
                })
            }
            Direction::Revert if !self.can_revert() => {
                return Err(PodError::AtInitialStage {
                    step: self.current_step().key.clone(),
                })
            }
            Direction::Advance => self.current_index + 1,
            Direction::Revert => self.current_index - 1,
        };

        let _guard = self
            .registry
            .try_acquire(&self.key)
            .ok_or_else(|| PodError::TransitionInFlight {
                trip_id: self.key.trip_id.clone(),
                client_id: self.key.client_id.clone(),
            })?;

        let target = self.catalog.steps()[target_index].clone();
        let update = StatusUpdate {
            status: target.key.clone(),
            version: self.version,
        };

        let response = bounded(
            self.config.request_timeout,
            direction.operation(),
            cancel,
            self.authority
                .update_status(&self.key.trip_id, &self.key.client_id, &update),
        )
        .await?;

        if !response.success {
            return Err(PodError::TransitionRejected {
                message: response
                    .message
                    .unwrap_or_else(|| "The server did not accept the change".to_string()),
            });
        }

        self.current_index = target_index;
        self.version = response.version;
        Ok(target)
    }

    /// Uploads an evidence document for one step.
    ///
    /// The document becomes visible in [`PodTracker::documents`] after the
    /// next [`PodTracker::refresh`]; nothing local changes here.
    ///
    /// # Errors
    ///
    /// `UnknownStep` or `InvalidUpload` before anything is sent;
    /// `UploadRejected` or `UploadTransportFailure` afterwards.
    pub async fn upload_evidence(&self, step_key: &str, file: &UploadFile) -> Result<Document> {
        match self.try_upload_evidence(step_key, file).await {
            Ok(document) => {
                info!(
                    "{} stored {} for '{}'",
                    self.key, file.file_name, document.step_key
                );
                self.emit(TrackerEvent::Refetch(self.key.clone()));
                self.emit(TrackerEvent::Notice(OperationStatus::success(format!(
                    "Uploaded {}",
                    file.file_name
                ))));
                Ok(document)
            }
            Err(e) => {
                self.report(&e, OperationStatus::from(&e));
                Err(e)
            }
        }
    }

    async fn try_upload_evidence(&self, step_key: &str, file: &UploadFile) -> Result<Document> {
        if !self.catalog.contains(step_key) {
            return Err(PodError::UnknownStep {
                key: step_key.to_string(),
            });
        }
        self.validate(file)?;

        let response = bounded(
            self.config.request_timeout,
            "Uploading POD document",
            None,
            self.authority.upload_document(
                &self.key.trip_id,
                &self.key.client_id,
                step_key,
                file,
            ),
        )
        .await
        .map_err(PodError::into_upload_error)?;

        if !response.success {
            return Err(PodError::UploadRejected {
                message: response
                    .message
                    .unwrap_or_else(|| "The server did not accept the document".to_string()),
            });
        }

        response
            .document
            .ok_or_else(|| PodError::UploadTransportFailure {
                message: "No document descriptor in response".to_string(),
            })
    }

    /// Uploads a standalone file and returns its stored URL.
    ///
    /// # Errors
    ///
    /// `InvalidUpload` before anything is sent; `UploadRejected` or
    /// `UploadTransportFailure` afterwards.
    pub async fn upload_single(&self, file: &UploadFile) -> Result<String> {
        let result = match self.validate(file) {
            Ok(()) => bounded(
                self.config.request_timeout,
                "Uploading file",
                None,
                self.authority.upload_file(file),
            )
            .await
            .map_err(PodError::into_upload_error),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.report(e, OperationStatus::from(e));
        }
        result
    }

    /// Reloads the record: index, version token and document groups.
    ///
    /// # Errors
    ///
    /// Transport errors, `ClientPodNotFound`, or `UnknownStatus` under the
    /// strict status policy. The tracker is unchanged on error.
    pub async fn refresh(&mut self) -> Result<()> {
        let record = bounded(
            self.config.request_timeout,
            "Loading POD record",
            None,
            self.authority
                .fetch_client_pod(&self.key.trip_id, &self.key.client_id),
        )
        .await?;
        self.apply_record(record)
    }

    pub(crate) fn apply_record(&mut self, record: ClientPodRecord) -> Result<()> {
        let index = self
            .catalog
            .resolve(record.status.as_deref(), self.config.status_policy)?;
        let documents = group_by_step(record.documents);

        for orphan in documents.orphans(&self.catalog) {
            warn!(
                "{} has documents for unknown step '{orphan}'",
                self.key
            );
        }

        self.current_index = index;
        self.version = Some(record.version);
        self.documents = documents;
        Ok(())
    }

    fn validate(&self, file: &UploadFile) -> Result<()> {
        self.config.upload_policy.check(file)
    }

    fn report(&self, error: &PodError, notice: OperationStatus) {
        if error.is_precondition() {
            info!("{}: {error}", self.key);
        } else {
            warn!("{}: {error}", self.key);
        }
        self.emit(TrackerEvent::Notice(notice));
    }

    fn emit(&self, event: TrackerEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver means nobody is listening anymore
            let _ = events.send(event);
        }
    }
}

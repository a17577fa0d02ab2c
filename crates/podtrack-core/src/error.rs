//! Error types for the POD tracker library.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::validation::UploadViolation;

/// Comprehensive error type for all tracker and authority operations.
#[derive(Error, Debug)]
pub enum PodError {
    /// Advance requested while already at the last step
    #[error("Already at final step '{step}'")]
    AtTerminalStage { step: String },
    /// Revert requested while already at the first step
    #[error("Already at first step '{step}'")]
    AtInitialStage { step: String },
    /// Another transition for the same trip/client has not resolved yet
    #[error("A status change for trip {trip_id} / client {client_id} is already in progress")]
    TransitionInFlight { trip_id: String, client_id: String },
    /// The authority answered but refused the transition
    #[error("Status change rejected: {message}")]
    TransitionRejected { message: String },
    /// The transition request never got a usable answer
    #[error("Transport failure: {message}")]
    TransportFailure { message: String },
    /// The authority answered but refused the upload
    #[error("Upload rejected: {message}")]
    UploadRejected { message: String },
    /// The upload request never got a usable answer
    #[error("Upload transport failure: {message}")]
    UploadTransportFailure { message: String },
    /// The file failed the upload policy before anything was sent
    #[error("Invalid upload '{file_name}': {violation}")]
    InvalidUpload {
        file_name: String,
        violation: UploadViolation,
    },
    /// The persisted status does not name any step in the catalog
    #[error("Unrecognized POD status '{status}'")]
    UnknownStatus { status: String },
    /// A step key that is not part of the catalog
    #[error("Unknown step '{key}'")]
    UnknownStep { key: String },
    /// The remote call did not resolve in time
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
    /// The remote call was cancelled by the caller
    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },
    /// No POD record exists for the trip/client pair
    #[error("No POD record for trip {trip_id} / client {client_id}")]
    ClientPodNotFound { trip_id: String, client_id: String },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> PodError {
        PodError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PodError {
        PodError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PodError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps any transport-level error (HTTP, IO, decoding) as a transport
    /// failure.
    pub fn transport(error: impl fmt::Display) -> Self {
        PodError::TransportFailure {
            message: error.to_string(),
        }
    }

    /// Re-labels a transition-path failure for the upload path.
    ///
    /// Authorities report failures without knowing which user action they
    /// belong to; the tracker calls this so upload failures surface as upload
    /// errors.
    pub fn into_upload_error(self) -> Self {
        match self {
            PodError::TransportFailure { message } => PodError::UploadTransportFailure { message },
            PodError::TransitionRejected { message } => PodError::UploadRejected { message },
            PodError::Timeout { .. } | PodError::Cancelled { .. } => {
                PodError::UploadTransportFailure {
                    message: self.to_string(),
                }
            }
            other => other,
        }
    }

    /// Whether the failure happened before any request left the process.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            PodError::AtTerminalStage { .. }
                | PodError::AtInitialStage { .. }
                | PodError::TransitionInFlight { .. }
                | PodError::InvalidUpload { .. }
                | PodError::UnknownStep { .. }
        )
    }

    /// The message shown to the user for this failure.
    ///
    /// Transport problems get a generic message; the detailed error is
    /// logged, not shown. Failed transitions use
    /// [`PodError::transition_notice`] instead.
    pub fn notice(&self) -> String {
        match self {
            PodError::TransportFailure { .. } | PodError::Timeout { .. } => {
                "Could not reach the server.".to_string()
            }
            PodError::UploadTransportFailure { .. } => {
                "Could not reach the server. The document was not uploaded.".to_string()
            }
            PodError::TransitionRejected { message } => {
                format!("Failed to update POD status: {message}")
            }
            PodError::UploadRejected { message } => format!("Failed to upload document: {message}"),
            other => other.to_string(),
        }
    }

    /// [`PodError::notice`] for a failed status transition, which also says
    /// that the status is unchanged when the server could not be reached.
    pub fn transition_notice(&self) -> String {
        match self {
            PodError::TransportFailure { .. } | PodError::Timeout { .. } => {
                "Could not reach the server. The status was not changed.".to_string()
            }
            other => other.notice(),
        }
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| PodError::database(message).with_source(e))
    }
}

/// Extension trait attaching a path to IO errors.
pub trait IoResultExt<T> {
    /// Map IO errors to `PodError::FileSystem` for the given path.
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| PodError::FileSystem {
            path: path.into(),
            source,
        })
    }
}

impl From<reqwest::Error> for PodError {
    fn from(error: reqwest::Error) -> Self {
        PodError::transport(error)
    }
}

/// Result type alias for tracker operations
pub type Result<T> = std::result::Result<T, PodError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_notice_is_generic() {
        let error = PodError::transport("connection reset by peer");
        assert_eq!(error.notice(), "Could not reach the server.");
        assert!(!error.transition_notice().contains("connection reset"));
        assert_eq!(
            error.transition_notice(),
            "Could not reach the server. The status was not changed."
        );
    }

    #[test]
    fn test_read_failure_does_not_claim_unchanged_status() {
        let error = PodError::Timeout {
            operation: "Loading POD record",
            after: Duration::from_secs(30),
        };
        assert!(!error.notice().contains("status"));

        let error = PodError::AtTerminalStage {
            step: "settled".to_string(),
        };
        assert_eq!(error.transition_notice(), error.notice());
    }

    #[test]
    fn test_rejected_notice_carries_server_message() {
        let error = PodError::TransitionRejected {
            message: "Trip is locked".to_string(),
        };
        assert_eq!(error.notice(), "Failed to update POD status: Trip is locked");
    }

    #[test]
    fn test_into_upload_error_relabels() {
        let error = PodError::transport("boom").into_upload_error();
        assert!(matches!(error, PodError::UploadTransportFailure { .. }));

        let error = PodError::TransitionRejected {
            message: "no".to_string(),
        }
        .into_upload_error();
        assert!(matches!(error, PodError::UploadRejected { .. }));

        let error = PodError::UnknownStep {
            key: "x".to_string(),
        }
        .into_upload_error();
        assert!(matches!(error, PodError::UnknownStep { .. }));
    }

    #[test]
    fn test_precondition_classification() {
        assert!(PodError::AtTerminalStage {
            step: "settled".to_string()
        }
        .is_precondition());
        assert!(!PodError::transport("x").is_precondition());
    }
}

//! Notices shown to the user after an operation.

use std::fmt;

use crate::error::PodError;

/// A one-line success or failure message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStatus {
    pub message: String,
    pub success: bool,
}

impl OperationStatus {
    /// Create a new success status.
    pub fn success(message: String) -> Self {
        Self {
            message,
            success: true,
        }
    }

    /// Create a new failure status.
    pub fn failure(message: String) -> Self {
        Self {
            message,
            success: false,
        }
    }
}

impl From<&PodError> for OperationStatus {
    /// The failure notice for an error, using its user-facing message.
    fn from(error: &PodError) -> Self {
        Self::failure(error.notice())
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {}", if self.success { "Success:" } else { "Error:" }, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_status_display() {
        let success = OperationStatus::success("POD status set to Settled".to_string());
        assert_eq!(format!("{success}"), "Success: POD status set to Settled\n");

        let failure = OperationStatus::failure("Already at final step 'settled'".to_string());
        assert!(format!("{failure}").starts_with("Error:"));
    }

    #[test]
    fn test_failure_from_error_uses_notice() {
        let error = PodError::TransportFailure {
            message: "connection refused".to_string(),
        };
        let status = OperationStatus::from(&error);

        assert!(!status.success);
        assert_eq!(status.message, "Could not reach the server.");
    }
}

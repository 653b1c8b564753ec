use thiserror::Error;

/// Errors that can occur during screen capture operations.
///
/// Advisory conditions that do not abort an operation (a missing microphone,
/// a failed hot-swap that keeps the previous mic) are reported as
/// [`Notice`](crate::models::notice::Notice) values instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("unsupported environment: {0}")]
    UnsupportedEnvironment(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("acquisition failed: {0}")]
    AcquisitionFailed(String),

    #[error("microphone switch failed: {0}")]
    DeviceSwitchFailure(String),

    #[error("audio graph wiring failed: {0}")]
    GraphWiringFailure(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("a capture session is already active")]
    SessionActive,

    #[error("operation superseded by a newer request")]
    Superseded,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl CaptureError {
    /// Whether the failure came from the runtime lacking a capability rather
    /// than from a user or device decision.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedEnvironment(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            CaptureError::SessionActive.to_string(),
            "a capture session is already active"
        );
        assert_eq!(
            CaptureError::DeviceSwitchFailure("busy".into()).to_string(),
            "microphone switch failed: busy"
        );
        assert!(CaptureError::UnsupportedEnvironment("no display".into()).is_unsupported());
        assert!(!CaptureError::Superseded.is_unsupported());
    }
}

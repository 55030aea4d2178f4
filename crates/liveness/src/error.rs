//! Unified error type for the liveness runtime.
//!
//! Only failures that reach the caller directly live here. Once a session
//! is running, camera, detector, display and stream failures become
//! session events and end up in the session's
//! [`ErrorState`](liveness_session::ErrorState) instead.

use liveness_session::SessionError;

/// Errors returned by the `liveness` API.
#[derive(Debug, thiserror::Error)]
pub enum LivenessError {
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The credential provider could not authorize the session start.
    #[error("credentials unavailable: {0}")]
    Credentials(String),

    /// A required collaborator was not supplied to the builder.
    #[error("missing {0}")]
    MissingComponent(&'static str),

    /// The session task is gone.
    #[error("session task stopped")]
    SessionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_session_error() {
        let liveness_err: LivenessError = SessionError::EmptySessionId.into();
        assert!(matches!(liveness_err, LivenessError::Session(_)));
        assert_eq!(liveness_err.to_string(), "session id must not be empty");
    }

    #[test]
    fn test_missing_component_names_it() {
        let err = LivenessError::MissingComponent("face detector");
        assert_eq!(err.to_string(), "missing face detector");
    }

    #[test]
    fn test_credentials_error_carries_reason() {
        let err = LivenessError::Credentials("token expired".into());
        assert_eq!(err.to_string(), "credentials unavailable: token expired");
    }
}

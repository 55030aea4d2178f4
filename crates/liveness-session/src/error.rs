//! Error types for the session layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use liveness_protocol::ServerExceptionKind;

/// Errors from constructing or configuring a session machine.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A session needs the id issued by the out-of-band create call.
    #[error("session id must not be empty")]
    EmptySessionId,
}

/// What went wrong locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuntimeErrorKind {
    /// The camera could not be opened or stopped delivering frames.
    CameraUnavailable,
    /// The face detector backend failed.
    DetectorFailure,
    /// Recording or chunk encoding failed.
    CaptureFailure,
    /// The color surface failed during a light challenge.
    DisplayFailure,
    /// The stream could not be written to or read from.
    TransportFailure,
    /// The service sent something this client can't interpret.
    ProtocolFailure,
    /// A required capability is missing on this device.
    Unsupported,
}

/// Which phase deadline expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeoutPhase {
    /// No stable face before the start window closed.
    FaceSearch,
    /// The face never reached the target oval.
    Challenge,
    /// The color sequence never finished.
    Freshness,
    /// The service never closed the stream after upload.
    Analysis,
}

/// Why a session ended badly. Set once, never cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorState {
    /// The stream did not open in time. Retryable with a new session.
    ConnectionTimeout,
    /// The service declared a failure.
    Server(ServerExceptionKind),
    Runtime(RuntimeErrorKind),
    /// Too many samples with the face too close to the camera.
    FaceDistanceError,
    /// Too many samples with the face away from the oval center.
    FaceNotCenteredError,
    Timeout(TimeoutPhase),
    /// The stream closed before the upload finished.
    StreamClosed,
    /// A phone was turned sideways mid-session.
    MobileLandscape,
}

impl fmt::Display for ErrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionTimeout => write!(f, "connection timeout"),
            Self::Server(kind) => write!(f, "server error: {}", kind.exception_name()),
            Self::Runtime(kind) => write!(f, "runtime error: {kind:?}"),
            Self::FaceDistanceError => write!(f, "face too close"),
            Self::FaceNotCenteredError => write!(f, "face not centered"),
            Self::Timeout(phase) => write!(f, "{phase:?} timeout"),
            Self::StreamClosed => write!(f, "stream closed early"),
            Self::MobileLandscape => write!(f, "mobile landscape orientation"),
        }
    }
}

//! # Liveness
//!
//! Streaming session coordinator for face liveness checks.
//!
//! A session opens a stream to the liveness service, drives the camera and
//! face tracking through the service's challenge (move into an oval,
//! optionally hold still under a sequence of colors), streams the recorded
//! video, and reduces timeouts, service errors and cancellation to one
//! [`SessionOutcome`].
//!
//! The caller supplies the platform pieces through traits:
//! [`CaptureDevice`] for the camera, [`FaceDetector`] for detection,
//! [`ColorSurface`] for the light challenge and, optionally,
//! [`CredentialProvider`] and [`KeyValueStore`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use liveness::prelude::*;
//!
//! let session = LivenessSession::builder(LivenessOptions::new(session_id, "us-east-1"))
//!     .camera(camera)
//!     .detector(detector)
//!     .surface(surface)
//!     .start(WebSocketConnector::new())?;
//! session.begin().await?;
//! session.set_dom_and_camera_details(details).await?;
//! // ... watch session.subscribe() and call start_recording() when ready
//! let report = session.wait().await?;
//! ```

mod capture;
mod error;
mod options;
mod runtime;
mod telemetry;

pub use capture::{CaptureDevice, CaptureError};
pub use error::LivenessError;
pub use options::{CredentialProvider, LivenessOptions};
pub use runtime::{LivenessSession, LivenessSessionBuilder, SessionReport};
pub use telemetry::{
    ATTEMPT_KEY, ATTEMPT_WINDOW_MS, AttemptTracker, KeyValueStore, MemoryStore, TelemetryQuery,
};

pub use liveness_detect::{FaceDetector, TrackerConfig};
pub use liveness_display::ColorSurface;
pub use liveness_session::{SessionConfig, SessionOutcome, StateSnapshot};

pub mod prelude {
    pub use crate::{
        CaptureDevice, CaptureError, ColorSurface, CredentialProvider, FaceDetector,
        LivenessError, LivenessOptions, LivenessSession, SessionOutcome, SessionReport,
        StateSnapshot,
    };
    pub use liveness_detect::{DetectError, Face, Region, VideoFrame};
    pub use liveness_display::DisplayError;
    pub use liveness_protocol::FreshnessColor;
    pub use liveness_session::{
        CameraInfo, DeviceInfo, DisplaySurface, DomAndCameraDetails, ErrorState, LivenessState,
    };
    pub use liveness_transport::{ConnectRequest, MemoryConnector, WebSocketConnector};
}

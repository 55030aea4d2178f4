//! Inbound events.

use serde::{Deserialize, Serialize};

use liveness_detect::{Face, IlluminationState};
use liveness_protocol::{RenderedColor, ServerExceptionKind, SessionInformation};

use crate::{RuntimeErrorKind, TimerKind, TimerToken};

/// An open camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraInfo {
    pub device_id: String,
    pub label: String,
    /// Frame size in pixels.
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

/// A camera the user could switch to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_id: String,
    pub label: String,
}

/// The rendering layer's drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplaySurface {
    pub width: f64,
    pub height: f64,
}

/// Rendering and device details handed over by the caller once its view
/// is mounted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomAndCameraDetails {
    pub surface: DisplaySurface,
    pub selectable_devices: Vec<DeviceInfo>,
    pub is_mobile: bool,
}

/// Everything that can happen to a session.
///
/// Events come from the caller, the stream reader, the capture and
/// detection loops, the color driver and timers. All of them go through
/// one queue.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Start the session.
    Begin,
    TransportOpened,
    /// The stream failed to open in time.
    ConnectionTimeout,
    /// The service's challenge. `challenge_id` is the service's id, or one
    /// generated locally when the service sent none.
    SetSessionInfo {
        challenge_id: String,
        info: SessionInformation,
    },
    CameraReady { camera: CameraInfo },
    CameraDenied { reason: String },
    RetryCameraCheck,
    SetDomAndCameraDetails(DomAndCameraDetails),
    /// The user switched cameras before recording.
    UpdateDeviceAndStream { camera: CameraInfo },
    /// One detection sample; `face` is `None` when no face was found.
    FaceDetected {
        face: Option<Face>,
        illumination: IlluminationState,
        at: u64,
    },
    /// The user asked to start.
    StartRecording { at: u64 },
    /// The capture device confirmed recording began.
    RecordingStarted { at: u64 },
    ColorDisplayed(RenderedColor),
    ColorSequenceComplete,
    /// Recording stopped and the last chunk was flushed.
    RecordingStopped { at: u64 },
    VideoChunk { data: Vec<u8>, at: u64 },
    TimerFired { kind: TimerKind, token: TimerToken },
    /// The service closed the stream.
    Disconnect,
    ServerError {
        kind: ServerExceptionKind,
        message: String,
    },
    RuntimeError {
        kind: RuntimeErrorKind,
        message: String,
    },
    MobileLandscapeWarning,
    Cancel,
}

impl SessionEvent {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Begin => "Begin",
            Self::TransportOpened => "TransportOpened",
            Self::ConnectionTimeout => "ConnectionTimeout",
            Self::SetSessionInfo { .. } => "SetSessionInfo",
            Self::CameraReady { .. } => "CameraReady",
            Self::CameraDenied { .. } => "CameraDenied",
            Self::RetryCameraCheck => "RetryCameraCheck",
            Self::SetDomAndCameraDetails(_) => "SetDomAndCameraDetails",
            Self::UpdateDeviceAndStream { .. } => "UpdateDeviceAndStream",
            Self::FaceDetected { .. } => "FaceDetected",
            Self::StartRecording { .. } => "StartRecording",
            Self::RecordingStarted { .. } => "RecordingStarted",
            Self::ColorDisplayed(_) => "ColorDisplayed",
            Self::ColorSequenceComplete => "ColorSequenceComplete",
            Self::RecordingStopped { .. } => "RecordingStopped",
            Self::VideoChunk { .. } => "VideoChunk",
            Self::TimerFired { .. } => "TimerFired",
            Self::Disconnect => "Disconnect",
            Self::ServerError { .. } => "ServerError",
            Self::RuntimeError { .. } => "RuntimeError",
            Self::MobileLandscapeWarning => "MobileLandscapeWarning",
            Self::Cancel => "Cancel",
        }
    }
}

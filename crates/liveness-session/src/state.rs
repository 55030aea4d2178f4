//! Session states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a liveness session is.
///
/// ```text
/// Start → CameraCheck → WaitForDomAndCameraDetails → DetectFaceBeforeStart
///             ↕                                             │
///      PermissionDenied                              StartRecording
///                                                           ↓
///   RecordingStart → CheckFaceDetected → RecordingStartupDelay → LiveChallenge
///                                                                    │
///                               ┌── light challenge ── FlashColors ──┤
///                               ↓                                    ↓
///                         UploadImages ←──────────── movement only ──┘
///                               ↓
///                            Success
/// ```
///
/// Every non-terminal state can also escape to `UserCancel`,
/// `CheckConnection`, `ServerError`, `RuntimeError`, `Timeout` or
/// `PositioningFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LivenessState {
    Start,
    CameraCheck,
    /// Camera access was refused; the user may retry.
    PermissionDenied,
    WaitForDomAndCameraDetails,
    DetectFaceBeforeStart,
    /// Waiting for the capture device to confirm recording.
    RecordingStart,
    /// Recording; waiting for the first face.
    CheckFaceDetected,
    RecordingStartupDelay,
    LiveChallenge,
    FlashColors,
    UploadImages,

    // -- Terminal --
    Success,
    UserCancel,
    /// The stream never opened.
    CheckConnection,
    ServerError,
    RuntimeError,
    Timeout,
    PositioningFailed,
}

impl LivenessState {
    /// Returns `true` once the session is over.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success
                | Self::UserCancel
                | Self::CheckConnection
                | Self::ServerError
                | Self::RuntimeError
                | Self::Timeout
                | Self::PositioningFailed
        )
    }

    /// States in which video is being captured for upload.
    pub fn is_recording(&self) -> bool {
        matches!(
            self,
            Self::RecordingStart
                | Self::CheckFaceDetected
                | Self::RecordingStartupDelay
                | Self::LiveChallenge
                | Self::FlashColors
                | Self::UploadImages
        )
    }

    /// States in which the camera device may still be swapped.
    pub fn accepts_device_change(&self) -> bool {
        matches!(
            self,
            Self::WaitForDomAndCameraDetails | Self::DetectFaceBeforeStart
        )
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal_only_for_outcomes() {
        assert!(!LivenessState::Start.is_terminal());
        assert!(!LivenessState::UploadImages.is_terminal());
        assert!(!LivenessState::PermissionDenied.is_terminal());
        assert!(LivenessState::Success.is_terminal());
        assert!(LivenessState::CheckConnection.is_terminal());
        assert!(LivenessState::PositioningFailed.is_terminal());
    }

    #[test]
    fn test_is_recording_spans_recording_start_to_upload() {
        assert!(!LivenessState::DetectFaceBeforeStart.is_recording());
        assert!(LivenessState::RecordingStart.is_recording());
        assert!(LivenessState::FlashColors.is_recording());
        assert!(LivenessState::UploadImages.is_recording());
        assert!(!LivenessState::Success.is_recording());
    }

    #[test]
    fn test_display_matches_variant_name() {
        assert_eq!(LivenessState::FlashColors.to_string(), "FlashColors");
    }
}

//! Side effects requested by the machine.
//!
//! The machine never does I/O. Each transition returns a list of
//! [`Effect`]s in the order they should run, and the runtime carries them
//! out and reports back with further events.

use std::fmt;
use std::time::Duration;

use liveness_protocol::{ClientEvent, ColorSequence};

/// A per-phase deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Until the stream opens.
    Connection,
    /// Face positioning before recording.
    FaceSearch,
    /// Pause between finding the face and starting the challenge.
    StartupDelay,
    /// From recording start until the face reaches the oval.
    Challenge,
    /// The color sequence.
    Freshness,
    /// After upload, until the service closes the stream.
    Analysis,
}

/// Identifies one arming of a timer.
///
/// A timer event only counts if its token is the one the machine currently
/// holds for that kind; anything else fired after its phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T-{}", self.0)
    }
}

/// Work for the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open the stream. Report `TransportOpened`, or an error event.
    OpenTransport,
    /// Close the stream. Emitted at most once per session.
    CloseTransport,
    /// Open the camera (the given device, or the default). Report
    /// `CameraReady` or `CameraDenied`.
    AcquireCamera { device_id: Option<String> },
    /// Start the periodic sample loop that reports `FaceDetected`.
    StartFaceDetection,
    StopFaceDetection,
    /// Start recording. Report `RecordingStarted`, then `VideoChunk`s.
    StartRecording,
    /// Stop recording, flush the last chunk, then report `RecordingStopped`.
    StopRecording,
    /// Stop the camera and free the device. Emitted once, when a session
    /// that opened the camera ends.
    ReleaseCamera,
    /// Run the color sequence. Report `ColorDisplayed` per color and
    /// `ColorSequenceComplete` at the end.
    StartColorSequence(Vec<ColorSequence>),
    /// Frame and send one event on the stream.
    Send(ClientEvent),
    /// Arm a timer that reports `TimerFired { kind, token }` after `after`.
    StartTimer {
        kind: TimerKind,
        token: TimerToken,
        after: Duration,
    },
    /// Disarm a timer. Firing anyway is harmless.
    CancelTimer { kind: TimerKind, token: TimerToken },
}

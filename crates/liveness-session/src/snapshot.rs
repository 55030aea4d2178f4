//! What the rendering layer sees.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use liveness_detect::{FaceMatchState, IlluminationState, OvalDetails};
use liveness_protocol::FreshnessColor;

use crate::{DeviceInfo, ErrorState, LivenessState};

/// A read-only view of the session, published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub state: LivenessState,
    pub face_match_state: Option<FaceMatchState>,
    /// Progress toward the target oval, `0.0..=100.0`.
    pub face_match_percentage: Option<f64>,
    pub illumination_state: Option<IlluminationState>,
    /// The guide oval in display coordinates.
    pub oval: Option<OvalDetails>,
    /// Cameras on offer for a switch, and the one in use.
    pub selectable_devices: Vec<DeviceInfo>,
    pub selected_device_id: Option<String>,
    pub failed_attempts: u32,
    pub freshness_colors_shown: usize,
    /// The color on screen, while flashing.
    pub current_color: Option<FreshnessColor>,
    /// `true` when a `StartRecording` request would be accepted.
    pub ready_to_record: bool,
    pub error_state: Option<ErrorState>,
    /// Caller-supplied overrides, passed through untouched.
    pub components: HashMap<String, String>,
}

impl StateSnapshot {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The upload finished and the service closed the stream. The verdict
    /// itself is fetched out of band with the session id.
    Success,
    UserCancelled,
    Failed(ErrorState),
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn error(&self) -> Option<ErrorState> {
        match self {
            Self::Failed(error) => Some(*error),
            _ => None,
        }
    }
}

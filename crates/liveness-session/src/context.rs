//! Mutable session context, owned by the machine.
//!
//! Callers read it through [`LivenessMachine::context`](crate::LivenessMachine::context);
//! only transitions write it.

use serde::Serialize;

use liveness_detect::{Face, FaceMatchState, IlluminationState, OvalDetails};
use liveness_protocol::{RenderedColor, ServerChallenge};

use crate::{CameraInfo, DeviceInfo, DisplaySurface, ErrorState};

/// Face tracking results.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FaceMatchAssociatedParams {
    pub current_face: Option<Face>,
    /// The first face seen after recording started.
    pub start_face: Option<Face>,
    /// The face when it first matched the target oval.
    pub end_face: Option<Face>,
    pub illumination_state: Option<IlluminationState>,
    pub face_match_state: Option<FaceMatchState>,
    pub face_match_percentage: Option<f64>,
}

/// Guide oval state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OvalAssociatedParams {
    /// Face captured when the challenge began; progress is measured from it.
    pub initial_face: Option<Face>,
    /// The pre-start oval, replaced by the service's target once recording
    /// begins. Frame pixels.
    pub oval_details: Option<OvalDetails>,
    /// Display surface width over frame width.
    pub scale_factor: Option<f64>,
}

/// Capture device and rendering surface details.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VideoAssociatedParams {
    pub camera: Option<CameraInfo>,
    pub selected_device_id: Option<String>,
    pub selectable_devices: Vec<DeviceInfo>,
    pub surface: Option<DisplaySurface>,
    pub recording_start_timestamp: Option<u64>,
    pub is_mobile: bool,
}

/// The colors shown during a light challenge.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FreshnessColorAssociatedParams {
    /// Append-only until `freshness_colors_complete` latches.
    pub freshness_colors: Vec<RenderedColor>,
    pub freshness_colors_complete: bool,
}

/// Everything the machine knows about one session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    /// Set at most once.
    pub challenge_id: Option<String>,
    /// Set at most once.
    pub server_session_information: Option<ServerChallenge>,
    pub face_match: FaceMatchAssociatedParams,
    pub oval: OvalAssociatedParams,
    pub video: VideoAssociatedParams,
    pub freshness_color: FreshnessColorAssociatedParams,
    pub failed_attempts: u32,
    pub max_failed_attempts: u32,
    /// Never cleared once set.
    pub error_state: Option<ErrorState>,
    pub should_disconnect: bool,
    pub is_recording_stopped: bool,
    /// Start of the current run of acceptable face samples.
    pub face_stable_since: Option<u64>,
    /// When the face first matched the target oval.
    pub face_matched_at: Option<u64>,
    pub connected: bool,
    pub transport_close_requested: bool,
}

impl SessionContext {
    pub(crate) fn new(session_id: String, max_failed_attempts: u32) -> Self {
        Self {
            session_id,
            challenge_id: None,
            server_session_information: None,
            face_match: FaceMatchAssociatedParams::default(),
            oval: OvalAssociatedParams::default(),
            video: VideoAssociatedParams::default(),
            freshness_color: FreshnessColorAssociatedParams::default(),
            failed_attempts: 0,
            max_failed_attempts,
            error_state: None,
            should_disconnect: false,
            is_recording_stopped: false,
            face_stable_since: None,
            face_matched_at: None,
            connected: false,
            transport_close_requested: false,
        }
    }

    /// Records the challenge. Returns `false` if one was already set.
    pub(crate) fn set_challenge(&mut self, challenge_id: String, challenge: ServerChallenge) -> bool {
        if self.server_session_information.is_some() || self.challenge_id.is_some() {
            return false;
        }
        self.challenge_id = Some(challenge_id);
        self.server_session_information = Some(challenge);
        true
    }

    /// Records the error unless one is already set.
    pub(crate) fn set_error(&mut self, error: ErrorState) {
        if self.error_state.is_none() {
            self.error_state = Some(error);
        }
    }

    /// Appends a rendered color unless the sequence already completed.
    pub(crate) fn push_freshness_color(&mut self, color: RenderedColor) -> bool {
        if self.freshness_color.freshness_colors_complete {
            return false;
        }
        self.freshness_color.freshness_colors.push(color);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveness_protocol::{ChallengeConfig, FreshnessColor, OvalParameters};

    fn challenge() -> ServerChallenge {
        ServerChallenge::FaceMovement {
            oval_parameters: OvalParameters {
                width: 1.0,
                height: 1.0,
                center_x: 0.0,
                center_y: 0.0,
            },
            challenge_config: ChallengeConfig::default(),
        }
    }

    #[test]
    fn test_set_challenge_only_once() {
        let mut ctx = SessionContext::new("s".into(), 3);
        assert!(ctx.set_challenge("first".into(), challenge()));
        assert!(!ctx.set_challenge("second".into(), challenge()));
        assert_eq!(ctx.challenge_id.as_deref(), Some("first"));
    }

    #[test]
    fn test_set_error_keeps_first() {
        let mut ctx = SessionContext::new("s".into(), 3);
        ctx.set_error(ErrorState::ConnectionTimeout);
        ctx.set_error(ErrorState::StreamClosed);
        assert_eq!(ctx.error_state, Some(ErrorState::ConnectionTimeout));
    }

    #[test]
    fn test_push_freshness_color_stops_after_complete() {
        let mut ctx = SessionContext::new("s".into(), 3);
        let color = RenderedColor {
            color: FreshnessColor::new(1, 2, 3),
            sequence_number: 0,
            timestamp_ms: 1,
        };
        assert!(ctx.push_freshness_color(color));
        ctx.freshness_color.freshness_colors_complete = true;
        assert!(!ctx.push_freshness_color(color));
        assert_eq!(ctx.freshness_color.freshness_colors.len(), 1);
    }
}

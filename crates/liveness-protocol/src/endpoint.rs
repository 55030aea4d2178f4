//! Session-start endpoint and its query parameter names.

/// Query parameter carrying the out-of-band session id.
pub const SESSION_ID_PARAM: &str = "session-id";

/// Query parameter carrying the rolling attempt counter.
pub const ATTEMPT_COUNT_PARAM: &str = "attempt-count";

/// Query parameter flagging whether the pre-check screen was shown (`"1"`/`"0"`).
pub const PRECHECK_VIEW_ENABLED_PARAM: &str = "precheck-view-enabled";

/// Query parameter naming the challenge versions this client can run.
pub const CHALLENGE_VERSIONS_PARAM: &str = "challenge-versions";

/// Challenge versions advertised on every session start.
pub const SUPPORTED_CHALLENGE_VERSIONS: &str =
    "FaceMovementAndLightChallenge_1.0.0,FaceMovementChallenge_1.0.0";

/// Path of the session-start WebSocket on every streaming host.
pub const START_SESSION_PATH: &str = "/start-face-liveness-session-websocket";

/// Streaming endpoint for a service region.
pub fn endpoint_for_region(region: &str) -> String {
    format!("wss://streaming-rekognition.{region}.amazonaws.com:443{START_SESSION_PATH}")
}

/// Streaming endpoint on a caller-chosen host. `base` may be a bare
/// origin or already end in the session-start path.
pub fn endpoint_for_base(base: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(START_SESSION_PATH) {
        base.to_string()
    } else {
        format!("{base}{START_SESSION_PATH}")
    }
}

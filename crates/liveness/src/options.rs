//! Caller-facing options for one liveness session.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use liveness_detect::TrackerConfig;
use liveness_protocol::endpoint::{
    CHALLENGE_VERSIONS_PARAM, SESSION_ID_PARAM, SUPPORTED_CHALLENGE_VERSIONS, endpoint_for_base,
    endpoint_for_region,
};
use liveness_session::SessionConfig;
use liveness_transport::ConnectRequest;

use crate::LivenessError;

/// Default camera sampling rate for face detection.
const DEFAULT_DETECTION_RATE_HZ: u32 = 15;

/// Default spacing of encoded video chunks.
const DEFAULT_CHUNK_INTERVAL_MS: u64 = 1_000;

/// Options for one liveness session.
///
/// `session_id` comes from the out-of-band create call; everything else has
/// a working default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessOptions {
    pub session_id: String,

    /// Service region, used to build the endpoint.
    pub region: String,

    /// Streaming host to use instead of the regional one.
    pub endpoint_override: Option<String>,

    /// Skip the start screen: recording begins as soon as the face is in
    /// position, and the service is told no pre-check view was shown.
    pub disable_start_screen: bool,

    /// Opaque overrides for the rendering layer, forwarded in every
    /// snapshot.
    pub components: HashMap<String, String>,

    pub session: SessionConfig,

    pub tracker: TrackerConfig,

    /// How often the camera is sampled for face detection.
    pub detection_rate_hz: u32,

    /// How often encoded video is pulled from the recorder and streamed.
    pub chunk_interval_ms: u64,
}

impl Default for LivenessOptions {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            region: "us-east-1".to_string(),
            endpoint_override: None,
            disable_start_screen: false,
            components: HashMap::new(),
            session: SessionConfig::default(),
            tracker: TrackerConfig::default(),
            detection_rate_hz: DEFAULT_DETECTION_RATE_HZ,
            chunk_interval_ms: DEFAULT_CHUNK_INTERVAL_MS,
        }
    }
}

impl LivenessOptions {
    pub fn new(session_id: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            region: region.into(),
            ..Self::default()
        }
    }

    /// Returns a copy with rates clamped to usable values.
    pub fn validated(mut self) -> Self {
        if self.detection_rate_hz == 0 {
            tracing::warn!(
                fallback = DEFAULT_DETECTION_RATE_HZ,
                "detection_rate_hz is 0, using default"
            );
            self.detection_rate_hz = DEFAULT_DETECTION_RATE_HZ;
        }
        if self.chunk_interval_ms == 0 {
            tracing::warn!(
                fallback = DEFAULT_CHUNK_INTERVAL_MS,
                "chunk_interval_ms is 0, using default"
            );
            self.chunk_interval_ms = DEFAULT_CHUNK_INTERVAL_MS;
        }
        self.session = self.session.validated();
        self.tracker = self.tracker.validated();
        self
    }

    /// The session-start endpoint.
    pub fn endpoint(&self) -> String {
        match &self.endpoint_override {
            Some(base) => endpoint_for_base(base),
            None => endpoint_for_region(&self.region),
        }
    }

    /// Whether the caller shows a pre-check screen before recording.
    pub fn precheck_view_enabled(&self) -> bool {
        !self.disable_start_screen
    }

    /// Machine configuration, with auto-start on when the start screen is
    /// disabled.
    pub fn session_config(&self) -> SessionConfig {
        let mut config = self.session.clone();
        config.auto_start |= self.disable_start_screen;
        config
    }

    /// The session-start request, before telemetry and credentials.
    pub fn connect_request(&self) -> ConnectRequest {
        ConnectRequest::new(self.endpoint())
            .query(SESSION_ID_PARAM, self.session_id.as_str())
            .query(CHALLENGE_VERSIONS_PARAM, SUPPORTED_CHALLENGE_VERSIONS)
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Authorizes the session-start request.
///
/// Called once per session, right before connecting. Implementations add
/// whatever the service needs (signed query parameters, headers) to the
/// request. How the request is signed is up to the implementation.
pub trait CredentialProvider: Send + Sync + 'static {
    fn authorize(&self, request: &mut ConnectRequest) -> Result<(), LivenessError>;
}

impl<F> CredentialProvider for F
where
    F: Fn(&mut ConnectRequest) -> Result<(), LivenessError> + Send + Sync + 'static,
{
    fn authorize(&self, request: &mut ConnectRequest) -> Result<(), LivenessError> {
        self(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_region_by_default() {
        let options = LivenessOptions::new("s-1", "ap-south-1");
        assert!(options.endpoint().contains("ap-south-1"));
    }

    #[test]
    fn test_endpoint_override_wins() {
        let options = LivenessOptions {
            endpoint_override: Some("ws://127.0.0.1:9000".into()),
            ..LivenessOptions::new("s-1", "us-east-1")
        };
        assert_eq!(
            options.endpoint(),
            "ws://127.0.0.1:9000/start-face-liveness-session-websocket"
        );
    }

    #[test]
    fn test_disable_start_screen_turns_on_auto_start() {
        let options = LivenessOptions {
            disable_start_screen: true,
            ..LivenessOptions::new("s-1", "us-east-1")
        };
        assert!(options.session_config().auto_start);
        assert!(!options.precheck_view_enabled());
    }

    #[test]
    fn test_connect_request_carries_session_id() {
        let request = LivenessOptions::new("s-1", "us-east-1").connect_request();
        assert_eq!(request.query_value(SESSION_ID_PARAM), Some("s-1"));
        assert_eq!(
            request.query_value(CHALLENGE_VERSIONS_PARAM),
            Some(SUPPORTED_CHALLENGE_VERSIONS)
        );
    }

    #[test]
    fn test_validated_replaces_zero_rates() {
        let options = LivenessOptions {
            detection_rate_hz: 0,
            chunk_interval_ms: 0,
            ..LivenessOptions::default()
        }
        .validated();
        assert_eq!(options.detection_rate_hz, DEFAULT_DETECTION_RATE_HZ);
        assert_eq!(options.chunk_interval_ms, DEFAULT_CHUNK_INTERVAL_MS);
    }

    #[test]
    fn test_closure_is_a_credential_provider() {
        let provider = |req: &mut ConnectRequest| {
            req.set_header("authorization", "test");
            Ok::<(), LivenessError>(())
        };
        let mut request = ConnectRequest::new("ws://x");
        provider.authorize(&mut request).unwrap();
        assert_eq!(request.headers()[0].1, "test");
    }
}

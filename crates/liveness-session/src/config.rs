//! Session timing and positioning configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use liveness_detect::MatchThresholds;
use liveness_protocol::ServerChallenge;

/// Configuration for one liveness session.
///
/// Durations are milliseconds so the struct round-trips through JSON or
/// TOML without custom serializers. Start from `Default` and override what
/// you need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Out-of-bounds positioning samples tolerated before the session
    /// fails. The session fails on sample `max_failed_attempts + 1`.
    pub max_failed_attempts: u32,

    /// How long the stream may take to open.
    pub connection_timeout_ms: u64,

    /// How long the user has to present a stable face before recording.
    pub face_search_timeout_ms: u64,

    /// How long the face must stay acceptable before recording may start.
    pub face_stable_ms: u64,

    /// Pause between finding the face and starting the challenge.
    pub recording_startup_delay_ms: u64,

    /// Default time to reach the target oval; the service may override it.
    pub oval_fit_timeout_ms: u64,

    /// Slack on top of the color sequence's own length before the light
    /// challenge times out.
    pub freshness_grace_ms: u64,

    /// How long to wait for the service to close the stream after upload.
    pub analysis_timeout_ms: u64,

    /// Start recording as soon as the start gate opens, without waiting
    /// for the caller. Used when the start screen is disabled.
    pub auto_start: bool,

    pub thresholds: MatchThresholds,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_failed_attempts: 3,
            connection_timeout_ms: 10_000,
            face_search_timeout_ms: 30_000,
            face_stable_ms: 500,
            recording_startup_delay_ms: 100,
            oval_fit_timeout_ms: 7_000,
            freshness_grace_ms: 5_000,
            analysis_timeout_ms: 20_000,
            auto_start: false,
            thresholds: MatchThresholds::default(),
        }
    }
}

impl SessionConfig {
    /// Fixes values that would wedge the machine.
    ///
    /// - Zero phase timeouts are replaced with the default.
    /// - `face_stable_ms` is capped below `face_search_timeout_ms` so the
    ///   start gate can open before the search times out.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();
        for (name, value, fallback) in [
            (
                "connection_timeout_ms",
                &mut self.connection_timeout_ms,
                defaults.connection_timeout_ms,
            ),
            (
                "face_search_timeout_ms",
                &mut self.face_search_timeout_ms,
                defaults.face_search_timeout_ms,
            ),
            (
                "oval_fit_timeout_ms",
                &mut self.oval_fit_timeout_ms,
                defaults.oval_fit_timeout_ms,
            ),
            (
                "analysis_timeout_ms",
                &mut self.analysis_timeout_ms,
                defaults.analysis_timeout_ms,
            ),
        ] {
            if *value == 0 {
                tracing::warn!(field = name, fallback, "zero timeout, using default");
                *value = fallback;
            }
        }

        if self.face_stable_ms >= self.face_search_timeout_ms {
            let capped = self.face_search_timeout_ms / 2;
            tracing::warn!(
                face_stable_ms = self.face_stable_ms,
                capped,
                "face_stable_ms not below face_search_timeout_ms, capping"
            );
            self.face_stable_ms = capped;
        }
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    /// Oval-fit deadline for `challenge`, preferring the service's value.
    pub fn oval_fit_timeout(&self, challenge: &ServerChallenge) -> Duration {
        let ms = challenge
            .challenge_config()
            .oval_fit_timeout
            .filter(|&ms| ms > 0)
            .unwrap_or(self.oval_fit_timeout_ms);
        Duration::from_millis(ms)
    }

    /// Deadline for the color sequence of `challenge`.
    pub fn freshness_timeout(&self, challenge: &ServerChallenge) -> Duration {
        let sequence: u64 = challenge.color_sequences().iter().map(|s| s.hold_ms()).sum();
        Duration::from_millis(sequence + self.freshness_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveness_protocol::{ChallengeConfig, OvalParameters};

    fn movement(oval_fit_timeout: Option<u64>) -> ServerChallenge {
        ServerChallenge::FaceMovement {
            oval_parameters: OvalParameters {
                width: 1.0,
                height: 1.0,
                center_x: 0.0,
                center_y: 0.0,
            },
            challenge_config: ChallengeConfig {
                oval_fit_timeout,
                ..ChallengeConfig::default()
            },
        }
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.max_failed_attempts, 3);
        assert_eq!(config.connection_timeout(), Duration::from_secs(10));
        assert!(!config.auto_start);
    }

    #[test]
    fn test_validated_replaces_zero_timeouts() {
        let config = SessionConfig {
            connection_timeout_ms: 0,
            analysis_timeout_ms: 0,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(config.connection_timeout_ms, 10_000);
        assert_eq!(config.analysis_timeout_ms, 20_000);
    }

    #[test]
    fn test_validated_caps_stable_window_below_search_timeout() {
        let config = SessionConfig {
            face_stable_ms: 5_000,
            face_search_timeout_ms: 4_000,
            ..SessionConfig::default()
        }
        .validated();
        assert_eq!(config.face_stable_ms, 2_000);
    }

    #[test]
    fn test_oval_fit_timeout_prefers_server_value() {
        let config = SessionConfig::default();
        assert_eq!(
            config.oval_fit_timeout(&movement(Some(3_000))),
            Duration::from_secs(3)
        );
        assert_eq!(
            config.oval_fit_timeout(&movement(None)),
            Duration::from_secs(7)
        );
    }

    #[test]
    fn test_config_deserializes_with_missing_fields() {
        let config: SessionConfig =
            serde_json::from_str(r#"{ "auto_start": true }"#).expect("parses");
        assert!(config.auto_start);
        assert_eq!(config.face_stable_ms, 500);
    }
}

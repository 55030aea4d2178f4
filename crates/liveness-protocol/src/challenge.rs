//! Challenge descriptors sent by the liveness service.
//!
//! A session commits to exactly one challenge. The service names it with a
//! single-key object, so the Rust side models it as an externally tagged
//! enum and every consumer matches it exhaustively:
//!
//! ```json
//! { "Challenge": { "FaceMovementAndLightChallenge": { "OvalParameters": { ... } } } }
//! ```
//!
//! Field names follow the service's PascalCase JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Geometry and thresholds
// ---------------------------------------------------------------------------

/// Target oval in the coordinate space of the video frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OvalParameters {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
}

/// Optional tuning values the service may attach to a challenge.
///
/// Anything missing falls back to the client's own defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChallengeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blazeface_detection_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_distance_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_distance_threshold_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_distance_threshold_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_iou_width_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub face_iou_height_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oval_height_width_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oval_iou_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oval_iou_width_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oval_iou_height_threshold: Option<f64>,
    /// Milliseconds the user gets to fit their face into the oval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oval_fit_timeout: Option<u64>,
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

/// One freshness color, as an RGB triple.
///
/// Displays as `#RRGGBB` and parses from the same form, which is how colors
/// appear in logs, snapshots and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FreshnessColor {
    #[serde(rename = "RGB")]
    pub rgb: [u8; 3],
}

impl FreshnessColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { rgb: [r, g, b] }
    }

    /// Mean of the three channels, used to judge how much light a color
    /// throws onto the face.
    pub fn brightness(&self) -> u8 {
        let sum: u16 = self.rgb.iter().map(|&c| u16::from(c)).sum();
        (sum / 3) as u8
    }
}

impl fmt::Display for FreshnessColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.rgb;
        write!(f, "#{r:02X}{g:02X}{b:02X}")
    }
}

impl FromStr for FreshnessColor {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.is_ascii())
            .ok_or_else(|| ProtocolError::InvalidMessage(format!("bad color {s:?}")))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| ProtocolError::InvalidMessage(format!("bad color {s:?}")))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// One step of a light challenge.
///
/// `downscroll_duration` is how long the new color takes to sweep over the
/// previous one; `flat_display_duration` is how long it then stays still.
/// Both are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColorSequence {
    pub freshness_color: FreshnessColor,
    pub downscroll_duration: u64,
    pub flat_display_duration: u64,
}

impl ColorSequence {
    /// Minimum time this color must stay on screen.
    pub fn hold_ms(&self) -> u64 {
        self.downscroll_duration + self.flat_display_duration
    }
}

/// How a light challenge presents its colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightChallengeType {
    #[default]
    Sequential,
}

// ---------------------------------------------------------------------------
// Server challenge
// ---------------------------------------------------------------------------

/// Which of the two challenge types a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChallengeKind {
    #[serde(rename = "FaceMovementChallenge")]
    FaceMovement,
    #[serde(rename = "FaceMovementAndLightChallenge")]
    FaceMovementAndLight,
}

impl ChallengeKind {
    /// Wire name of the challenge, as echoed back in client events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FaceMovement => "FaceMovementChallenge",
            Self::FaceMovementAndLight => "FaceMovementAndLightChallenge",
        }
    }
}

impl fmt::Display for ChallengeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The challenge the service picked for this session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServerChallenge {
    /// Move the face into the oval.
    #[serde(rename = "FaceMovementChallenge", rename_all = "PascalCase")]
    FaceMovement {
        oval_parameters: OvalParameters,
        #[serde(default)]
        challenge_config: ChallengeConfig,
    },

    /// Move the face into the oval, then hold still under a color sequence.
    #[serde(rename = "FaceMovementAndLightChallenge", rename_all = "PascalCase")]
    FaceMovementAndLight {
        oval_parameters: OvalParameters,
        #[serde(default)]
        challenge_config: ChallengeConfig,
        color_sequences: Vec<ColorSequence>,
        #[serde(default)]
        light_challenge_type: LightChallengeType,
    },
}

impl ServerChallenge {
    pub fn kind(&self) -> ChallengeKind {
        match self {
            Self::FaceMovement { .. } => ChallengeKind::FaceMovement,
            Self::FaceMovementAndLight { .. } => ChallengeKind::FaceMovementAndLight,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn oval_parameters(&self) -> &OvalParameters {
        match self {
            Self::FaceMovement {
                oval_parameters, ..
            }
            | Self::FaceMovementAndLight {
                oval_parameters, ..
            } => oval_parameters,
        }
    }

    pub fn challenge_config(&self) -> &ChallengeConfig {
        match self {
            Self::FaceMovement {
                challenge_config, ..
            }
            | Self::FaceMovementAndLight {
                challenge_config, ..
            } => challenge_config,
        }
    }

    /// The color sequence of a light challenge; empty for movement only.
    pub fn color_sequences(&self) -> &[ColorSequence] {
        match self {
            Self::FaceMovement { .. } => &[],
            Self::FaceMovementAndLight {
                color_sequences, ..
            } => color_sequences,
        }
    }

    pub fn has_light_challenge(&self) -> bool {
        matches!(self, Self::FaceMovementAndLight { .. })
    }
}

/// Payload of the service's session-information event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionInformation {
    pub challenge: ServerChallenge,
    /// Present when the service assigns the id itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
}

/// A color as it actually appeared on screen.
///
/// `timestamp_ms` is wall-clock milliseconds read after the color was
/// painted, never the nominal schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedColor {
    pub color: FreshnessColor,
    pub sequence_number: u32,
    pub timestamp_ms: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

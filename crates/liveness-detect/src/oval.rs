//! Guide oval geometry and classification of a face against it.

use serde::{Deserialize, Serialize};

use liveness_protocol::{ChallengeConfig, OvalParameters};

use crate::{Face, Point, Region, VideoFrame};

/// Width of the pre-start oval as a share of the frame width.
const START_OVAL_WIDTH_RATIO: f64 = 0.45;

/// Height-to-width ratio of the pre-start oval.
const START_OVAL_ASPECT: f64 = 1.618;

// ---------------------------------------------------------------------------
// OvalDetails
// ---------------------------------------------------------------------------

/// A guide oval in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OvalDetails {
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl OvalDetails {
    /// The static oval shown before the service has picked a target.
    pub fn for_frame(frame_width: u32, frame_height: u32) -> Self {
        let fw = f64::from(frame_width);
        let fh = f64::from(frame_height);
        let width = fw * START_OVAL_WIDTH_RATIO;
        Self {
            center_x: fw / 2.0,
            center_y: fh / 2.0,
            width,
            height: (width * START_OVAL_ASPECT).min(fh),
        }
    }

    /// The service's target oval, which is already in frame pixels.
    pub fn from_parameters(params: &OvalParameters) -> Self {
        Self {
            center_x: params.center_x,
            center_y: params.center_y,
            width: params.width,
            height: params.height,
        }
    }

    /// This oval mapped onto a display surface `factor` times the frame.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            center_x: self.center_x * factor,
            center_y: self.center_y * factor,
            width: self.width * factor,
            height: self.height * factor,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.center_x,
            y: self.center_y,
        }
    }

    /// Bounding rectangle of the oval.
    pub fn bounds(&self) -> Region {
        Region::centered(self.center(), self.width, self.height)
    }

    pub fn to_parameters(&self) -> OvalParameters {
        OvalParameters {
            width: self.width,
            height: self.height,
            center_x: self.center_x,
            center_y: self.center_y,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Where the face sits relative to the guide oval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceMatchState {
    /// No face in the frame.
    CantIdentify,
    /// A face is present but has not been compared against an oval yet.
    FaceIdentified,
    TooFar,
    TooClose,
    OffCenter,
    Matched,
}

impl FaceMatchState {
    /// Samples that count against the positioning budget.
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::TooClose | Self::OffCenter)
    }

    /// Samples that may start or extend the stability window.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, Self::TooFar | Self::Matched)
    }
}

/// Tolerances used by [`classify_face`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// IoU between face and oval needed for `Matched`.
    pub iou_threshold: f64,
    /// How far the face may exceed the oval before it is `TooClose`, as a
    /// share of the oval's size.
    pub too_close_tolerance: f64,
    /// How far the face center may drift from the oval center, as a share
    /// of the oval's size.
    pub center_tolerance: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            iou_threshold: 0.7,
            too_close_tolerance: 0.15,
            center_tolerance: 0.15,
        }
    }
}

impl MatchThresholds {
    /// Applies any overrides the service sent with the challenge.
    pub fn with_challenge_config(mut self, config: &ChallengeConfig) -> Self {
        if let Some(iou) = config.oval_iou_threshold {
            self.iou_threshold = iou.clamp(0.0, 1.0);
        }
        if let Some(max) = config.face_distance_threshold_max {
            self.too_close_tolerance = max.max(0.0);
        }
        self
    }
}

/// Classifies one face against an oval.
///
/// Checks run in a fixed order: size first (`TooClose`), then position
/// (`OffCenter`), then overlap (`Matched`). Anything left is `TooFar`.
pub fn classify_face(face: &Face, oval: &OvalDetails, thresholds: &MatchThresholds) -> FaceMatchState {
    let region = &face.region;
    let grow = 1.0 + thresholds.too_close_tolerance;
    if region.width > oval.width * grow || region.height > oval.height * grow {
        return FaceMatchState::TooClose;
    }

    let center = region.center();
    let dx = (center.x - oval.center_x).abs();
    let dy = (center.y - oval.center_y).abs();
    if dx > oval.width * thresholds.center_tolerance || dy > oval.height * thresholds.center_tolerance {
        return FaceMatchState::OffCenter;
    }

    if region.iou(&oval.bounds()) >= thresholds.iou_threshold {
        FaceMatchState::Matched
    } else {
        FaceMatchState::TooFar
    }
}

/// Progress toward the oval as a percentage in `0.0..=100.0`.
///
/// Progress is measured from where the face started: the starting overlap
/// maps to 25% and the match threshold to 100%.
pub fn face_match_percentage(
    face: &Face,
    initial_face: &Face,
    oval: &OvalDetails,
    thresholds: &MatchThresholds,
) -> f64 {
    let bounds = oval.bounds();
    let initial = initial_face.region.iou(&bounds);
    let current = face.region.iou(&bounds);
    let span = thresholds.iou_threshold - initial;
    if span <= f64::EPSILON {
        return if current >= thresholds.iou_threshold { 100.0 } else { 25.0 };
    }
    let progress = 0.75 * (current - initial) / span + 0.25;
    progress.clamp(0.0, 1.0) * 100.0
}

// ---------------------------------------------------------------------------
// Illumination
// ---------------------------------------------------------------------------

/// How well lit the frame is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IlluminationState {
    Dark,
    Normal,
    Bright,
}

const DARK_BELOW: f64 = 50.0;
const BRIGHT_ABOVE: f64 = 200.0;

impl IlluminationState {
    pub fn from_frame(frame: &VideoFrame) -> Self {
        let mean = frame.mean_luma();
        if mean < DARK_BELOW {
            Self::Dark
        } else if mean > BRIGHT_ABOVE {
            Self::Bright
        } else {
            Self::Normal
        }
    }
}

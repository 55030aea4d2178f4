//! Face detector glue for liveness sessions.
//!
//! The backend that actually finds faces is pluggable through
//! [`FaceDetector`]. Everything on top of it is pure geometry:
//!
//! - [`FaceTracker`]: confidence gate plus smoothing, at most one face per
//!   frame
//! - [`OvalDetails`]: the guide oval, before and after the service picks a
//!   target
//! - [`classify_face`] and [`face_match_percentage`]: where the face sits
//!   relative to the oval
//! - [`IlluminationState`]: coarse lighting check
//!
//! Absence of a face is data (`Ok(None)`), never an error.

mod error;
mod face;
mod oval;
mod tracker;

pub use error::DetectError;
pub use face::{Face, Landmarks, Point, Region, VideoFrame};
pub use oval::{
    FaceMatchState, IlluminationState, MatchThresholds, OvalDetails, classify_face,
    face_match_percentage,
};
pub use tracker::{FaceDetector, FaceTracker, TrackerConfig};

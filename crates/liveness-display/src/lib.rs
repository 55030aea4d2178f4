//! Color sequence driver for light challenges.
//!
//! A light challenge flashes a server-chosen list of colors over the whole
//! screen while the camera records. The service later checks the video
//! against the colors and the times they appeared, so the times reported
//! here are read after each paint, never taken from the schedule.
//!
//! Each color first sweeps down over the previous one, then stays flat for
//! its display time. Painting is delegated to a [`ColorSurface`]; pacing
//! comes from a [`FrameTicker`](liveness_tick::FrameTicker) so every sweep
//! step lands on a frame boundary.

mod driver;
mod error;

pub use driver::{ColorSequenceDriver, ColorSurface};
pub use error::DisplayError;

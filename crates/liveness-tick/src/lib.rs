//! Frame pacing and timestamps for liveness loops.
//!
//! - [`FrameTicker`] drives the periodic loops of a session (camera
//!   sampling, face detection, color rendering) at a fixed rate, with
//!   late-frame detection and pause/resume.
//! - [`Clock`] and [`SessionClock`] give those loops Unix-millisecond
//!   timestamps that track tokio's clock, so tests can control time.
//!
//! # Integration
//!
//! A ticker sits in a `tokio::select!` next to the loop's stop signal:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut stop => break,
//!         _ = ticker.next_frame() => {
//!             let frame = camera.frame()?;
//!             events.send(SessionEvent::FaceDetected { .. })?;
//!             ticker.record_work_end();
//!         }
//!     }
//! }
//! ```

mod clock;
mod ticker;

pub use clock::{Clock, ManualClock, SessionClock};
pub use ticker::{FrameConfig, FrameMetrics, FramePolicy, FrameTick, FrameTicker};

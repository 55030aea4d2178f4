//! The liveness session state machine.
//!
//! This crate decides what happens next in a liveness check and nothing
//! else:
//!
//! 1. **State** ([`LivenessState`]): where the session is
//! 2. **Context** ([`SessionContext`]): what it has learned so far
//! 3. **Transitions** ([`LivenessMachine::handle`]): one event in, a list
//!    of [`Effect`]s out
//!
//! # How it fits in the stack
//!
//! ```text
//! Runtime (above)  ← runs effects, turns I/O results into events
//!     ↕
//! Session Layer (this crate)  ← pure, synchronous, no I/O
//!     ↕
//! Protocol + Detect (below)  ← wire events, face geometry
//! ```

mod config;
mod context;
mod effect;
mod error;
mod event;
mod machine;
mod snapshot;
mod state;

pub use config::SessionConfig;
pub use context::{
    FaceMatchAssociatedParams, FreshnessColorAssociatedParams, OvalAssociatedParams,
    SessionContext, VideoAssociatedParams,
};
pub use effect::{Effect, TimerKind, TimerToken};
pub use error::{ErrorState, RuntimeErrorKind, SessionError, TimeoutPhase};
pub use event::{CameraInfo, DeviceInfo, DisplaySurface, DomAndCameraDetails, SessionEvent};
pub use machine::{LivenessMachine, generate_challenge_id};
pub use snapshot::{SessionOutcome, StateSnapshot};
pub use state::LivenessState;

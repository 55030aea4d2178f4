//! Wire protocol for liveness streaming.
//!
//! This crate defines what the device and the liveness service say to each
//! other:
//!
//! - **Frames** ([`Frame`], [`FrameHeader`]): the binary envelope around
//!   every message.
//! - **Challenges** ([`ServerChallenge`], [`ColorSequence`], ...): the
//!   tagged descriptor the service sends once per session.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): typed payloads carried
//!   inside frames.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how structured headers and
//!   bodies become bytes.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! machine (typed events). It knows nothing about sockets or timers.
//!
//! ```text
//! Transport (bytes) → Protocol (Frame → ServerEvent) → Session machine
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod challenge;
mod codec;
pub mod endpoint;
mod error;
mod events;
mod frame;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use challenge::{
    ChallengeConfig, ChallengeKind, ColorSequence, FreshnessColor, LightChallengeType,
    OvalParameters, RenderedColor, ServerChallenge, SessionInformation,
};
pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{
    BoundingBox, ChallengeDetails, ChallengeRef, ClientChallenge, ClientEvent, ClientMessage,
    ClientSessionInformation, ColorDisplayed, DetectedFace, InitialFace, ServerEvent,
    ServerExceptionKind, TargetFace,
};
pub use frame::{Frame, FrameHeader, MAX_FRAME_LEN, MessageType, OCTET_STREAM};

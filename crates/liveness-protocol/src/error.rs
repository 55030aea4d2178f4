//! Error types for the protocol layer.

/// Errors that can occur while framing, encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The binary frame envelope is truncated or its lengths disagree.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),

    /// The frame names an event type this side does not understand.
    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    /// The message decoded but violates protocol rules.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

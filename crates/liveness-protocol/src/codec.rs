//! Codec trait and implementations for the structured parts of a frame.
//!
//! Frame headers and JSON event bodies go through a [`Codec`]; binary video
//! bodies are carried as raw bytes and never touch it. Swapping the codec
//! changes how structured data looks on the wire without touching framing.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// ## Trait bounds
///
/// - `Send + Sync`: one codec is shared by the session actor, the stream
///   reader task and the writer task, which Tokio may run on any worker
///   thread.
/// - `'static`: the codec owns everything it needs, so it can be moved
///   into spawned tasks.
///
/// ## Generic methods
///
/// `encode` accepts any `T: Serialize`, and `decode` produces any
/// `T: DeserializeOwned`. `DeserializeOwned` (rather than plain
/// `Deserialize<'de>`) means the decoded value does not borrow from the
/// input, so the receive buffer can be dropped as soon as a frame is
/// decoded.
///
/// Because the methods are generic the trait is not object safe; callers
/// take `C: Codec` as a type parameter instead of `dyn Codec`.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// The MIME type announced in frame headers for structured bodies.
    ///
    /// Written into every event frame's `:content-type` header; video
    /// frames use `application/octet-stream` regardless of the codec.
    fn content_type(&self) -> &'static str;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// ```rust
/// use liveness_protocol::{Codec, JsonCodec, OvalParameters};
///
/// let codec = JsonCodec;
/// let oval = OvalParameters { width: 200.0, height: 300.0, center_x: 320.0, center_y: 240.0 };
/// let bytes = codec.encode(&oval).unwrap();
/// let decoded: OvalParameters = codec.decode(&bytes).unwrap();
/// assert_eq!(oval, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

//! Binary frame envelope.
//!
//! Every message on the stream, in either direction, is one self-contained
//! frame:
//!
//! ```text
//! +-------------+--------------+-----------------+---------+
//! | total u32BE | header u16BE | header (codec)  | body    |
//! +-------------+--------------+-----------------+---------+
//! ```
//!
//! `total` counts the whole frame including both length prefixes, so a
//! receiver can validate a frame without any other context.

use serde::{Deserialize, Serialize};

use crate::{Codec, ProtocolError};

/// Bytes taken by the two length prefixes.
const PRELUDE_LEN: usize = 4 + 2;

/// Largest frame either side will produce or accept.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// MIME type of raw video bodies.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Whether a frame carries a normal event or a server-declared exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Event,
    Exception,
}

/// Routing information for a frame's body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameHeader {
    pub message_type: MessageType,
    /// Event name, or the exception name for `MessageType::Exception`.
    pub event_type: String,
    pub content_type: String,
    /// Capture time of a video chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_millis: Option<u64>,
}

impl FrameHeader {
    pub fn event(event_type: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Event,
            event_type: event_type.into(),
            content_type: content_type.into(),
            timestamp_millis: None,
        }
    }

    pub fn exception(exception_type: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Exception,
            event_type: exception_type.into(),
            content_type: content_type.into(),
            timestamp_millis: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp_millis: u64) -> Self {
        self.timestamp_millis = Some(timestamp_millis);
        self
    }
}

/// One decoded frame: a header plus an opaque body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub body: Vec<u8>,
}

impl Frame {
    pub fn new(header: FrameHeader, body: Vec<u8>) -> Self {
        Self { header, body }
    }

    /// Serializes the frame, encoding the header with `codec`.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedFrame` if the header or the whole
    /// frame would exceed the length prefixes or [`MAX_FRAME_LEN`].
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        let header = codec.encode(&self.header)?;
        let header_len = u16::try_from(header.len()).map_err(|_| {
            ProtocolError::MalformedFrame(format!("header too long: {} bytes", header.len()))
        })?;
        let total = PRELUDE_LEN + header.len() + self.body.len();
        if total > MAX_FRAME_LEN {
            return Err(ProtocolError::MalformedFrame(format!(
                "frame too long: {total} bytes"
            )));
        }

        let mut out = Vec::with_capacity(total);
        // MAX_FRAME_LEN fits in u32, checked above.
        out.extend_from_slice(&(total as u32).to_be_bytes());
        out.extend_from_slice(&header_len.to_be_bytes());
        out.extend_from_slice(&header);
        out.extend_from_slice(&self.body);
        Ok(out)
    }

    /// Parses one complete frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::MalformedFrame` when the prefixes disagree
    /// with the buffer, or a decode error when the header is unreadable.
    pub fn decode<C: Codec>(codec: &C, bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < PRELUDE_LEN {
            return Err(ProtocolError::MalformedFrame(format!(
                "need at least {PRELUDE_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::MalformedFrame(format!(
                "frame too long: {} bytes",
                bytes.len()
            )));
        }

        let total = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        if total != bytes.len() {
            return Err(ProtocolError::MalformedFrame(format!(
                "length prefix says {total} bytes, buffer has {}",
                bytes.len()
            )));
        }

        let header_len = u16::from_be_bytes([bytes[4], bytes[5]]) as usize;
        let header_end = PRELUDE_LEN + header_len;
        if header_end > total {
            return Err(ProtocolError::MalformedFrame(format!(
                "header length {header_len} overruns frame of {total} bytes"
            )));
        }

        let header: FrameHeader = codec.decode(&bytes[PRELUDE_LEN..header_end])?;
        Ok(Self {
            header,
            body: bytes[header_end..].to_vec(),
        })
    }
}

//! Typed events carried inside frames.
//!
//! Two layers live here:
//!
//! - [`ClientEvent`] is what the session machine asks to send. Each variant
//!   describes one thing that happened on the device.
//! - [`ClientMessage`] and [`ServerEvent`] are the wire shapes. A
//!   `ClientEvent` lowers to exactly one `ClientMessage`, which lowers to
//!   one [`Frame`].
//!
//! # Direction and content
//!
//! | Direction | Event name | Body |
//! |---|---|---|
//! | client to service | `VideoEvent` | raw video chunk; empty marks the end of video |
//! | client to service | `ClientSessionInformationEvent` | JSON challenge details |
//! | service to client | `ServerSessionInformationEvent` | JSON challenge descriptor |
//! | service to client | `DisconnectionEvent` | JSON timestamp; the service is done |
//! | service to client | exception frames | JSON message; the `:exception-type` header names the kind |
//!
//! Every challenge-details message repeats the challenge id and type, so
//! the service can process each one on its own. Unknown service event names
//! decode to [`ProtocolError::UnknownEvent`] and callers may skip them.

use serde::{Deserialize, Serialize};

use crate::challenge::{ChallengeKind, FreshnessColor, OvalParameters, SessionInformation};
use crate::frame::{Frame, FrameHeader, MessageType, OCTET_STREAM};
use crate::{Codec, ProtocolError};

// ---------------------------------------------------------------------------
// Event names
// ---------------------------------------------------------------------------

pub const VIDEO_EVENT: &str = "VideoEvent";
pub const CLIENT_SESSION_INFORMATION_EVENT: &str = "ClientSessionInformationEvent";
pub const SERVER_SESSION_INFORMATION_EVENT: &str = "ServerSessionInformationEvent";
pub const DISCONNECTION_EVENT: &str = "DisconnectionEvent";

// ---------------------------------------------------------------------------
// Shared payload pieces
// ---------------------------------------------------------------------------

/// A face box normalized to the video frame, each field in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

/// Identifies the challenge a client event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeRef {
    pub id: String,
    pub kind: ChallengeKind,
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Exception names the service may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServerExceptionKind {
    Validation,
    InternalServer,
    Throttling,
    ServiceQuotaExceeded,
}

impl ServerExceptionKind {
    pub fn exception_name(&self) -> &'static str {
        match self {
            Self::Validation => "ValidationException",
            Self::InternalServer => "InternalServerException",
            Self::Throttling => "ThrottlingException",
            Self::ServiceQuotaExceeded => "ServiceQuotaExceededException",
        }
    }

    pub fn from_exception_name(name: &str) -> Option<Self> {
        match name {
            "ValidationException" => Some(Self::Validation),
            "InternalServerException" => Some(Self::InternalServer),
            "ThrottlingException" => Some(Self::Throttling),
            "ServiceQuotaExceededException" => Some(Self::ServiceQuotaExceeded),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SessionInformationBody {
    session_information: SessionInformation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisconnectionBody {
    timestamp_millis: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ExceptionBody {
    #[serde(default)]
    message: String,
}

/// Everything the service can push down the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The challenge for this session. Sent once.
    SessionInformation(SessionInformation),
    /// The service has everything it needs and is ending the stream.
    Disconnection { timestamp_millis: u64 },
    /// A declared failure.
    Exception {
        kind: ServerExceptionKind,
        message: String,
    },
}

impl ServerEvent {
    /// Interprets a decoded frame.
    ///
    /// # Errors
    /// `ProtocolError::UnknownEvent` for event or exception names this side
    /// doesn't know, or a decode error for a malformed body.
    pub fn from_frame<C: Codec>(codec: &C, frame: &Frame) -> Result<Self, ProtocolError> {
        let name = frame.header.event_type.as_str();
        match frame.header.message_type {
            MessageType::Exception => {
                let kind = ServerExceptionKind::from_exception_name(name)
                    .ok_or_else(|| ProtocolError::UnknownEvent(name.to_string()))?;
                let body: ExceptionBody = if frame.body.is_empty() {
                    ExceptionBody {
                        message: String::new(),
                    }
                } else {
                    codec.decode(&frame.body)?
                };
                Ok(Self::Exception {
                    kind,
                    message: body.message,
                })
            }
            MessageType::Event => match name {
                SERVER_SESSION_INFORMATION_EVENT => {
                    let body: SessionInformationBody = codec.decode(&frame.body)?;
                    Ok(Self::SessionInformation(body.session_information))
                }
                DISCONNECTION_EVENT => {
                    let body: DisconnectionBody = codec.decode(&frame.body)?;
                    Ok(Self::Disconnection {
                        timestamp_millis: body.timestamp_millis,
                    })
                }
                other => Err(ProtocolError::UnknownEvent(other.to_string())),
            },
        }
    }

    /// Builds the frame the service would send for this event.
    pub fn to_frame<C: Codec>(&self, codec: &C) -> Result<Frame, ProtocolError> {
        let (header, body) = match self {
            Self::SessionInformation(info) => (
                FrameHeader::event(SERVER_SESSION_INFORMATION_EVENT, codec.content_type()),
                codec.encode(&SessionInformationBody {
                    session_information: info.clone(),
                })?,
            ),
            Self::Disconnection { timestamp_millis } => (
                FrameHeader::event(DISCONNECTION_EVENT, codec.content_type()),
                codec.encode(&DisconnectionBody {
                    timestamp_millis: *timestamp_millis,
                })?,
            ),
            Self::Exception { kind, message } => (
                FrameHeader::exception(kind.exception_name(), codec.content_type()),
                codec.encode(&ExceptionBody {
                    message: message.clone(),
                })?,
            ),
        };
        Ok(Frame::new(header, body))
    }
}

// ---------------------------------------------------------------------------
// Client → server, wire shape
// ---------------------------------------------------------------------------

/// Face position when the challenge began.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InitialFace {
    pub bounding_box: BoundingBox,
    pub initial_face_detected_timestamp: u64,
}

/// Face position once it matched the oval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetFace {
    pub bounding_box: BoundingBox,
    pub face_detected_in_target_position_start_timestamp: u64,
    pub face_detected_in_target_position_end_timestamp: u64,
}

/// A face sample taken while the challenge runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    pub detected_timestamp: u64,
}

/// One color that was painted during a light challenge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColorDisplayed {
    pub current_color: FreshnessColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_color: Option<FreshnessColor>,
    pub sequence_number: u32,
    pub current_color_start_timestamp: u64,
}

/// Progress report for a challenge. Only the fields relevant to one event
/// are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChallengeDetails {
    pub challenge_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_start_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_end_timestamp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_face: Option<InitialFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_oval: Option<OvalParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_face: Option<DetectedFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_face: Option<TargetFace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_displayed: Option<ColorDisplayed>,
}

/// Challenge progress keyed by challenge name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClientChallenge {
    #[serde(rename = "FaceMovementChallenge")]
    FaceMovement(ChallengeDetails),
    #[serde(rename = "FaceMovementAndLightChallenge")]
    FaceMovementAndLight(ChallengeDetails),
}

impl ClientChallenge {
    pub fn new(kind: ChallengeKind, details: ChallengeDetails) -> Self {
        match kind {
            ChallengeKind::FaceMovement => Self::FaceMovement(details),
            ChallengeKind::FaceMovementAndLight => Self::FaceMovementAndLight(details),
        }
    }

    pub fn kind(&self) -> ChallengeKind {
        match self {
            Self::FaceMovement(_) => ChallengeKind::FaceMovement,
            Self::FaceMovementAndLight(_) => ChallengeKind::FaceMovementAndLight,
        }
    }

    pub fn details(&self) -> &ChallengeDetails {
        match self {
            Self::FaceMovement(d) | Self::FaceMovementAndLight(d) => d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClientSessionInformation {
    pub challenge: ClientChallenge,
}

/// A client frame as the service sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    /// A chunk of encoded video. An empty chunk ends the video stream.
    Video { data: Vec<u8>, timestamp_ms: u64 },
    SessionInformation(ClientSessionInformation),
}

impl ClientMessage {
    pub fn to_frame<C: Codec>(&self, codec: &C) -> Result<Frame, ProtocolError> {
        match self {
            Self::Video { data, timestamp_ms } => Ok(Frame::new(
                FrameHeader::event(VIDEO_EVENT, OCTET_STREAM).with_timestamp(*timestamp_ms),
                data.clone(),
            )),
            Self::SessionInformation(info) => Ok(Frame::new(
                FrameHeader::event(CLIENT_SESSION_INFORMATION_EVENT, codec.content_type()),
                codec.encode(info)?,
            )),
        }
    }

    /// Interprets a decoded client frame. Used by service implementations
    /// and test peers.
    pub fn from_frame<C: Codec>(codec: &C, frame: &Frame) -> Result<Self, ProtocolError> {
        if frame.header.message_type != MessageType::Event {
            return Err(ProtocolError::InvalidMessage(
                "clients never send exceptions".into(),
            ));
        }
        match frame.header.event_type.as_str() {
            VIDEO_EVENT => Ok(Self::Video {
                data: frame.body.clone(),
                timestamp_ms: frame.header.timestamp_millis.unwrap_or_default(),
            }),
            CLIENT_SESSION_INFORMATION_EVENT => {
                Ok(Self::SessionInformation(codec.decode(&frame.body)?))
            }
            other => Err(ProtocolError::UnknownEvent(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Client → server, semantic shape
// ---------------------------------------------------------------------------

/// Something the device reports to the service during a session.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Encoded video captured since the previous chunk.
    VideoChunk { data: Vec<u8>, timestamp_ms: u64 },
    /// Recording began.
    VideoStarted {
        challenge: ChallengeRef,
        timestamp_ms: u64,
    },
    /// The face was found after recording began; carries the target oval.
    ChallengeStarted {
        challenge: ChallengeRef,
        initial_face: BoundingBox,
        detected_at: u64,
        target_oval: OvalParameters,
    },
    /// A face sample taken while the user moves toward the oval.
    FaceDetected {
        challenge: ChallengeRef,
        face: BoundingBox,
        timestamp_ms: u64,
    },
    /// A freshness color went up on screen.
    ColorDisplayed {
        challenge: ChallengeRef,
        current: FreshnessColor,
        previous: Option<FreshnessColor>,
        sequence_number: u32,
        started_at: u64,
    },
    /// The face reached the oval and held there.
    ChallengeCompleted {
        challenge: ChallengeRef,
        target_face: BoundingBox,
        matched_at: u64,
        completed_at: u64,
    },
    /// Recording stopped.
    VideoEnded {
        challenge: ChallengeRef,
        timestamp_ms: u64,
    },
}

impl ClientEvent {
    /// Event name on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::VideoChunk { .. } => VIDEO_EVENT,
            _ => CLIENT_SESSION_INFORMATION_EVENT,
        }
    }

    /// Lowers to the wire shape.
    pub fn into_message(self) -> ClientMessage {
        let (challenge, details) = match self {
            Self::VideoChunk { data, timestamp_ms } => {
                return ClientMessage::Video { data, timestamp_ms };
            }
            Self::VideoStarted {
                challenge,
                timestamp_ms,
            } => (
                challenge,
                ChallengeDetails {
                    video_start_timestamp: Some(timestamp_ms),
                    ..Default::default()
                },
            ),
            Self::ChallengeStarted {
                challenge,
                initial_face,
                detected_at,
                target_oval,
            } => (
                challenge,
                ChallengeDetails {
                    initial_face: Some(InitialFace {
                        bounding_box: initial_face,
                        initial_face_detected_timestamp: detected_at,
                    }),
                    target_oval: Some(target_oval),
                    ..Default::default()
                },
            ),
            Self::FaceDetected {
                challenge,
                face,
                timestamp_ms,
            } => (
                challenge,
                ChallengeDetails {
                    detected_face: Some(DetectedFace {
                        bounding_box: face,
                        detected_timestamp: timestamp_ms,
                    }),
                    ..Default::default()
                },
            ),
            Self::ColorDisplayed {
                challenge,
                current,
                previous,
                sequence_number,
                started_at,
            } => (
                challenge,
                ChallengeDetails {
                    color_displayed: Some(ColorDisplayed {
                        current_color: current,
                        previous_color: previous,
                        sequence_number,
                        current_color_start_timestamp: started_at,
                    }),
                    ..Default::default()
                },
            ),
            Self::ChallengeCompleted {
                challenge,
                target_face,
                matched_at,
                completed_at,
            } => (
                challenge,
                ChallengeDetails {
                    target_face: Some(TargetFace {
                        bounding_box: target_face,
                        face_detected_in_target_position_start_timestamp: matched_at,
                        face_detected_in_target_position_end_timestamp: completed_at,
                    }),
                    ..Default::default()
                },
            ),
            Self::VideoEnded {
                challenge,
                timestamp_ms,
            } => (
                challenge,
                ChallengeDetails {
                    video_end_timestamp: Some(timestamp_ms),
                    ..Default::default()
                },
            ),
        };

        let details = ChallengeDetails {
            challenge_id: challenge.id,
            ..details
        };
        ClientMessage::SessionInformation(ClientSessionInformation {
            challenge: ClientChallenge::new(challenge.kind, details),
        })
    }

    /// Encodes straight to frame bytes.
    pub fn encode<C: Codec>(self, codec: &C) -> Result<Vec<u8>, ProtocolError> {
        self.into_message().to_frame(codec)?.encode(codec)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::JsonCodec;
    use crate::challenge::{ChallengeConfig, ServerChallenge};

    fn light() -> ChallengeRef {
        ChallengeRef {
            id: "c-1".into(),
            kind: ChallengeKind::FaceMovementAndLight,
        }
    }

    #[test]
    fn test_video_chunk_lowers_to_binary_frame_with_timestamp() {
        let event = ClientEvent::VideoChunk {
            data: vec![9, 8, 7],
            timestamp_ms: 42,
        };
        let frame = event.into_message().to_frame(&JsonCodec).expect("frame");

        assert_eq!(frame.header.event_type, VIDEO_EVENT);
        assert_eq!(frame.header.content_type, OCTET_STREAM);
        assert_eq!(frame.header.timestamp_millis, Some(42));
        assert_eq!(frame.body, vec![9, 8, 7]);
    }

    #[test]
    fn test_color_displayed_lowers_to_session_information_json() {
        let event = ClientEvent::ColorDisplayed {
            challenge: light(),
            current: FreshnessColor::new(0, 255, 0),
            previous: Some(FreshnessColor::new(255, 0, 0)),
            sequence_number: 1,
            started_at: 1000,
        };
        let frame = event.into_message().to_frame(&JsonCodec).expect("frame");
        assert_eq!(frame.header.event_type, CLIENT_SESSION_INFORMATION_EVENT);

        let json: serde_json::Value = serde_json::from_slice(&frame.body).expect("json");
        let details = &json["Challenge"]["FaceMovementAndLightChallenge"];
        assert_eq!(details["ChallengeId"], "c-1");
        assert_eq!(details["ColorDisplayed"]["SequenceNumber"], 1);
        assert_eq!(details["ColorDisplayed"]["CurrentColor"]["RGB"][1], 255);
        assert_eq!(details["ColorDisplayed"]["PreviousColor"]["RGB"][0], 255);
        assert!(details.get("VideoStartTimestamp").is_none());
    }

    #[test]
    fn test_client_message_decodes_what_client_event_encodes() {
        let bytes = ClientEvent::VideoEnded {
            challenge: light(),
            timestamp_ms: 77,
        }
        .encode(&JsonCodec)
        .expect("encode");

        let frame = Frame::decode(&JsonCodec, &bytes).expect("frame");
        let message = ClientMessage::from_frame(&JsonCodec, &frame).expect("message");
        let ClientMessage::SessionInformation(info) = message else {
            panic!("expected session information, got {message:?}");
        };
        assert_eq!(info.challenge.kind(), ChallengeKind::FaceMovementAndLight);
        assert_eq!(info.challenge.details().video_end_timestamp, Some(77));
    }

    #[test]
    fn test_server_exception_frame_maps_to_kind() {
        let event = ServerEvent::Exception {
            kind: ServerExceptionKind::Throttling,
            message: "slow down".into(),
        };
        let frame = event.to_frame(&JsonCodec).expect("frame");
        assert_eq!(frame.header.message_type, MessageType::Exception);
        assert_eq!(frame.header.event_type, "ThrottlingException");

        assert_eq!(ServerEvent::from_frame(&JsonCodec, &frame).expect("decode"), event);
    }

    #[test]
    fn test_server_session_information_frame_decodes() {
        let info = SessionInformation {
            challenge: ServerChallenge::FaceMovement {
                oval_parameters: OvalParameters {
                    width: 100.0,
                    height: 160.0,
                    center_x: 320.0,
                    center_y: 240.0,
                },
                challenge_config: ChallengeConfig::default(),
            },
            challenge_id: None,
        };
        let frame = ServerEvent::SessionInformation(info.clone())
            .to_frame(&JsonCodec)
            .expect("frame");

        let decoded = ServerEvent::from_frame(&JsonCodec, &frame).expect("decode");
        assert_eq!(decoded, ServerEvent::SessionInformation(info));
    }

    #[test]
    fn test_unknown_server_exception_is_rejected() {
        let frame = Frame::new(
            FrameHeader::exception("AccessDeniedException", "application/json"),
            b"{}".to_vec(),
        );
        assert!(matches!(
            ServerEvent::from_frame(&JsonCodec, &frame),
            Err(ProtocolError::UnknownEvent(name)) if name == "AccessDeniedException"
        ));
    }

    #[test]
    fn test_exception_with_empty_body_has_empty_message() {
        let frame = Frame::new(
            FrameHeader::exception("InternalServerException", "application/json"),
            Vec::new(),
        );
        assert_eq!(
            ServerEvent::from_frame(&JsonCodec, &frame).expect("decode"),
            ServerEvent::Exception {
                kind: ServerExceptionKind::InternalServer,
                message: String::new(),
            }
        );
    }
}

//! Wire codec for the VM viewer protocol.
//!
//! Inbound wire format (server → client, one WebSocket binary message):
//! ```text
//! [discriminant:1][payload:N]
//!   discriminant 0 = image : payload is one JPEG covering the full framebuffer
//!   discriminant 1 = text  : payload is a UTF-8 JSON object with a "type" field
//! ```
//!
//! Outbound messages (client → server) are always JSON text frames.
//!
//! Every decode failure is reported as a [`ProtocolError`].  Callers treat it
//! as a per-frame problem: the frame is discarded and the session continues.

use thiserror::Error;

use crate::protocol::messages::{ClientMessage, ServerMessage};

/// Errors that can occur while classifying or encoding a frame.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The frame carried no bytes at all, not even a discriminant.
    #[error("empty frame")]
    Empty,

    /// The first byte is neither the image nor the text discriminant.
    #[error("unknown discriminant: 0x{0:02X}")]
    UnknownDiscriminant(u8),

    /// The text payload is not valid UTF-8.
    #[error("text payload is not UTF-8: {0}")]
    InvalidUtf8(String),

    /// The text payload is not a known JSON control message.
    #[error("malformed control message: {0}")]
    MalformedJson(String),

    /// A message could not be serialized.
    #[error("failed to encode {kind}: {reason}")]
    Encode { kind: &'static str, reason: String },
}

/// Leading byte of every inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Discriminant {
    Image = 0,
    Text = 1,
}

impl TryFrom<u8> for Discriminant {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Discriminant::Image),
            1 => Ok(Discriminant::Text),
            other => Err(ProtocolError::UnknownDiscriminant(other)),
        }
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// Encoded still image (the discriminant byte already stripped).
    Image(Vec<u8>),
    /// Parsed control message.
    Text(ServerMessage),
}

impl InboundFrame {
    /// Short label for log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            InboundFrame::Image(_) => "image",
            InboundFrame::Text(msg) => msg.type_name(),
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Classifies one inbound frame by its discriminant byte.
///
/// # Errors
///
/// - [`ProtocolError::Empty`] for a zero-length frame.
/// - [`ProtocolError::UnknownDiscriminant`] when the first byte is not 0 or 1.
/// - [`ProtocolError::InvalidUtf8`] / [`ProtocolError::MalformedJson`] when
///   the text payload cannot be parsed.
///
/// # Examples
///
/// ```rust
/// use vmview_core::protocol::{classify, InboundFrame};
///
/// let frame = classify(&[0, 0xFF, 0xD8]).unwrap();
/// assert_eq!(frame, InboundFrame::Image(vec![0xFF, 0xD8]));
/// ```
pub fn classify(bytes: &[u8]) -> Result<InboundFrame, ProtocolError> {
    let (&first, payload) = bytes.split_first().ok_or(ProtocolError::Empty)?;

    match Discriminant::try_from(first)? {
        Discriminant::Image => Ok(InboundFrame::Image(payload.to_vec())),
        Discriminant::Text => {
            let text = std::str::from_utf8(payload)
                .map_err(|e| ProtocolError::InvalidUtf8(e.to_string()))?;
            let msg: ServerMessage = serde_json::from_str(text)
                .map_err(|e| ProtocolError::MalformedJson(e.to_string()))?;
            Ok(InboundFrame::Text(msg))
        }
    }
}

/// Serializes an outbound control message to its JSON text form.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use vmview_core::protocol::{encode_text, ClientMessage};
///
/// let text = encode_text(&ClientMessage::Turn { taking_turn: true }).unwrap();
/// assert_eq!(text, r#"{"type":"turn","takingTurn":true}"#);
/// ```
pub fn encode_text(msg: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(msg).map_err(|e| ProtocolError::Encode {
        kind: msg.type_name(),
        reason: e.to_string(),
    })
}

/// Prefixes `payload` with the one-byte `tag`.
///
/// This is the inverse of [`classify`] and is what a server (or a test
/// harness standing in for one) puts on the wire.
pub fn encode_binary(tag: Discriminant, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + payload.len());
    buf.push(tag as u8);
    buf.extend_from_slice(payload);
    buf
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Protocol module containing message types and the wire codec.

pub mod codec;
pub mod messages;

pub use codec::{classify, encode_binary, encode_text, Discriminant, InboundFrame, ProtocolError};
pub use messages::{ClientMessage, ServerMessage};

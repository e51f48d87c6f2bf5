//! # vmview-core
//!
//! Shared library for the vmview shared-VM viewer containing the wire codec,
//! the domain values exchanged with a VM server, and the input encoders.
//!
//! It has zero dependencies on sockets, async runtimes, or rendering
//! surfaces.  The `vmview-client` crate wires these pieces to a WebSocket.
//!
//! # Architecture overview
//!
//! A VM server streams the virtual machine's screen to any number of viewers.
//! Only one viewer at a time holds the *turn* and may send keyboard and mouse
//! input; the server arbitrates the queue.  Admin viewers bypass the queue.
//!
//! - **`protocol`** – How bytes travel over the WebSocket.  Inbound frames
//!   carry a one-byte discriminant (JPEG image or JSON control text);
//!   outbound frames are always JSON text with a `type` field.
//!
//! - **`domain`** – Plain values: user rank, VM descriptor, turn updates.
//!
//! - **`input`** – Pure encoders turning pointer, wheel and key events into
//!   protocol primitives (`x`, `y`, button mask; keysym, down/up).
//!
//! - **`keymap`** – A default keysym table for browser-style key events.

pub mod domain;
pub mod input;
pub mod keymap;
pub mod protocol;

pub use domain::turn::{TurnState, TurnUpdate};
pub use domain::user::{User, UserRank};
pub use domain::vm::{EncodedImage, ImageFormat, VmDescriptor};
pub use input::keyboard::{encode_key, KeyEvent, KeyInput, KeyLocation, KeysymLookup};
pub use input::pointer::{ButtonMask, PointerEvent, PointerState, ScrollPulse, WheelEvent};
pub use keymap::x11::DomKeysymTable;
pub use protocol::codec::{classify, encode_binary, encode_text, Discriminant, InboundFrame, ProtocolError};
pub use protocol::messages::{ClientMessage, ServerMessage};

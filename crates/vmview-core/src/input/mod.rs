//! Input encoders.
//!
//! Pure functions from UI events to protocol primitives.  Nothing here knows
//! about turns or sockets; the session decides whether an encoded event is
//! actually sent.

pub mod keyboard;
pub mod pointer;

pub use keyboard::{encode_key, KeyEvent, KeyInput, KeyLocation, KeysymLookup};
pub use pointer::{ButtonMask, PointerEvent, PointerState, ScrollPulse, WheelEvent};

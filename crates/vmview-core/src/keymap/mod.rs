//! Keysym translation tables.
//!
//! The wire carries X11 keysyms (X11/keysymdef.h), whatever platform the
//! viewer runs on.

pub mod x11;

pub use x11::DomKeysymTable;

//! Keyboard encoding.
//!
//! The server speaks X11 keysyms.  Translation from a UI key event to a keysym
//! is delegated to a [`KeysymLookup`]; events it cannot resolve are dropped
//! here and never reach the wire.

use crate::protocol::messages::ClientMessage;

/// Physical location of a key, as reported by DOM `KeyboardEvent.location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyLocation {
    #[default]
    Standard,
    Left,
    Right,
    Numpad,
}

impl KeyLocation {
    /// Maps the DOM numeric location (0-3); unknown values fall back to
    /// [`KeyLocation::Standard`].
    pub fn from_dom(location: u32) -> Self {
        match location {
            1 => KeyLocation::Left,
            2 => KeyLocation::Right,
            3 => KeyLocation::Numpad,
            _ => KeyLocation::Standard,
        }
    }
}

/// A key press or release from the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    /// Legacy DOM `keyCode`, used when `key` is not informative.
    pub key_code: u32,
    /// DOM `key` value: the produced character or a named key such as `"Enter"`.
    pub key: String,
    pub location: KeyLocation,
    pub down: bool,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, key_code: u32, location: KeyLocation, down: bool) -> Self {
        Self {
            key_code,
            key: key.into(),
            location,
            down,
        }
    }
}

/// Resolves a key event to an X11 keysym.
pub trait KeysymLookup {
    /// Returns `None` when the event has no keysym; such events are dropped.
    fn keysym(&self, event: &KeyEvent) -> Option<u32>;
}

impl<F> KeysymLookup for F
where
    F: Fn(&KeyEvent) -> Option<u32>,
{
    fn keysym(&self, event: &KeyEvent) -> Option<u32> {
        self(event)
    }
}

/// A resolved key event, ready to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub keysym: u32,
    pub down: bool,
}

impl KeyInput {
    pub fn to_message(self) -> ClientMessage {
        ClientMessage::Key {
            key_code: self.keysym,
            down: self.down,
        }
    }
}

/// Encodes `event` through `lookup`.
///
/// Returns `None` for keys the lookup cannot resolve.
pub fn encode_key<L>(lookup: &L, event: &KeyEvent) -> Option<KeyInput>
where
    L: KeysymLookup + ?Sized,
{
    lookup.keysym(event).map(|keysym| KeyInput {
        keysym,
        down: event.down,
    })
}

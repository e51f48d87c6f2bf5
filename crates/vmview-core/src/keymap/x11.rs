//! Browser-style key events to X11 keysyms.
//!
//! Resolution order:
//!
//! 1. Named keys (`"Enter"`, `"ArrowUp"`, `"F5"`, modifiers by location).
//! 2. Numpad characters by location (`"7"` on the numpad is `XK_KP_7`).
//! 3. Single printable characters: Latin-1 code points map to themselves,
//!    anything beyond maps to `0x0100_0000 | codepoint`.
//! 4. The legacy `keyCode` when `key` is empty or `"Unidentified"`.
//!
//! Anything else resolves to `None`.

use crate::input::keyboard::{KeyEvent, KeyLocation, KeysymLookup};

/// Default [`KeysymLookup`] for DOM-style key events.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomKeysymTable;

impl KeysymLookup for DomKeysymTable {
    fn keysym(&self, event: &KeyEvent) -> Option<u32> {
        let key = event.key.as_str();
        if key.is_empty() || key == "Unidentified" {
            return legacy_keycode_to_keysym(event.key_code);
        }

        named_key(key, event.location)
            .or_else(|| numpad_char(key, event.location))
            .or_else(|| printable_char(key))
    }
}

fn named_key(key: &str, location: KeyLocation) -> Option<u32> {
    // Modifier keysyms are (left, right) pairs.
    let side = |(left, right): (u32, u32)| {
        if location == KeyLocation::Right {
            right
        } else {
            left
        }
    };
    let keysym = match key {
        "Shift" => side((0xFFE1, 0xFFE2)), // XK_Shift_L / XK_Shift_R
        "Control" => side((0xFFE3, 0xFFE4)), // XK_Control_L / XK_Control_R
        "Alt" => side((0xFFE9, 0xFFEA)), // XK_Alt_L / XK_Alt_R
        "Meta" | "OS" | "Super" => side((0xFFEB, 0xFFEC)), // XK_Super_L / XK_Super_R
        "AltGraph" => 0xFE03, // XK_ISO_Level3_Shift
        "Enter" => {
            if location == KeyLocation::Numpad {
                0xFF8D // XK_KP_Enter
            } else {
                0xFF0D // XK_Return
            }
        }
        "Tab" => 0xFF09,
        "Backspace" => 0xFF08,
        "Escape" | "Esc" => 0xFF1B,
        "Delete" | "Del" => 0xFFFF,
        "Insert" => 0xFF63,
        "Home" => 0xFF50,
        "End" => 0xFF57,
        "PageUp" => 0xFF55,
        "PageDown" => 0xFF56,
        "ArrowLeft" | "Left" => 0xFF51,
        "ArrowUp" | "Up" => 0xFF52,
        "ArrowRight" | "Right" => 0xFF53,
        "ArrowDown" | "Down" => 0xFF54,
        "CapsLock" => 0xFFE5,
        "NumLock" => 0xFF7F,
        "ScrollLock" => 0xFF14,
        "Pause" => 0xFF13,
        "PrintScreen" => 0xFF61,
        "ContextMenu" => 0xFF67,
        _ => return function_key(key),
    };
    Some(keysym)
}

// F1 is XK_F1 (0xFFBE); F1..F35 are contiguous.
fn function_key(key: &str) -> Option<u32> {
    let n: u32 = key.strip_prefix('F')?.parse().ok()?;
    (1..=35).contains(&n).then(|| 0xFFBE + n - 1)
}

fn numpad_char(key: &str, location: KeyLocation) -> Option<u32> {
    if location != KeyLocation::Numpad {
        return None;
    }
    let keysym = match key {
        "0" | "1" | "2" | "3" | "4" | "5" | "6" | "7" | "8" | "9" => {
            0xFFB0 + key.parse::<u32>().ok()? // XK_KP_0..XK_KP_9
        }
        "." | "," => 0xFFAE,
        "+" => 0xFFAB,
        "-" => 0xFFAD,
        "*" => 0xFFAA,
        "/" => 0xFFAF,
        _ => return None,
    };
    Some(keysym)
}

fn printable_char(key: &str) -> Option<u32> {
    let mut chars = key.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        // Multi-character values are names we do not know ("Dead", "Process").
        return None;
    }

    let cp = c as u32;
    match cp {
        0x20..=0x7E | 0xA0..=0xFF => Some(cp),
        0x100.. => Some(0x0100_0000 | cp),
        _ => None,
    }
}

fn legacy_keycode_to_keysym(key_code: u32) -> Option<u32> {
    let keysym = match key_code {
        8 => 0xFF08,
        9 => 0xFF09,
        13 => 0xFF0D,
        16 => 0xFFE1,
        17 => 0xFFE3,
        18 => 0xFFE9,
        19 => 0xFF13,
        20 => 0xFFE5,
        27 => 0xFF1B,
        32 => 0x0020,
        33 => 0xFF55,
        34 => 0xFF56,
        35 => 0xFF57,
        36 => 0xFF50,
        37 => 0xFF51,
        38 => 0xFF52,
        39 => 0xFF53,
        40 => 0xFF54,
        45 => 0xFF63,
        46 => 0xFFFF,
        48..=57 => key_code,                 // XK_0..XK_9
        65..=90 => key_code + 0x20,          // XK_a..XK_z
        96..=105 => 0xFFB0 + key_code - 96,  // XK_KP_0..XK_KP_9
        112..=123 => 0xFFBE + key_code - 112, // XK_F1..XK_F12
        _ => return None,
    };
    Some(keysym)
}

//! Pointer and wheel encoding.
//!
//! The server expects an absolute position plus an RFB-style button mask in
//! which the wheel is modelled as two extra buttons.  A wheel notch is sent as
//! a *pulse*: the scroll bit is set by one wheel event and cleared by the next
//! wheel event before that event is evaluated, so a scroll can never stay
//! latched down.
//!
//! [`PointerState`] is a value: each encoder call takes the previous state
//! and returns the next one.

use crate::protocol::messages::ClientMessage;

/// RFB button mask as sent in `mouse{mask}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonMask(pub u8);

impl ButtonMask {
    pub const LEFT: u8 = 1 << 0;
    pub const MIDDLE: u8 = 1 << 1;
    pub const RIGHT: u8 = 1 << 2;
    pub const WHEEL_UP: u8 = 1 << 3;
    pub const WHEEL_DOWN: u8 = 1 << 4;

    /// Translates a DOM `MouseEvent.buttons` value (left 1, right 2,
    /// middle 4) to the RFB layout (left 1, middle 2, right 4).
    ///
    /// Back/forward buttons have no RFB equivalent and are ignored.
    pub fn from_dom_buttons(buttons: u16) -> Self {
        let mut mask = 0;
        if buttons & 0x01 != 0 {
            mask |= Self::LEFT;
        }
        if buttons & 0x02 != 0 {
            mask |= Self::RIGHT;
        }
        if buttons & 0x04 != 0 {
            mask |= Self::MIDDLE;
        }
        Self(mask)
    }

    pub fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }
}

/// Direction of a one-shot wheel pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrollPulse {
    Up,
    Down,
}

impl ScrollPulse {
    fn bit(self) -> u8 {
        match self {
            ScrollPulse::Up => ButtonMask::WHEEL_UP,
            ScrollPulse::Down => ButtonMask::WHEEL_DOWN,
        }
    }
}

/// Pointer move / press / release, already in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub x: i32,
    pub y: i32,
    pub buttons: ButtonMask,
}

impl PointerEvent {
    pub fn new(x: i32, y: i32, buttons: ButtonMask) -> Self {
        Self { x, y, buttons }
    }
}

/// Wheel event in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEvent {
    pub x: i32,
    pub y: i32,
    pub buttons: ButtonMask,
    /// Vertical delta; negative scrolls up (away from the user).
    pub delta_y: f64,
}

/// Last known pointer position, pressed buttons and pending scroll pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerState {
    pub x: u32,
    pub y: u32,
    pub buttons: ButtonMask,
    pub scroll: Option<ScrollPulse>,
}

impl PointerState {
    /// Applies a move/press/release.  A pending scroll pulse is kept; only
    /// the next wheel event clears it.
    pub fn with_pointer(self, event: PointerEvent) -> Self {
        Self {
            x: clamp_coord(event.x),
            y: clamp_coord(event.y),
            buttons: event.buttons,
            scroll: self.scroll,
        }
    }

    /// Applies a wheel event: the previous pulse is cleared first, then the
    /// direction of `delta_y` is evaluated afresh.
    pub fn with_wheel(self, event: WheelEvent) -> Self {
        // Whatever pulse `self` carried is dropped here, never merged.
        let scroll = if event.delta_y < 0.0 {
            Some(ScrollPulse::Up)
        } else if event.delta_y > 0.0 {
            Some(ScrollPulse::Down)
        } else {
            None
        };

        Self {
            x: clamp_coord(event.x),
            y: clamp_coord(event.y),
            buttons: event.buttons,
            scroll,
        }
    }

    /// The RFB mask: pressed buttons plus the pending scroll bit.
    pub fn mask(&self) -> u8 {
        self.buttons.0 | self.scroll.map_or(0, ScrollPulse::bit)
    }

    /// Builds the outbound `mouse` message for this state.
    pub fn to_message(&self) -> ClientMessage {
        ClientMessage::Mouse {
            x: self.x,
            y: self.y,
            mask: self.mask(),
        }
    }
}

// Events can report slightly negative offsets when the pointer leaves the
// surface mid-drag; the server only accepts unsigned positions.
fn clamp_coord(v: i32) -> u32 {
    v.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wheel(delta_y: f64) -> WheelEvent {
        WheelEvent {
            x: 10,
            y: 20,
            buttons: ButtonMask::default(),
            delta_y,
        }
    }

    #[test]
    fn test_dom_buttons_swap_middle_and_right() {
        assert_eq!(ButtonMask::from_dom_buttons(1).0, ButtonMask::LEFT);
        assert_eq!(ButtonMask::from_dom_buttons(2).0, ButtonMask::RIGHT);
        assert_eq!(ButtonMask::from_dom_buttons(4).0, ButtonMask::MIDDLE);
        assert_eq!(
            ButtonMask::from_dom_buttons(1 | 2 | 4 | 8 | 16).0,
            ButtonMask::LEFT | ButtonMask::MIDDLE | ButtonMask::RIGHT
        );
    }

    #[test]
    fn test_pointer_event_sets_position_and_buttons() {
        // Arrange
        let state = PointerState::default();

        // Act
        let next = state.with_pointer(PointerEvent::new(640, 480, ButtonMask(ButtonMask::LEFT)));

        // Assert
        assert_eq!((next.x, next.y), (640, 480));
        assert_eq!(next.mask(), ButtonMask::LEFT);
        assert_eq!(
            next.to_message(),
            ClientMessage::Mouse {
                x: 640,
                y: 480,
                mask: 1
            }
        );
    }

    #[test]
    fn test_negative_coordinates_clamp_to_zero() {
        let next = PointerState::default().with_pointer(PointerEvent::new(-5, -1, ButtonMask(0)));
        assert_eq!((next.x, next.y), (0, 0));
    }

    #[test]
    fn test_wheel_up_sets_pulse() {
        let next = PointerState::default().with_wheel(wheel(-100.0));
        assert_eq!(next.scroll, Some(ScrollPulse::Up));
        assert_eq!(next.mask(), ButtonMask::WHEEL_UP);
    }

    #[test]
    fn test_consecutive_wheel_events_same_direction_keep_scroll_bit() {
        // Arrange: first notch down sets the pulse
        let first = PointerState::default().with_wheel(wheel(53.0));
        assert!(first.mask() & ButtonMask::WHEEL_DOWN != 0);

        // Act: second notch in the same direction resets, then re-sets it
        let second = first.with_wheel(wheel(53.0));

        // Assert
        assert!(second.mask() & ButtonMask::WHEEL_DOWN != 0);
        assert_eq!(second.scroll, Some(ScrollPulse::Down));
    }

    #[test]
    fn test_wheel_direction_change_clears_previous_pulse() {
        let up = PointerState::default().with_wheel(wheel(-1.0));
        let down = up.with_wheel(wheel(1.0));
        assert_eq!(down.mask(), ButtonMask::WHEEL_DOWN);
    }

    #[test]
    fn test_zero_delta_wheel_clears_pulse() {
        let up = PointerState::default().with_wheel(wheel(-1.0));
        let flat = up.with_wheel(wheel(0.0));
        assert_eq!(flat.scroll, None);
        assert_eq!(flat.mask(), 0);
    }

    #[test]
    fn test_pointer_move_keeps_pending_pulse() {
        let up = PointerState::default().with_wheel(wheel(-1.0));
        let moved = up.with_pointer(PointerEvent::new(1, 1, ButtonMask(ButtonMask::LEFT)));
        assert_eq!(moved.mask(), ButtonMask::LEFT | ButtonMask::WHEEL_UP);
    }

    #[test]
    fn test_wheel_carries_pressed_buttons() {
        let event = WheelEvent {
            x: 0,
            y: 0,
            buttons: ButtonMask(ButtonMask::RIGHT),
            delta_y: -3.0,
        };
        let next = PointerState::default().with_wheel(event);
        assert_eq!(next.mask(), ButtonMask::RIGHT | ButtonMask::WHEEL_UP);
    }
}

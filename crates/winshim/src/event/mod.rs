//! Unified event model
//!
//! Every backend reports through the same [`Event`] record. The tag
//! enumeration keeps its fixed numeric values so events can be logged and
//! compared by code across backends.

mod drop;

pub use drop::{copy_drop_paths, DropEvent};

use crate::input::{Keycode, Modifiers, MouseButton};

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum EventType {
    /// No event
    #[default]
    None = 0,
    /// The application should exit
    Quit = 1,
    /// Key pressed or auto-repeated
    KeyDown = 2,
    /// Key released
    KeyUp = 3,
    /// Window position changed
    WindowMoved = 4,
    /// Window size changed
    WindowResized = 5,
    /// Window iconified
    WindowMinimized = 6,
    /// Window maximized
    WindowMaximized = 7,
    /// Window restored from minimized
    WindowRestored = 8,
    /// Window gained input focus
    WindowFocusGained = 9,
    /// Window lost input focus
    WindowFocusLost = 10,
    /// Window contents need redrawing
    WindowExposed = 11,
    /// Files dropped onto the window
    Drop = 12,
    /// Mouse button pressed
    MouseButtonDown = 13,
    /// Mouse button released
    MouseButtonUp = 14,
    /// Cursor moved
    MouseMoved = 15,
    /// Scroll wheel or trackpad scroll
    MouseWheel = 16,
}

impl EventType {
    /// Numeric tag value
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Key down / key up payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyEvent {
    /// Unified key code
    pub keycode: Keycode,
    /// Set for auto-repeat key downs
    pub repeat: bool,
    /// Modifiers held when the event was translated
    pub mods: Modifiers,
}

/// Window moved payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MoveEvent {
    /// New x position
    pub x: i32,
    /// New y position
    pub y: i32,
}

/// Window resized payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResizeEvent {
    /// New width
    pub w: i32,
    /// New height
    pub h: i32,
    /// Whether the window is fullscreen after the resize
    pub is_fullscreen: bool,
}

/// Mouse button payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseButtonEvent {
    /// Button index, 0 = left
    pub button: MouseButton,
    /// Modifiers held when the event was translated
    pub mods: Modifiers,
}

/// Cursor motion payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseMotionEvent {
    /// Cursor x in window pixels
    pub x: i32,
    /// Cursor y in window pixels
    pub y: i32,
}

/// Scroll payload
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelEvent {
    /// Horizontal offset
    pub x_offset: f64,
    /// Vertical offset
    pub y_offset: f64,
}

/// A unified input or window event
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Event {
    /// No event
    #[default]
    None,
    /// The application should exit
    Quit,
    /// Key pressed or auto-repeated
    KeyDown(KeyEvent),
    /// Key released
    KeyUp(KeyEvent),
    /// Window position changed
    WindowMoved(MoveEvent),
    /// Window size changed
    WindowResized(ResizeEvent),
    /// Window iconified
    WindowMinimized,
    /// Window maximized
    WindowMaximized,
    /// Window restored from minimized
    WindowRestored,
    /// Window gained input focus
    WindowFocusGained,
    /// Window lost input focus
    WindowFocusLost,
    /// Window contents need redrawing
    WindowExposed,
    /// Files dropped onto the window
    Drop(DropEvent),
    /// Mouse button pressed
    MouseButtonDown(MouseButtonEvent),
    /// Mouse button released
    MouseButtonUp(MouseButtonEvent),
    /// Cursor moved
    MouseMoved(MouseMotionEvent),
    /// Scroll wheel or trackpad scroll
    MouseWheel(WheelEvent),
}

impl Event {
    /// Create an event of `event_type` with a zeroed payload
    pub fn new(event_type: EventType) -> Self {
        match event_type {
            EventType::None => Self::None,
            EventType::Quit => Self::Quit,
            EventType::KeyDown => Self::KeyDown(KeyEvent::default()),
            EventType::KeyUp => Self::KeyUp(KeyEvent::default()),
            EventType::WindowMoved => Self::WindowMoved(MoveEvent::default()),
            EventType::WindowResized => Self::WindowResized(ResizeEvent::default()),
            EventType::WindowMinimized => Self::WindowMinimized,
            EventType::WindowMaximized => Self::WindowMaximized,
            EventType::WindowRestored => Self::WindowRestored,
            EventType::WindowFocusGained => Self::WindowFocusGained,
            EventType::WindowFocusLost => Self::WindowFocusLost,
            EventType::WindowExposed => Self::WindowExposed,
            EventType::Drop => Self::Drop(DropEvent::default()),
            EventType::MouseButtonDown => Self::MouseButtonDown(MouseButtonEvent::default()),
            EventType::MouseButtonUp => Self::MouseButtonUp(MouseButtonEvent::default()),
            EventType::MouseMoved => Self::MouseMoved(MouseMotionEvent::default()),
            EventType::MouseWheel => Self::MouseWheel(WheelEvent::default()),
        }
    }

    /// Tag of this event
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::None => EventType::None,
            Self::Quit => EventType::Quit,
            Self::KeyDown(_) => EventType::KeyDown,
            Self::KeyUp(_) => EventType::KeyUp,
            Self::WindowMoved(_) => EventType::WindowMoved,
            Self::WindowResized(_) => EventType::WindowResized,
            Self::WindowMinimized => EventType::WindowMinimized,
            Self::WindowMaximized => EventType::WindowMaximized,
            Self::WindowRestored => EventType::WindowRestored,
            Self::WindowFocusGained => EventType::WindowFocusGained,
            Self::WindowFocusLost => EventType::WindowFocusLost,
            Self::WindowExposed => EventType::WindowExposed,
            Self::Drop(_) => EventType::Drop,
            Self::MouseButtonDown(_) => EventType::MouseButtonDown,
            Self::MouseButtonUp(_) => EventType::MouseButtonUp,
            Self::MouseMoved(_) => EventType::MouseMoved,
            Self::MouseWheel(_) => EventType::MouseWheel,
        }
    }

    /// Release the path list of a drop event
    ///
    /// Leaves the tag alone and resets the payload to an empty list with a
    /// zero count. Calling it again, or on any other kind of event, does
    /// nothing.
    pub fn clear_drop_paths(&mut self) {
        if let Self::Drop(drop) = self {
            drop.clear();
        }
    }

    /// Key payload of a key down / key up event
    pub const fn key(&self) -> Option<&KeyEvent> {
        match self {
            Self::KeyDown(key) | Self::KeyUp(key) => Some(key),
            _ => None,
        }
    }

    /// Drop payload of a drop event
    pub const fn drop_event(&self) -> Option<&DropEvent> {
        match self {
            Self::Drop(drop) => Some(drop),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_values() {
        assert_eq!(EventType::None.code(), 0);
        assert_eq!(EventType::Quit.code(), 1);
        assert_eq!(EventType::KeyDown.code(), 2);
        assert_eq!(EventType::WindowExposed.code(), 11);
        assert_eq!(EventType::Drop.code(), 12);
        assert_eq!(EventType::MouseWheel.code(), 16);
    }

    #[test]
    fn test_new_round_trips_tag() {
        let tags = [
            EventType::None,
            EventType::Quit,
            EventType::KeyUp,
            EventType::WindowResized,
            EventType::WindowFocusLost,
            EventType::Drop,
            EventType::MouseWheel,
        ];
        for tag in tags {
            assert_eq!(Event::new(tag).event_type(), tag);
        }
    }

    #[test]
    fn test_new_payload_is_zeroed() {
        let Event::WindowResized(resize) = Event::new(EventType::WindowResized) else {
            panic!("wrong variant");
        };
        assert_eq!(resize, ResizeEvent { w: 0, h: 0, is_fullscreen: false });

        let Event::Drop(drop) = Event::new(EventType::Drop) else {
            panic!("wrong variant");
        };
        assert_eq!(drop.count(), 0);
        assert_eq!(drop.paths().count(), 0);
    }

    #[test]
    fn test_clear_drop_paths_idempotent() {
        let mut event = Event::Drop(DropEvent::from_paths(["/tmp/a", "/tmp/b"]));
        event.clear_drop_paths();
        assert_eq!(event.event_type(), EventType::Drop);
        assert_eq!(event.drop_event().map(DropEvent::count), Some(0));

        event.clear_drop_paths();
        assert_eq!(event, Event::Drop(DropEvent::default()));
    }

    #[test]
    fn test_clear_drop_paths_ignores_other_events() {
        let mut event = Event::KeyDown(KeyEvent { keycode: Keycode::A, ..KeyEvent::default() });
        let before = event.clone();
        event.clear_drop_paths();
        assert_eq!(event, before);
    }

    #[test]
    fn test_key_accessor() {
        let event = Event::KeyUp(KeyEvent { keycode: Keycode::Q, repeat: false, mods: Modifiers::LCTRL });
        assert_eq!(event.key().map(|k| k.keycode), Some(Keycode::Q));
        assert!(Event::Quit.key().is_none());
    }
}

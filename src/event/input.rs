//! Input event types

use crate::geometry::Coord;

/// Mouse button identity, the key for drag-origin tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
}

/// A mouse press or release at a location
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseEvent {
    /// Location in the receiver's local coordinates
    pub loc: Coord,
    /// Button that changed state
    pub which: Button,
}

impl MouseEvent {
    pub const fn new(loc: Coord, which: Button) -> Self {
        Self { loc, which }
    }

    /// Re-express the event relative to a child whose bounds start at `origin`
    pub fn translated(&self, origin: Coord) -> Self {
        Self {
            loc: self.loc - origin,
            which: self.which,
        }
    }
}

/// Key identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Left,
    Right,
    Up,
    Down,
}

/// A key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    /// Control modifier held
    pub ctrl: bool,
}

impl KeyEvent {
    pub const fn new(code: KeyCode) -> Self {
        Self { code, ctrl: false }
    }

    pub const fn with_ctrl(code: KeyCode) -> Self {
        Self { code, ctrl: true }
    }

    /// Ctrl+C, Ctrl+Q or a bare `q`
    pub fn is_quit(&self) -> bool {
        match self.code {
            KeyCode::Char('c') => self.ctrl,
            KeyCode::Char('q') => true,
            _ => false,
        }
    }
}

/// Unified event type accepted on every block's input channel
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The hosting surface is closing; forwarded to every descendant
    Close,
    MouseDown(MouseEvent),
    MouseUp(MouseEvent),
    /// New size of the receiving block
    Resize(Coord),
    /// Key press, routed to the block holding keyboard priority
    Key(KeyEvent),
}

impl Event {
    pub fn is_close(&self) -> bool {
        matches!(self, Event::Close)
    }

    /// Get the mouse event if this is a press or release
    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            Event::MouseDown(e) | Event::MouseUp(e) => Some(e),
            _ => None,
        }
    }
}

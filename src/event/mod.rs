//! Toolkit event types
//!
//! Coordinates in every event are expressed in the local space of the block
//! receiving it; foundations translate before forwarding.

mod input;

pub use input::{Button, Event, KeyCode, KeyEvent, MouseEvent};

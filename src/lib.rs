//! uik: a tree of concurrently running blocks
//!
//! Foundations route input events to the child blocks under the pointer and
//! composite their buffers; a [`DisplayFoundation`] paces the result onto a
//! display surface.

pub mod block;
pub mod buffer;
pub mod config;
pub mod display;
pub mod error;
pub mod event;
pub mod foundation;
pub mod geometry;
pub mod message;
pub mod surface;
pub mod test_utils;

pub use block::{clear_paint, fill_paint, Block, BlockHandle, BlockInput, PaintFn};
pub use buffer::{Image, Rgba};
pub use config::UikConfig;
pub use display::DisplayFoundation;
pub use error::{SurfaceError, UikError};
pub use event::{Button, Event, KeyCode, KeyEvent, MouseEvent};
pub use foundation::{Foundation, FoundationHandle, FoundationSnapshot};
pub use geometry::{Coord, Rect};

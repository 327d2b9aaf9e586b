//! Geometry primitives for bounds math and hit-testing
//!
//! All coordinates are `f64`; a block's local space has its origin at the
//! top-left corner of its bounds.

mod coord;
mod rect;

pub use coord::Coord;
pub use rect::Rect;

//! Messages that trigger and propagate repaints between blocks and foundations
//!
//! Redraws travel down the tree (parent to child, dirty rect translated at
//! each level); composite requests travel up (child to parent, carrying an
//! immutable snapshot of the child's buffer).

mod redraw;

use std::sync::Arc;

use crate::block::BlockHandle;
use crate::buffer::Image;
use crate::geometry::Rect;

pub use redraw::{redraw_channel, RedrawReceiver, RedrawSender};

/// Request to repaint a dirty area, in the receiver's local coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RedrawEvent {
    pub bounds: Rect,
}

impl RedrawEvent {
    pub const fn new(bounds: Rect) -> Self {
        Self { bounds }
    }
}

/// A child's current visual state, handed to its parent
///
/// The buffer is a snapshot: the sender keeps painting into its own buffer
/// while the parent holds this one until the next request supersedes it.
#[derive(Debug, Clone)]
pub struct CompositeRequest {
    pub buffer: Arc<Image>,
}

impl CompositeRequest {
    pub fn new(buffer: Image) -> Self {
        Self {
            buffer: Arc::new(buffer),
        }
    }
}

/// A composite request tagged with the child that emitted it
#[derive(Debug, Clone)]
pub struct CompositeBlockRequest {
    pub request: CompositeRequest,
    pub block: BlockHandle,
}

//! Blocks: the smallest addressable visual and interactive unit
//!
//! A [`Block`] is owned by the task that drives it (a widget, or a
//! [`Foundation`](crate::foundation::Foundation)). Everyone else talks to it
//! through its [`BlockHandle`].

mod handle;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::buffer::{Image, Rgba};
use crate::event::Event;
use crate::geometry::{Coord, Rect};
use crate::message::{redraw_channel, CompositeRequest, RedrawEvent, RedrawReceiver};

pub use handle::BlockHandle;
pub(crate) use handle::{Binding, ParentLink};

/// Default capacity of a block's input channel
pub const DEFAULT_EVENT_CAPACITY: usize = 8;

/// Paint callback: renders a block's own content into its buffer
///
/// Called with the target buffer and the block's current size.
pub type PaintFn = Arc<dyn Fn(&mut Image, Coord) + Send + Sync>;

/// Paint callback that clears the buffer to transparent
pub fn clear_paint() -> PaintFn {
    Arc::new(|buf: &mut Image, _size: Coord| buf.fill(Rgba::TRANSPARENT))
}

/// Paint callback that fills the whole buffer with one color
pub fn fill_paint(color: Rgba) -> PaintFn {
    Arc::new(move |buf: &mut Image, _size: Coord| buf.fill(color))
}

/// Something a block's loop has to react to
#[derive(Debug, Clone, PartialEq)]
pub enum BlockInput {
    Event(Event),
    Redraw(RedrawEvent),
}

/// A visual node with its own buffer, paint callback and event channels
pub struct Block {
    handle: BlockHandle,
    size: Coord,
    buffer: Option<Image>,
    paint: PaintFn,
    pub(crate) events: mpsc::Receiver<Event>,
    pub(crate) redraw: RedrawReceiver,
}

impl Block {
    /// Create a block with freshly established channels and no buffer yet
    pub fn new(size: Coord, paint: PaintFn) -> Self {
        Self::with_capacity(size, paint, DEFAULT_EVENT_CAPACITY)
    }

    /// Create a block whose input channel holds up to `capacity` events
    pub fn with_capacity(size: Coord, paint: PaintFn, capacity: usize) -> Self {
        let (events_tx, events) = mpsc::channel(capacity.max(1));
        let (redraw_tx, redraw) = redraw_channel();
        Self {
            handle: BlockHandle::new(events_tx, redraw_tx),
            size,
            buffer: None,
            paint,
            events,
            redraw,
        }
    }

    pub fn handle(&self) -> &BlockHandle {
        &self.handle
    }

    /// Current size
    pub fn size(&self) -> Coord {
        self.size
    }

    /// Local bounds: origin to size
    pub fn bounds(&self) -> Rect {
        Rect::sized(self.size)
    }

    /// Last painted buffer, if it is still valid
    pub fn buffer(&self) -> Option<&Image> {
        self.buffer.as_ref()
    }

    pub fn set_paint(&mut self, paint: PaintFn) {
        self.paint = paint;
    }

    /// Make sure a buffer of the current size exists and return it
    pub fn prepare_buffer(&mut self) -> &mut Image {
        let size = self.size;
        let stale = self
            .buffer
            .as_ref()
            .map_or(true, |buf| !buf.matches_size(size));
        if stale {
            self.buffer = Some(Image::for_size(size));
        }
        self.buffer.get_or_insert_with(|| Image::for_size(size))
    }

    /// Run the paint callback over the buffer
    pub fn do_paint(&mut self) {
        let size = self.size;
        let paint = self.paint.clone();
        paint(self.prepare_buffer(), size);
    }

    /// Apply a new size; an unchanged size is a no-op
    ///
    /// Returns `true` if the size changed, in which case the buffer was
    /// dropped and the next paint starts from scratch.
    pub fn handle_resize(&mut self, size: Coord) -> bool {
        if size == self.size {
            return false;
        }
        self.size = size;
        self.buffer = None;
        true
    }

    /// Send a snapshot of the buffer to the parent, if placed
    ///
    /// Returns `false` when unplaced or when the parent stopped listening.
    pub async fn composite(&self) -> bool {
        let Some(compositor) = self.handle.compositor() else {
            trace!("no compositor bound, skipping composite");
            return false;
        };
        let snapshot = self
            .buffer
            .clone()
            .unwrap_or_else(|| Image::for_size(self.size));
        if compositor
            .send(CompositeRequest::new(snapshot))
            .await
            .is_err()
        {
            debug!(block = ?self.handle, "compositor closed");
            return false;
        }
        true
    }

    /// Wait for the next event or redraw; events are served first
    ///
    /// Returns `None` once nothing can arrive anymore.
    pub async fn next_input(&mut self) -> Option<BlockInput> {
        tokio::select! {
            biased;
            Some(event) = self.events.recv() => Some(BlockInput::Event(event)),
            Some(redraw) = self.redraw.recv() => Some(BlockInput::Redraw(redraw)),
            else => None,
        }
    }

    /// Take a queued event without waiting
    pub fn try_next_event(&mut self) -> Option<Event> {
        self.events.try_recv().ok()
    }

    /// Take a pending redraw without waiting
    pub fn try_next_redraw(&mut self) -> Option<RedrawEvent> {
        self.redraw.try_recv()
    }

    /// Default loop for a block that only paints
    ///
    /// Redraws repaint and composite, resizes invalidate, close ends the loop.
    pub async fn run(mut self) {
        while let Some(input) = self.next_input().await {
            match input {
                BlockInput::Redraw(_) => {
                    self.do_paint();
                    self.composite().await;
                }
                BlockInput::Event(Event::Resize(size)) => {
                    self.handle_resize(size);
                }
                BlockInput::Event(Event::Close) => break,
                BlockInput::Event(event) => trace!(?event, "unhandled block event"),
            }
        }
        debug!(block = ?self.handle, "block loop finished");
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .field("has_buffer", &self.buffer.is_some())
            .finish()
    }
}

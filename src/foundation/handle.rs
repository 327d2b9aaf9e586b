//! Client side of a running foundation

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::block::{BlockHandle, ParentLink};
use crate::event::{Button, Event};
use crate::geometry::{Coord, Rect};

/// Structural operations executed on the foundation's own loop
#[derive(Debug)]
pub(crate) enum Command {
    Place { block: BlockHandle, bounds: Rect },
    Remove(BlockHandle),
    /// The block was placed elsewhere; drop local bookkeeping only
    Release(BlockHandle),
    SetKeyboardBlock(Option<BlockHandle>),
    /// Broadcast close to every child, acknowledged once all have it queued
    Close(oneshot::Sender<()>),
    Snapshot(oneshot::Sender<FoundationSnapshot>),
}

/// Point-in-time copy of a foundation's bookkeeping
#[derive(Debug, Clone, Default)]
pub struct FoundationSnapshot {
    pub size: Coord,
    pub children: Vec<BlockHandle>,
    pub bounds: HashMap<BlockHandle, Rect>,
    pub cached_buffers: usize,
    pub drag_origins: HashMap<Button, Vec<BlockHandle>>,
    pub keyboard_block: Option<BlockHandle>,
}

impl FoundationSnapshot {
    /// Bounds recorded for `block`
    pub fn bounds_of(&self, block: &BlockHandle) -> Option<Rect> {
        self.bounds.get(block).copied()
    }
}

/// Handle for placing blocks into, and sending events to, a running
/// [`Foundation`](super::Foundation)
#[derive(Debug, Clone)]
pub struct FoundationHandle {
    block: BlockHandle,
    commands: mpsc::Sender<Command>,
}

impl FoundationHandle {
    pub(crate) fn new(block: BlockHandle, commands: mpsc::Sender<Command>) -> Self {
        Self { block, commands }
    }

    /// The foundation seen as a block, e.g. to place it inside another one
    pub fn block(&self) -> &BlockHandle {
        &self.block
    }

    pub(crate) fn link(&self) -> ParentLink {
        ParentLink::new(&self.block, &self.commands)
    }

    /// Attach `block` as a child at `bounds` (parent-local)
    pub async fn place_block(&self, block: BlockHandle, bounds: Rect) -> bool {
        self.command(Command::Place { block, bounds }).await
    }

    /// Detach `block`; ignored with a warning unless this foundation is its parent
    pub async fn remove_block(&self, block: BlockHandle) -> bool {
        self.command(Command::Remove(block)).await
    }

    /// Give `block` keyboard priority, or clear it with `None`
    pub async fn set_keyboard_block(&self, block: Option<BlockHandle>) -> bool {
        self.command(Command::SetKeyboardBlock(block)).await
    }

    /// Broadcast close to the children and wait until each has it queued
    ///
    /// Events accepted before the close are routed first. Returns `false` if
    /// the foundation loop has stopped.
    pub async fn close(&self) -> bool {
        let (tx, rx) = oneshot::channel();
        if !self.command(Command::Close(tx)).await {
            return false;
        }
        rx.await.is_ok()
    }

    /// Copy of the current bookkeeping, once all earlier commands are applied
    pub async fn snapshot(&self) -> Option<FoundationSnapshot> {
        let (tx, rx) = oneshot::channel();
        if !self.command(Command::Snapshot(tx)).await {
            return None;
        }
        rx.await.ok()
    }

    /// Deliver an event to the foundation's own input channel
    pub async fn send_event(&self, event: Event) -> bool {
        self.block.send_event(event).await
    }

    /// Schedule a redraw of `bounds` (foundation-local)
    pub fn stack_redraw(&self, bounds: Rect) -> bool {
        self.block.stack_redraw(bounds)
    }

    async fn command(&self, command: Command) -> bool {
        if self.commands.send(command).await.is_err() {
            debug!(foundation = ?self.block, "command dropped, foundation loop stopped");
            return false;
        }
        true
    }
}

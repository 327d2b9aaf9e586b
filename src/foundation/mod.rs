//! Foundations: blocks that own child blocks
//!
//! A [`Foundation`] channels input events to the children under the pointer
//! and composites their buffers into its own, which it then passes upward.
//! All of its bookkeeping (children, bounds, cached buffers, drag origins)
//! is owned by its single dispatch loop; other tasks reach it only through
//! channels, so no locking is involved.

mod children;
mod composite;
mod handle;
mod route;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::block::{Block, BlockHandle, PaintFn};
use crate::buffer::Image;
use crate::config::{HitTest, UikConfig};
use crate::event::{Button, Event};
use crate::geometry::{Coord, Rect};
use crate::message::{CompositeBlockRequest, RedrawEvent};

pub(crate) use handle::Command;
pub use handle::{FoundationHandle, FoundationSnapshot};

/// Capacity of the structural command inbox
const COMMAND_CAPACITY: usize = 16;

/// Tuning that a foundation reads from [`UikConfig`]
#[derive(Debug, Clone, Copy)]
pub struct FoundationConfig {
    pub event_capacity: usize,
    pub composite_capacity: usize,
    pub hit_test: HitTest,
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self::from(&UikConfig::default())
    }
}

impl From<&UikConfig> for FoundationConfig {
    fn from(config: &UikConfig) -> Self {
        Self {
            event_capacity: config.channels.event_capacity,
            composite_capacity: config.channels.composite_capacity,
            hit_test: config.routing.hit_test,
        }
    }
}

/// A block that owns children, routes events to them and composites them
pub struct Foundation {
    block: Block,
    config: FoundationConfig,

    children: Vec<BlockHandle>,
    children_bounds: HashMap<BlockHandle, Rect>,
    children_last_buffers: HashMap<BlockHandle, Arc<Image>>,
    /// Close signal of each child's composite forwarder
    forwarders: HashMap<BlockHandle, oneshot::Sender<()>>,

    /// Blocks that received a mouse-down, per button, until the matching up
    drag_origin_blocks: HashMap<Button, Vec<BlockHandle>>,

    /// This block currently has keyboard priority
    keyboard_block: Option<BlockHandle>,

    composite_tx: mpsc::Sender<CompositeBlockRequest>,
    composite_rx: mpsc::Receiver<CompositeBlockRequest>,
    commands_tx: mpsc::Sender<Command>,
    commands_rx: mpsc::Receiver<Command>,
}

/// Whatever woke the dispatch loop
enum Inbound {
    Command(Command),
    Event(Event),
    Redraw(RedrawEvent),
    Composite(CompositeBlockRequest),
}

impl Foundation {
    /// Create a foundation with default channel and routing settings
    pub fn new(size: Coord, paint: PaintFn) -> Self {
        Self::with_settings(size, paint, FoundationConfig::default())
    }

    /// Create a foundation configured from `config`
    pub fn with_config(size: Coord, paint: PaintFn, config: &UikConfig) -> Self {
        Self::with_settings(size, paint, FoundationConfig::from(config))
    }

    pub fn with_settings(size: Coord, paint: PaintFn, config: FoundationConfig) -> Self {
        let (composite_tx, composite_rx) = mpsc::channel(config.composite_capacity.max(1));
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        Self {
            block: Block::with_capacity(size, paint, config.event_capacity),
            config,
            children: Vec::new(),
            children_bounds: HashMap::new(),
            children_last_buffers: HashMap::new(),
            forwarders: HashMap::new(),
            drag_origin_blocks: HashMap::new(),
            keyboard_block: None,
            composite_tx,
            composite_rx,
            commands_tx,
            commands_rx,
        }
    }

    /// Handle for other tasks; valid for as long as the loop runs
    pub fn handle(&self) -> FoundationHandle {
        FoundationHandle::new(self.block.handle().clone(), self.commands_tx.clone())
    }

    /// The foundation's own block state
    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    pub fn size(&self) -> Coord {
        self.block.size()
    }

    /// Children in hit-test priority order
    pub fn children(&self) -> &[BlockHandle] {
        &self.children
    }

    pub fn child_bounds(&self, block: &BlockHandle) -> Option<Rect> {
        self.children_bounds.get(block).copied()
    }

    /// Buffer most recently composited for `block`
    pub fn last_buffer(&self, block: &BlockHandle) -> Option<&Arc<Image>> {
        self.children_last_buffers.get(block)
    }

    /// Blocks recorded as drag origins for `button`
    pub fn drag_origins(&self, button: Button) -> &[BlockHandle] {
        self.drag_origin_blocks
            .get(&button)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn keyboard_block(&self) -> Option<&BlockHandle> {
        self.keyboard_block.as_ref()
    }

    /// Copy of the current bookkeeping
    pub fn snapshot(&self) -> FoundationSnapshot {
        FoundationSnapshot {
            size: self.size(),
            children: self.children.clone(),
            bounds: self.children_bounds.clone(),
            cached_buffers: self.children_last_buffers.len(),
            drag_origins: self.drag_origin_blocks.clone(),
            keyboard_block: self.keyboard_block.clone(),
        }
    }

    /// Run the dispatch loop on a new task
    pub fn spawn(self) -> (FoundationHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }

    /// Dispatch loop: handles exactly one inbound message per iteration
    ///
    /// Structural commands are served before events, events before redraws,
    /// and redraws before composites when several are ready at once.
    pub async fn run(mut self) {
        debug!(foundation = ?self.block.handle(), "foundation loop started");
        while let Some(inbound) = self.next_inbound().await {
            self.dispatch(inbound).await;
        }
        debug!(foundation = ?self.block.handle(), "foundation loop finished");
    }

    async fn next_inbound(&mut self) -> Option<Inbound> {
        tokio::select! {
            biased;
            Some(command) = self.commands_rx.recv() => Some(Inbound::Command(command)),
            Some(event) = self.block.events.recv() => Some(Inbound::Event(event)),
            Some(redraw) = self.block.redraw.recv() => Some(Inbound::Redraw(redraw)),
            Some(cbr) = self.composite_rx.recv() => Some(Inbound::Composite(cbr)),
            else => None,
        }
    }

    async fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Command(command) => self.do_command(command).await,
            Inbound::Event(event) => self.do_event(event).await,
            Inbound::Redraw(redraw) => self.do_redraw(redraw).await,
            Inbound::Composite(cbr) => self.do_composite_block_request(cbr).await,
        }
    }

    async fn do_command(&mut self, command: Command) {
        match command {
            Command::Place { block, bounds } => self.place_block(block, bounds),
            Command::Remove(block) => self.remove_block(&block),
            Command::Release(block) => self.release_block(&block),
            Command::SetKeyboardBlock(block) => self.set_keyboard_block(block),
            Command::Close(ack) => {
                while let Ok(event) = self.block.events.try_recv() {
                    if !event.is_close() {
                        self.do_event(event).await;
                    }
                }
                self.do_close().await;
                if ack.send(()).is_err() {
                    trace!("close requester went away");
                }
            }
            Command::Snapshot(reply) => {
                if reply.send(self.snapshot()).is_err() {
                    trace!("snapshot requester went away");
                }
            }
        }
    }

    /// Handle one input event the way the dispatch loop does
    pub async fn do_event(&mut self, event: Event) {
        match event {
            Event::Close => self.do_close().await,
            Event::MouseDown(e) => self.do_mouse_down(e).await,
            Event::MouseUp(e) => self.do_mouse_up(e).await,
            Event::Resize(size) => self.do_resize(size),
            Event::Key(key) => self.do_key(key).await,
        }
    }
}

impl std::fmt::Debug for Foundation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Foundation")
            .field("block", &self.block)
            .field("children", &self.children.len())
            .field("hit_test", &self.config.hit_test)
            .finish()
    }
}

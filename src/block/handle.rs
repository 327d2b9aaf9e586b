//! Shareable handle to a block's inbound channels and parent binding

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::event::Event;
use crate::foundation::Command;
use crate::geometry::Rect;
use crate::message::{CompositeRequest, RedrawEvent, RedrawSender};

/// Handle through which parents and owners reach a [`Block`](super::Block)
///
/// Cloning is cheap. Equality and hashing follow allocation identity: two
/// handles are equal exactly when they refer to the same block.
#[derive(Clone)]
pub struct BlockHandle {
    inner: Arc<HandleInner>,
}

pub(crate) struct HandleInner {
    events: mpsc::Sender<Event>,
    redraw: RedrawSender,
    binding: watch::Sender<Option<Binding>>,
}

/// Where a placed block sends its composite requests, and who placed it
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) parent: Option<ParentLink>,
    pub(crate) compositor: mpsc::Sender<CompositeRequest>,
}

/// Non-owning back-reference from a child to the foundation holding it
#[derive(Clone)]
pub(crate) struct ParentLink {
    block: Weak<HandleInner>,
    commands: mpsc::WeakSender<Command>,
}

impl ParentLink {
    pub(crate) fn new(parent: &BlockHandle, commands: &mpsc::Sender<Command>) -> Self {
        Self {
            block: Arc::downgrade(&parent.inner),
            commands: commands.downgrade(),
        }
    }

    /// Whether this link points at the foundation owning `handle`
    pub(crate) fn is(&self, handle: &BlockHandle) -> bool {
        Weak::as_ptr(&self.block) == Arc::as_ptr(&handle.inner)
    }

    /// Whether the linked foundation is still running
    pub(crate) fn is_alive(&self) -> bool {
        self.block.strong_count() > 0 && self.commands.upgrade().is_some()
    }

    /// Ask the linked foundation to drop its bookkeeping for `block`
    pub(crate) fn release(&self, block: BlockHandle) {
        let Some(commands) = self.commands.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if commands.send(Command::Release(block)).await.is_err() {
                debug!("previous parent stopped before release");
            }
        });
    }
}

impl BlockHandle {
    pub(crate) fn new(events: mpsc::Sender<Event>, redraw: RedrawSender) -> Self {
        let (binding, _) = watch::channel(None);
        Self {
            inner: Arc::new(HandleInner {
                events,
                redraw,
                binding,
            }),
        }
    }

    /// Deliver an event to the block's input channel
    ///
    /// Waits while the channel is full. Returns `false` if the block's loop
    /// has stopped.
    pub async fn send_event(&self, event: Event) -> bool {
        if self.inner.events.send(event).await.is_err() {
            debug!(block = ?self, "event dropped, block loop stopped");
            return false;
        }
        true
    }

    /// Schedule a redraw of `bounds` (block-local), merging with any pending
    pub fn stack_redraw(&self, bounds: Rect) -> bool {
        self.inner.redraw.stack(RedrawEvent::new(bounds))
    }

    /// Whether the block is currently placed in a live foundation
    pub fn has_parent(&self) -> bool {
        self.parent().is_some()
    }

    /// Whether `parent` is the foundation currently holding this block
    pub fn is_child_of(&self, parent: &BlockHandle) -> bool {
        self.parent().is_some_and(|link| link.is(parent))
    }

    pub(crate) fn parent(&self) -> Option<ParentLink> {
        self.inner
            .binding
            .borrow()
            .as_ref()
            .and_then(|binding| binding.parent.clone())
            .filter(ParentLink::is_alive)
    }

    pub(crate) fn compositor(&self) -> Option<mpsc::Sender<CompositeRequest>> {
        self.inner
            .binding
            .borrow()
            .as_ref()
            .map(|binding| binding.compositor.clone())
    }

    pub(crate) fn bind(&self, binding: Binding) {
        self.inner.binding.send_replace(Some(binding));
    }

    pub(crate) fn unbind(&self) {
        self.inner.binding.send_replace(None);
    }
}

impl PartialEq for BlockHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for BlockHandle {}

impl Hash for BlockHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for BlockHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BlockHandle")
            .field(&Arc::as_ptr(&self.inner))
            .finish()
    }
}

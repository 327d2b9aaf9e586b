//! Child placement and removal

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use super::{Foundation, FoundationHandle};
use crate::block::{Binding, BlockHandle};
use crate::geometry::Rect;
use crate::message::{CompositeBlockRequest, CompositeRequest};

impl Foundation {
    /// Attach `block` as a child at `bounds`
    ///
    /// A block still held by another foundation is released there first.
    /// Placing an existing child again only moves it. Either way the child
    /// gets a fresh composite channel and `bounds` is scheduled for redraw.
    pub fn place_block(&mut self, block: BlockHandle, bounds: Rect) {
        let me = self.block.handle().clone();
        if block == me {
            warn!(foundation = ?me, "refusing to place a foundation inside itself");
            return;
        }

        if let Some(parent) = block.parent().filter(|parent| !parent.is(&me)) {
            debug!(?block, "moving block from another foundation");
            parent.release(block.clone());
        }
        if !self.children.contains(&block) {
            self.children.push(block.clone());
        }
        self.children_bounds.insert(block.clone(), bounds);

        let (compositor, requests) = mpsc::channel(self.config.composite_capacity.max(1));
        let (close_tx, close_rx) = oneshot::channel();
        spawn_forwarder(block.clone(), requests, self.composite_tx.clone(), close_rx);
        // Dropping a previous close signal stops the previous forwarder
        self.forwarders.insert(block.clone(), close_tx);

        let link = FoundationHandle::new(me.clone(), self.commands_tx.clone()).link();
        block.bind(Binding {
            parent: Some(link),
            compositor,
        });

        trace!(?block, ?bounds, "placed block");
        me.stack_redraw(bounds);
    }

    /// Detach `block` from this foundation
    ///
    /// Does nothing (besides a warning) if this foundation is not its parent.
    pub fn remove_block(&mut self, block: &BlockHandle) {
        if !block.is_child_of(self.block.handle()) {
            warn!(?block, "remove_block: block is not a child of this foundation");
            return;
        }
        block.unbind();
        self.forget(block);
    }

    /// Drop bookkeeping for a block that has been placed in another foundation
    ///
    /// A release can arrive after the block was placed here again; the block
    /// is then bound to this foundation and stays.
    pub(crate) fn release_block(&mut self, block: &BlockHandle) {
        if !self.children.contains(block) {
            trace!(?block, "release for unknown block");
            return;
        }
        if block.is_child_of(self.block.handle()) {
            trace!(?block, "stale release, block was placed here again");
            return;
        }
        self.forget(block);
    }

    /// Give a child keyboard priority, or clear it
    pub fn set_keyboard_block(&mut self, block: Option<BlockHandle>) {
        match block {
            Some(block) if !self.children.contains(&block) => {
                warn!(?block, "keyboard priority requested for a block that is not a child");
            }
            block => self.keyboard_block = block,
        }
    }

    fn forget(&mut self, block: &BlockHandle) {
        // Closes the child's composite channel
        self.forwarders.remove(block);
        if let Some(bounds) = self.children_bounds.remove(block) {
            self.block.handle().stack_redraw(bounds);
        }
        self.children_last_buffers.remove(block);
        self.children.retain(|child| child != block);
        for origins in self.drag_origin_blocks.values_mut() {
            origins.retain(|origin| origin != block);
        }
        self.drag_origin_blocks.retain(|_, origins| !origins.is_empty());
        if self.keyboard_block.as_ref() == Some(block) {
            self.keyboard_block = None;
        }
        trace!(?block, "forgot block");
    }
}

/// Relay a child's composite requests into the parent's inbox, tagged with
/// the child, until `close` fires or either side goes away
fn spawn_forwarder(
    block: BlockHandle,
    mut requests: mpsc::Receiver<CompositeRequest>,
    inbox: mpsc::Sender<CompositeBlockRequest>,
    mut close: oneshot::Receiver<()>,
) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = &mut close => break,
                request = requests.recv() => {
                    let Some(request) = request else { break };
                    let tagged = CompositeBlockRequest {
                        request,
                        block: block.clone(),
                    };
                    if inbox.send(tagged).await.is_err() {
                        break;
                    }
                }
            }
        }
        requests.close();
        trace!(?block, "composite forwarder stopped");
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::block::{clear_paint, Block};
    use crate::buffer::{Image, Rgba};
    use crate::event::Button;
    use crate::foundation::Command;
    use crate::geometry::Coord;

    fn foundation() -> Foundation {
        Foundation::new(Coord::new(100.0, 100.0), clear_paint())
    }

    fn child() -> Block {
        Block::new(Coord::new(10.0, 10.0), clear_paint())
    }

    #[tokio::test]
    async fn test_place_records_bounds_and_parent() {
        let mut f = foundation();
        let c = child();
        let bounds = Rect::from_edges(10.0, 10.0, 20.0, 20.0);

        f.place_block(c.handle().clone(), bounds);

        assert_eq!(f.children(), &[c.handle().clone()]);
        assert_eq!(f.child_bounds(c.handle()), Some(bounds));
        assert!(c.handle().is_child_of(f.block().handle()));
        assert!(c.handle().compositor().is_some());
        assert_eq!(f.block_mut().try_next_redraw().map(|r| r.bounds), Some(bounds));
    }

    #[tokio::test]
    async fn test_replace_moves_without_duplicating() {
        let mut f = foundation();
        let c = child();
        f.place_block(c.handle().clone(), Rect::from_edges(0.0, 0.0, 10.0, 10.0));
        f.place_block(c.handle().clone(), Rect::from_edges(50.0, 50.0, 60.0, 60.0));

        assert_eq!(f.children().len(), 1);
        assert_eq!(
            f.child_bounds(c.handle()),
            Some(Rect::from_edges(50.0, 50.0, 60.0, 60.0))
        );
        // Both placements were merged into one pending redraw
        assert_eq!(
            f.block_mut().try_next_redraw().map(|r| r.bounds),
            Some(Rect::from_edges(0.0, 0.0, 60.0, 60.0))
        );
    }

    #[tokio::test]
    async fn test_remove_clears_everything() {
        let mut f = foundation();
        let c = child();
        let bounds = Rect::from_edges(10.0, 10.0, 20.0, 20.0);
        f.place_block(c.handle().clone(), bounds);
        f.set_keyboard_block(Some(c.handle().clone()));
        f.drag_origin_blocks
            .entry(Button::Left)
            .or_default()
            .push(c.handle().clone());
        f.block_mut().try_next_redraw();

        f.remove_block(c.handle());

        assert!(f.children().is_empty());
        assert!(f.child_bounds(c.handle()).is_none());
        assert!(f.drag_origins(Button::Left).is_empty());
        assert!(f.keyboard_block().is_none());
        assert!(f.forwarders.is_empty());
        assert!(!c.handle().has_parent());
        assert!(c.handle().compositor().is_none());
        // Vacated area is redrawn
        assert_eq!(f.block_mut().try_next_redraw().map(|r| r.bounds), Some(bounds));
    }

    #[tokio::test]
    async fn test_remove_foreign_block_is_noop() {
        let mut f = foundation();
        let mine = child();
        let stranger = child();
        let bounds = Rect::from_edges(0.0, 0.0, 10.0, 10.0);
        f.place_block(mine.handle().clone(), bounds);
        let cached = Arc::new(Image::filled(10, 10, Rgba::WHITE));
        f.children_last_buffers
            .insert(mine.handle().clone(), cached.clone());
        f.drag_origin_blocks
            .entry(Button::Left)
            .or_default()
            .push(mine.handle().clone());
        f.set_keyboard_block(Some(mine.handle().clone()));
        f.block_mut().try_next_redraw();

        f.remove_block(stranger.handle());

        assert_eq!(f.children(), &[mine.handle().clone()]);
        assert_eq!(f.children_bounds.len(), 1);
        assert_eq!(f.child_bounds(mine.handle()), Some(bounds));
        assert_eq!(f.children_last_buffers.len(), 1);
        assert!(Arc::ptr_eq(f.last_buffer(mine.handle()).unwrap(), &cached));
        assert_eq!(f.forwarders.len(), 1);
        assert_eq!(f.drag_origins(Button::Left), &[mine.handle().clone()]);
        assert_eq!(f.keyboard_block(), Some(mine.handle()));
        assert!(mine.handle().is_child_of(f.block().handle()));
        assert!(f.block_mut().try_next_redraw().is_none());
    }

    #[tokio::test]
    async fn test_late_release_after_moving_back_keeps_block() {
        let mut a = foundation();
        let mut b = foundation();
        let c = child();
        let bounds = Rect::from_edges(0.0, 0.0, 10.0, 10.0);

        a.place_block(c.handle().clone(), bounds);
        b.place_block(c.handle().clone(), bounds);
        a.place_block(c.handle().clone(), bounds);

        // Both moves queued a release at the previous parent
        let command = a.commands_rx.recv().await.unwrap();
        assert!(matches!(command, Command::Release(ref block) if block == c.handle()));
        a.do_command(command).await;
        let command = b.commands_rx.recv().await.unwrap();
        assert!(matches!(command, Command::Release(ref block) if block == c.handle()));
        b.do_command(command).await;

        assert_eq!(a.children(), &[c.handle().clone()]);
        assert_eq!(a.child_bounds(c.handle()), Some(bounds));
        assert!(a.forwarders.contains_key(c.handle()));
        assert!(c.handle().is_child_of(a.block().handle()));
        assert!(b.children().is_empty());
        assert!(b.child_bounds(c.handle()).is_none());

        // The block still composites into a
        assert!(c.composite().await);
        let tagged = a.composite_rx.recv().await.unwrap();
        assert_eq!(&tagged.block, c.handle());
    }

    #[tokio::test]
    async fn test_keyboard_block_must_be_child() {
        let mut f = foundation();
        let stranger = child();
        f.set_keyboard_block(Some(stranger.handle().clone()));
        assert!(f.keyboard_block().is_none());
    }

    #[tokio::test]
    async fn test_cannot_place_into_itself() {
        let mut f = foundation();
        let me = f.block().handle().clone();
        f.place_block(me, Rect::from_edges(0.0, 0.0, 1.0, 1.0));
        assert!(f.children().is_empty());
    }

    #[tokio::test]
    async fn test_forwarder_tags_requests() {
        let mut f = foundation();
        let c = child();
        f.place_block(c.handle().clone(), Rect::from_edges(0.0, 0.0, 10.0, 10.0));

        assert!(c.composite().await);
        let tagged = f.composite_rx.recv().await.unwrap();
        assert_eq!(&tagged.block, c.handle());
    }
}

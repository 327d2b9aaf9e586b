//! Redraw propagation and compositing of child buffers

use tracing::trace;

use super::Foundation;
use crate::block::BlockHandle;
use crate::buffer::Image;
use crate::geometry::Coord;
use crate::message::{CompositeBlockRequest, RedrawEvent};

impl Foundation {
    pub(crate) fn do_resize(&mut self, size: Coord) {
        if self.block.handle_resize(size) {
            trace!(?size, "foundation resized");
        }
    }

    /// Repaint own content, pass the dirty area down to every child and
    /// recomposite the cached child buffers, then send the result upward
    pub(crate) async fn do_redraw(&mut self, e: RedrawEvent) {
        self.block.do_paint();
        for child in self.children.clone() {
            let Some(bounds) = self.children_bounds.get(&child).copied() else {
                continue;
            };
            child.stack_redraw(e.bounds.translate_into(bounds.min));
            if let Some(buffer) = self.children_last_buffers.get(&child).cloned() {
                self.composite_block_buffer(&child, &buffer);
            }
        }
        self.block.composite().await;
    }

    /// Alpha-composite `buffer` over this foundation's buffer at the child's
    /// bounds; returns `false` if `block` has no bounds here
    pub fn composite_block_buffer(&mut self, block: &BlockHandle, buffer: &Image) -> bool {
        let Some(bounds) = self.children_bounds.get(block).copied() else {
            return false;
        };
        self.block.prepare_buffer().draw_over(bounds, buffer);
        true
    }

    pub(crate) async fn do_composite_block_request(&mut self, cbr: CompositeBlockRequest) {
        let CompositeBlockRequest { request, block } = cbr;
        if !self.children.contains(&block) {
            trace!(?block, "composite request from a block that is no longer a child");
            return;
        }
        self.composite_block_buffer(&block, &request.buffer);
        self.children_last_buffers.insert(block, request.buffer);
        self.block.composite().await;
    }
}

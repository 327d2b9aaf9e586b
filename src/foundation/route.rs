//! Event routing to children

use std::collections::HashSet;

use tracing::trace;

use super::Foundation;
use crate::block::BlockHandle;
use crate::config::HitTest;
use crate::event::{Event, KeyEvent, MouseEvent};
use crate::geometry::Coord;

impl Foundation {
    /// All children whose bounds contain `p`, in children order
    pub fn blocks_for_coord(&self, p: Coord) -> Vec<BlockHandle> {
        self.children
            .iter()
            .filter(|child| {
                self.children_bounds
                    .get(*child)
                    .is_some_and(|bounds| bounds.contains_coord(p))
            })
            .cloned()
            .collect()
    }

    /// First child whose bounds contain `p`
    pub fn block_under(&self, p: Coord) -> Option<BlockHandle> {
        self.children
            .iter()
            .find(|child| {
                self.children_bounds
                    .get(*child)
                    .is_some_and(|bounds| bounds.contains_coord(p))
            })
            .cloned()
    }

    /// Call `f` with the first child under `p`; returns whether one was hit
    pub fn invoke_on_block_under<F>(&self, p: Coord, f: F) -> bool
    where
        F: FnOnce(&BlockHandle),
    {
        match self.block_under(p) {
            Some(block) => {
                f(&block);
                true
            }
            None => false,
        }
    }

    /// Children struck by a mouse event at `p` under the configured policy
    fn struck(&self, p: Coord) -> Vec<BlockHandle> {
        match self.config.hit_test {
            HitTest::All => self.blocks_for_coord(p),
            HitTest::First => self.block_under(p).into_iter().collect(),
        }
    }

    /// Translate `e` into `block`'s space and deliver it
    async fn send_mouse(&self, block: &BlockHandle, e: MouseEvent, down: bool) {
        let Some(bounds) = self.children_bounds.get(block) else {
            return;
        };
        let local = e.translated(bounds.min);
        let event = if down {
            Event::MouseDown(local)
        } else {
            Event::MouseUp(local)
        };
        block.send_event(event).await;
    }

    pub(crate) async fn do_mouse_down(&mut self, e: MouseEvent) {
        let struck = self.struck(e.loc);
        if struck.is_empty() {
            trace!(loc = ?e.loc, "mouse down hit nothing");
            return;
        }
        self.drag_origin_blocks
            .entry(e.which)
            .or_default()
            .extend(struck.iter().cloned());
        for block in &struck {
            self.send_mouse(block, e, true).await;
        }
    }

    /// Deliver to struck children, then to drag origins the pointer left
    pub(crate) async fn do_mouse_up(&mut self, e: MouseEvent) {
        let struck = self.struck(e.loc);
        let mut touched = HashSet::with_capacity(struck.len());
        for block in struck {
            self.send_mouse(&block, e, false).await;
            touched.insert(block);
        }

        let origins = self.drag_origin_blocks.remove(&e.which).unwrap_or_default();
        for origin in origins {
            // An origin pressed twice is still released once
            if touched.insert(origin.clone()) {
                trace!(block = ?origin, "releasing drag origin outside its bounds");
                self.send_mouse(&origin, e, false).await;
            }
        }
    }

    pub(crate) async fn do_close(&mut self) {
        for child in &self.children {
            child.send_event(Event::Close).await;
        }
    }

    pub(crate) async fn do_key(&mut self, key: KeyEvent) {
        match &self.keyboard_block {
            Some(block) => {
                block.send_event(Event::Key(key)).await;
            }
            None => trace!(?key, "no keyboard block, key dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{clear_paint, Block};
    use crate::event::{Button, KeyCode};
    use crate::foundation::FoundationConfig;
    use crate::geometry::Rect;

    fn foundation(hit_test: HitTest) -> Foundation {
        Foundation::with_settings(
            Coord::new(100.0, 100.0),
            clear_paint(),
            FoundationConfig {
                hit_test,
                ..FoundationConfig::default()
            },
        )
    }

    fn placed(f: &mut Foundation, bounds: Rect) -> Block {
        let block = Block::new(bounds.size(), clear_paint());
        f.place_block(block.handle().clone(), bounds);
        block
    }

    fn down(x: f64, y: f64) -> Event {
        Event::MouseDown(MouseEvent::new(Coord::new(x, y), Button::Left))
    }

    fn up(x: f64, y: f64) -> Event {
        Event::MouseUp(MouseEvent::new(Coord::new(x, y), Button::Left))
    }

    #[tokio::test]
    async fn test_blocks_for_coord_in_children_order() {
        let mut f = foundation(HitTest::All);
        let a = placed(&mut f, Rect::from_edges(0.0, 0.0, 50.0, 50.0));
        let b = placed(&mut f, Rect::from_edges(25.0, 25.0, 75.0, 75.0));

        assert_eq!(
            f.blocks_for_coord(Coord::new(30.0, 30.0)),
            vec![a.handle().clone(), b.handle().clone()]
        );
        assert_eq!(f.blocks_for_coord(Coord::new(60.0, 60.0)), vec![b.handle().clone()]);
        assert!(f.blocks_for_coord(Coord::new(90.0, 90.0)).is_empty());
        assert_eq!(f.block_under(Coord::new(30.0, 30.0)).as_ref(), Some(a.handle()));

        let mut hit = None;
        assert!(f.invoke_on_block_under(Coord::new(60.0, 60.0), |block| hit = Some(block.clone())));
        assert_eq!(hit.as_ref(), Some(b.handle()));
        assert!(!f.invoke_on_block_under(Coord::new(99.0, 1.0), |_| unreachable!()));
    }

    #[tokio::test]
    async fn test_drag_cancel_releases_origin() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(10.0, 10.0, 20.0, 20.0));

        f.do_event(down(15.0, 15.0)).await;
        assert_eq!(f.drag_origins(Button::Left), &[a.handle().clone()]);
        f.do_event(up(80.0, 80.0)).await;

        assert_eq!(
            a.try_next_event(),
            Some(Event::MouseDown(MouseEvent::new(Coord::new(5.0, 5.0), Button::Left)))
        );
        assert_eq!(
            a.try_next_event(),
            Some(Event::MouseUp(MouseEvent::new(Coord::new(70.0, 70.0), Button::Left)))
        );
        assert_eq!(a.try_next_event(), None);
        assert!(f.drag_origins(Button::Left).is_empty());
    }

    #[tokio::test]
    async fn test_press_and_release_inside_one_child() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 40.0, 40.0));
        let mut b = placed(&mut f, Rect::from_edges(50.0, 50.0, 90.0, 90.0));

        f.do_event(down(10.0, 10.0)).await;
        f.do_event(up(12.0, 12.0)).await;

        assert!(matches!(a.try_next_event(), Some(Event::MouseDown(_))));
        assert!(matches!(a.try_next_event(), Some(Event::MouseUp(_))));
        assert_eq!(a.try_next_event(), None);
        assert_eq!(b.try_next_event(), None);
    }

    #[tokio::test]
    async fn test_overlapping_origins_each_get_one_release() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 50.0, 50.0));
        let mut b = placed(&mut f, Rect::from_edges(25.0, 25.0, 75.0, 75.0));

        f.do_event(down(30.0, 30.0)).await;
        assert_eq!(f.drag_origins(Button::Left).len(), 2);
        // Up lands in b only; a is released as an untouched origin
        f.do_event(up(60.0, 60.0)).await;

        for block in [&mut a, &mut b] {
            assert!(matches!(block.try_next_event(), Some(Event::MouseDown(_))));
            assert!(matches!(block.try_next_event(), Some(Event::MouseUp(_))));
            assert_eq!(block.try_next_event(), None);
        }
        assert!(f.drag_origins(Button::Left).is_empty());
    }

    #[tokio::test]
    async fn test_first_hit_policy_targets_one_child() {
        let mut f = foundation(HitTest::First);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 50.0, 50.0));
        let mut b = placed(&mut f, Rect::from_edges(25.0, 25.0, 75.0, 75.0));

        f.do_event(down(30.0, 30.0)).await;

        assert!(matches!(a.try_next_event(), Some(Event::MouseDown(_))));
        assert_eq!(b.try_next_event(), None);
        assert_eq!(f.drag_origins(Button::Left), &[a.handle().clone()]);
    }

    #[tokio::test]
    async fn test_origins_tracked_per_button() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 50.0, 50.0));

        f.do_event(down(10.0, 10.0)).await;
        f.do_event(Event::MouseUp(MouseEvent::new(Coord::new(90.0, 90.0), Button::Right)))
            .await;

        assert_eq!(f.drag_origins(Button::Left).len(), 1);
        assert!(matches!(a.try_next_event(), Some(Event::MouseDown(_))));
        assert_eq!(a.try_next_event(), None);
    }

    #[tokio::test]
    async fn test_close_reaches_every_child() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 10.0, 10.0));
        let mut b = placed(&mut f, Rect::from_edges(20.0, 20.0, 30.0, 30.0));

        f.do_event(Event::Close).await;

        assert_eq!(a.try_next_event(), Some(Event::Close));
        assert_eq!(b.try_next_event(), Some(Event::Close));
    }

    #[tokio::test]
    async fn test_keys_go_to_keyboard_block_only() {
        let mut f = foundation(HitTest::All);
        let mut a = placed(&mut f, Rect::from_edges(0.0, 0.0, 10.0, 10.0));
        let mut b = placed(&mut f, Rect::from_edges(20.0, 20.0, 30.0, 30.0));
        let key = KeyEvent::new(KeyCode::Char('x'));

        f.do_event(Event::Key(key)).await;
        assert_eq!(a.try_next_event(), None);

        f.set_keyboard_block(Some(b.handle().clone()));
        f.do_event(Event::Key(key)).await;
        assert_eq!(a.try_next_event(), None);
        assert_eq!(b.try_next_event(), Some(Event::Key(key)));
    }
}

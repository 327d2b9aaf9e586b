use std::time::Duration;

use tokio::time::{timeout, Instant};
use uik::surface::{HeadlessController, HeadlessOutput, HeadlessSurface, SurfaceEvent};
use uik::test_utils::{collect_events, next_event};
use uik::{
    clear_paint, fill_paint, Block, Button, Coord, DisplayFoundation, Event, Foundation, Image,
    MouseEvent, Rect, Rgba, UikConfig,
};

const WAIT: Duration = Duration::from_secs(1);
const QUIET: Duration = Duration::from_millis(50);

const RED: Rgba = Rgba::opaque(255, 0, 0);
const GREEN: Rgba = Rgba::opaque(0, 255, 0);
const BLUE: Rgba = Rgba::opaque(0, 0, 255);

fn open(width: u32, height: u32) -> (DisplayFoundation, HeadlessController) {
    let (surface, ctl) = HeadlessSurface::new(width, height);
    let display =
        DisplayFoundation::new(surface.into_generator(), width, height, &UikConfig::default())
            .unwrap();
    (display, ctl)
}

async fn paint_and_composite(block: &mut Block, color: Rgba) {
    block.set_paint(fill_paint(color));
    block.do_paint();
    assert!(block.composite().await);
}

/// Read flushed frames until one satisfies `done`
async fn wait_for_frame(ctl: &mut HeadlessController, done: impl Fn(&Image) -> bool) -> Image {
    loop {
        let frame = timeout(WAIT, ctl.next_frame())
            .await
            .expect("no matching frame flushed")
            .expect("surface output closed");
        if done(&frame) {
            return frame;
        }
    }
}

fn frames(outputs: &[HeadlessOutput]) -> usize {
    outputs
        .iter()
        .filter(|o| matches!(o, HeadlessOutput::Frame(_)))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_burst_within_one_window_flushes_once() {
    let config = UikConfig::default();
    let (display, mut ctl) = open(8, 8);
    let mut leaf = Block::new(Coord::new(4.0, 4.0), clear_paint());
    display
        .handle()
        .place_block(leaf.handle().clone(), Rect::from_edges(0.0, 0.0, 4.0, 4.0))
        .await;

    // Placing redraws the root, which is flushed right away
    let first = ctl.next_frame().await.unwrap();
    assert_eq!(first.get(0, 0), Some(Rgba::TRANSPARENT));

    let start = Instant::now();
    for color in [RED, GREEN, BLUE] {
        paint_and_composite(&mut leaf, color).await;
    }

    let frame = ctl.next_frame().await.unwrap();
    assert!(start.elapsed() >= config.frame_delay());
    assert_eq!(frame.get(0, 0), Some(BLUE));
    assert_eq!(frame.get(3, 3), Some(BLUE));
    assert_eq!(frame.get(5, 5), Some(Rgba::TRANSPARENT));

    // The burst collapsed into that single flush
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(frames(&ctl.drain()), 0);
}

#[tokio::test(start_paused = true)]
async fn test_composite_after_idle_window_flushes_immediately() {
    let config = UikConfig::default();
    let (display, mut ctl) = open(8, 8);
    let mut leaf = Block::new(Coord::new(4.0, 4.0), clear_paint());
    display
        .handle()
        .place_block(leaf.handle().clone(), Rect::from_edges(2.0, 2.0, 6.0, 6.0))
        .await;
    ctl.next_frame().await.unwrap();

    // Let the repaint timer run out with nothing pending
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(frames(&ctl.drain()), 0);

    let start = Instant::now();
    paint_and_composite(&mut leaf, GREEN).await;
    let frame = ctl.next_frame().await.unwrap();

    assert!(start.elapsed() < config.frame_delay());
    assert_eq!(frame.get(2, 2), Some(GREEN));
    assert_eq!(frame.get(1, 1), Some(Rgba::TRANSPARENT));
}

#[tokio::test(start_paused = true)]
async fn test_leaf_paint_reaches_surface_through_nested_foundation() {
    let (display, mut ctl) = open(16, 16);
    let mut inner = Foundation::new(Coord::new(8.0, 8.0), clear_paint());
    let mut leaf = Block::new(Coord::new(2.0, 2.0), clear_paint());
    inner.place_block(leaf.handle().clone(), Rect::from_edges(1.0, 1.0, 3.0, 3.0));
    let (inner, _task) = inner.spawn();
    display
        .handle()
        .place_block(inner.block().clone(), Rect::from_edges(4.0, 4.0, 12.0, 12.0))
        .await;

    paint_and_composite(&mut leaf, RED).await;

    // Leaf at (1, 1) inside the inner foundation, which sits at (4, 4)
    let frame = wait_for_frame(&mut ctl, |f| f.get(5, 5) == Some(RED)).await;
    assert_eq!(frame.get(6, 6), Some(RED));
    assert_eq!(frame.get(4, 4), Some(Rgba::TRANSPARENT));
    assert_eq!(frame.get(7, 7), Some(Rgba::TRANSPARENT));
}

#[tokio::test(start_paused = true)]
async fn test_resize_waits_for_pacer_and_redraws_in_full() {
    let (display, mut ctl) = open(8, 8);
    let mut pane = Block::new(Coord::new(8.0, 8.0), clear_paint());
    display.set_pane(pane.handle().clone()).await;
    ctl.next_frame().await.unwrap();

    assert!(ctl.send(SurfaceEvent::Resize { width: 12, height: 6 }).await);
    loop {
        match timeout(WAIT, ctl.next_output()).await.unwrap() {
            Some(HeadlessOutput::Resized(width, height)) => {
                assert_eq!((width, height), (12, 6));
                break;
            }
            Some(HeadlessOutput::Frame(_)) => continue,
            other => panic!("unexpected surface output {:?}", other),
        }
    }

    let frame = ctl.next_frame().await.unwrap();
    assert_eq!((frame.width(), frame.height()), (12, 6));
    assert_eq!(
        next_event(&mut pane, WAIT).await,
        Some(Event::Resize(Coord::new(12.0, 6.0)))
    );

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(display.size(), Coord::new(12.0, 6.0));
    let snapshot = display.handle().snapshot().await.unwrap();
    assert_eq!(snapshot.size, Coord::new(12.0, 6.0));
    assert_eq!(
        snapshot.bounds_of(pane.handle()),
        Some(Rect::from_edges(0.0, 0.0, 12.0, 6.0))
    );
}

#[tokio::test]
async fn test_device_events_are_translated_to_child_space() {
    let (display, ctl) = open(16, 16);
    let mut leaf = Block::new(Coord::new(4.0, 4.0), clear_paint());
    display
        .handle()
        .place_block(leaf.handle().clone(), Rect::from_edges(2.0, 2.0, 6.0, 6.0))
        .await;

    ctl.send(SurfaceEvent::MouseDown { x: 3, y: 4, button: Button::Left })
        .await;
    ctl.send(SurfaceEvent::MouseUp { x: 10, y: 12, button: Button::Left })
        .await;

    let events = collect_events(&mut leaf, QUIET).await;
    assert_eq!(
        events,
        vec![
            Event::MouseDown(MouseEvent::new(Coord::new(1.0, 2.0), Button::Left)),
            Event::MouseUp(MouseEvent::new(Coord::new(8.0, 10.0), Button::Left)),
        ]
    );
}

#[tokio::test]
async fn test_surface_close_reaches_blocks_and_tears_down() {
    let (mut display, mut ctl) = open(8, 8);
    let mut pane = Block::new(Coord::new(8.0, 8.0), clear_paint());
    display.set_pane(pane.handle().clone()).await;

    assert!(ctl.send(SurfaceEvent::Close).await);

    loop {
        match timeout(WAIT, ctl.next_output()).await.unwrap() {
            Some(HeadlessOutput::Closed) => break,
            Some(_) => continue,
            None => panic!("surface dropped without closing"),
        }
    }
    // Close was queued at the pane before the surface went away
    assert_eq!(pane.try_next_event(), Some(Event::Close));

    timeout(WAIT, display.wait_closed()).await.unwrap();
    assert!(display.is_closed());
}

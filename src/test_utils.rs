use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use crate::block::{Block, BlockInput};
use crate::event::Event;

/// Global test utilities
///
/// Provides a process-wide mutex to serialize tests that mutate process-wide
/// state (like environment variables). Use this to avoid flaky tests when
/// `cargo test` runs tests in parallel.
pub fn env_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Next event delivered to `block`, skipping redraws, or `None` after `wait`
pub async fn next_event(block: &mut Block, wait: Duration) -> Option<Event> {
    tokio::time::timeout(wait, async {
        loop {
            match block.next_input().await {
                Some(BlockInput::Event(event)) => return Some(event),
                Some(BlockInput::Redraw(_)) => continue,
                None => return None,
            }
        }
    })
    .await
    .ok()
    .flatten()
}

/// Every event delivered to `block` until nothing arrives for `quiet`
pub async fn collect_events(block: &mut Block, quiet: Duration) -> Vec<Event> {
    let mut events = Vec::new();
    while let Some(event) = next_event(block, quiet).await {
        events.push(event);
    }
    events
}

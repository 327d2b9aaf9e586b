//! Coalescing redraw channel
//!
//! At most one redraw is pending per receiver. Stacking a redraw while one is
//! pending widens the pending rectangle to cover both, so senders never wait
//! on a busy receiver.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::Notify;

use super::RedrawEvent;
use crate::geometry::Rect;

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<Option<Rect>>,
    notify: Notify,
    senders: AtomicUsize,
    receiver_closed: AtomicBool,
}

impl Shared {
    fn take(&self) -> Option<Rect> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Create a connected redraw sender and receiver
pub fn redraw_channel() -> (RedrawSender, RedrawReceiver) {
    let shared = Arc::new(Shared::default());
    shared.senders.store(1, Ordering::Release);
    (
        RedrawSender {
            shared: shared.clone(),
        },
        RedrawReceiver { shared },
    )
}

/// Sending half; cheap to clone
#[derive(Debug)]
pub struct RedrawSender {
    shared: Arc<Shared>,
}

impl RedrawSender {
    /// Queue a redraw, merging it into any redraw still pending
    ///
    /// Returns `false` when the receiver is gone.
    pub fn stack(&self, event: RedrawEvent) -> bool {
        if self.shared.receiver_closed.load(Ordering::Acquire) {
            return false;
        }
        {
            let mut pending = self
                .shared
                .pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *pending = Some(match *pending {
                Some(prev) => prev.union(&event.bounds),
                None => event.bounds,
            });
        }
        self.shared.notify.notify_one();
        true
    }
}

impl Clone for RedrawSender {
    fn clone(&self) -> Self {
        self.shared.senders.fetch_add(1, Ordering::AcqRel);
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl Drop for RedrawSender {
    fn drop(&mut self) {
        if self.shared.senders.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.shared.notify.notify_one();
        }
    }
}

/// Receiving half, owned by the block's loop
#[derive(Debug)]
pub struct RedrawReceiver {
    shared: Arc<Shared>,
}

impl RedrawReceiver {
    /// Wait for the next (possibly merged) redraw
    ///
    /// Returns `None` once every sender is dropped and nothing is pending.
    pub async fn recv(&mut self) -> Option<RedrawEvent> {
        loop {
            let notified = self.shared.notify.notified();
            if let Some(bounds) = self.shared.take() {
                return Some(RedrawEvent::new(bounds));
            }
            if self.shared.senders.load(Ordering::Acquire) == 0 {
                return None;
            }
            notified.await;
        }
    }

    /// Take the pending redraw without waiting
    pub fn try_recv(&mut self) -> Option<RedrawEvent> {
        self.shared.take().map(RedrawEvent::new)
    }
}

impl Drop for RedrawReceiver {
    fn drop(&mut self) {
        self.shared.receiver_closed.store(true, Ordering::Release);
    }
}

//! Frame pacing: at most one surface flush per frame delay
//!
//! Composites are copied to the back buffer as soon as they arrive. A flush
//! happens immediately when the surface is idle; otherwise the frame is
//! marked pending and flushed when the repaint timer fires. The newest
//! frame always wins and no flush is wasted on unchanged content.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};

use crate::message::CompositeRequest;
use crate::surface::Surface;

/// Whether a flush happened within the current delay window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingState {
    Idle,
    WaitingForRepaint,
}

/// What the pacer has to do after an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingAction {
    /// Present the back buffer now and arm the repaint timer
    Flush,
    /// Keep the frame until the repaint timer fires
    Defer,
    /// Nothing to present
    Idle,
}

/// The pacing state machine, free of any I/O
#[derive(Debug, Clone)]
pub struct FramePacing {
    state: PacingState,
    pending: bool,
}

impl Default for FramePacing {
    fn default() -> Self {
        Self::new()
    }
}

impl FramePacing {
    pub fn new() -> Self {
        Self {
            state: PacingState::Idle,
            pending: false,
        }
    }

    pub fn state(&self) -> PacingState {
        self.state
    }

    /// New content is in the back buffer but not presented yet
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// A composite was drawn to the back buffer
    pub fn on_composite(&mut self) -> PacingAction {
        match self.state {
            PacingState::WaitingForRepaint => {
                self.pending = true;
                PacingAction::Defer
            }
            PacingState::Idle => self.flushed(),
        }
    }

    /// The repaint timer fired
    pub fn on_repaint_due(&mut self) -> PacingAction {
        self.state = PacingState::Idle;
        if self.pending {
            self.flushed()
        } else {
            PacingAction::Idle
        }
    }

    /// Stop flushing until the next repaint timer fires
    pub fn hold(&mut self) {
        self.state = PacingState::WaitingForRepaint;
    }

    fn flushed(&mut self) -> PacingAction {
        self.pending = false;
        self.state = PacingState::WaitingForRepaint;
        PacingAction::Flush
    }
}

/// Requests from the display to the task owning the surface
#[derive(Debug)]
pub(crate) enum PacerControl {
    /// Hold flushes, then acknowledge that resizing is safe
    WaitForRepaint(oneshot::Sender<()>),
    /// Arm the repaint timer
    ScheduleRepaint,
    Resize(u32, u32),
    Show,
    Close,
}

/// Task that owns the surface and presents composited frames
pub(crate) struct Pacer<S: Surface> {
    surface: S,
    pacing: FramePacing,
    delay: Duration,
    compositor: mpsc::Receiver<CompositeRequest>,
    control: mpsc::Receiver<PacerControl>,
    repaint_tx: mpsc::Sender<u64>,
    repaint_rx: mpsc::Receiver<u64>,
    /// Generation of the most recently armed timer; older ones are ignored
    generation: u64,
    frames: u64,
}

impl<S: Surface> Pacer<S> {
    pub(crate) fn new(
        surface: S,
        compositor: mpsc::Receiver<CompositeRequest>,
        control: mpsc::Receiver<PacerControl>,
        delay: Duration,
    ) -> Self {
        let (repaint_tx, repaint_rx) = mpsc::channel(1);
        Self {
            surface,
            pacing: FramePacing::new(),
            delay,
            compositor,
            control,
            repaint_tx,
            repaint_rx,
            generation: 0,
            frames: 0,
        }
    }

    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;
                Some(control) = self.control.recv() => {
                    if !self.on_control(control) {
                        break;
                    }
                }
                Some(generation) = self.repaint_rx.recv() => self.on_repaint(generation),
                Some(request) = self.compositor.recv() => self.on_composite(request),
                else => break,
            }
        }
        debug!(frames = self.frames, "pacer stopped");
    }

    fn on_control(&mut self, control: PacerControl) -> bool {
        match control {
            PacerControl::WaitForRepaint(ack) => {
                self.pacing.hold();
                if ack.send(()).is_err() {
                    trace!("resize handshake abandoned");
                }
            }
            PacerControl::ScheduleRepaint => self.arm_timer(),
            PacerControl::Resize(width, height) => self.surface.resize(width, height),
            PacerControl::Show => {
                if let Err(e) = self.surface.show() {
                    warn!(error = %e, "failed to show surface");
                }
            }
            PacerControl::Close => {
                self.surface.close();
                return false;
            }
        }
        true
    }

    fn on_composite(&mut self, request: CompositeRequest) {
        let buffer = request.buffer;
        self.surface.screen().draw_src(buffer.bounds(), &buffer);
        match self.pacing.on_composite() {
            PacingAction::Flush => self.flush(),
            _ => trace!("frame deferred to next repaint"),
        }
    }

    fn on_repaint(&mut self, generation: u64) {
        if generation != self.generation {
            trace!(generation, "stale repaint timer");
            return;
        }
        if self.pacing.on_repaint_due() == PacingAction::Flush {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.surface.flush() {
            warn!(error = %e, "surface flush failed");
        }
        self.frames += 1;
        self.arm_timer();
    }

    fn arm_timer(&mut self) {
        self.generation += 1;
        tokio::spawn(sleep_repaint(self.repaint_tx.clone(), self.delay, self.generation));
    }
}

async fn sleep_repaint(tx: mpsc::Sender<u64>, delay: Duration, generation: u64) {
    tokio::time::sleep(delay).await;
    // The pacer may have stopped
    let _ = tx.send(generation).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_composite_flushes() {
        let mut pacing = FramePacing::new();
        assert_eq!(pacing.on_composite(), PacingAction::Flush);
        assert_eq!(pacing.state(), PacingState::WaitingForRepaint);
        assert!(!pacing.has_pending());
    }

    #[test]
    fn test_burst_collapses_into_one_deferred_flush() {
        let mut pacing = FramePacing::new();
        assert_eq!(pacing.on_composite(), PacingAction::Flush);
        for _ in 0..5 {
            assert_eq!(pacing.on_composite(), PacingAction::Defer);
        }
        assert!(pacing.has_pending());

        assert_eq!(pacing.on_repaint_due(), PacingAction::Flush);
        assert!(!pacing.has_pending());
        // Nothing new arrived during the second window
        assert_eq!(pacing.on_repaint_due(), PacingAction::Idle);
        assert_eq!(pacing.state(), PacingState::Idle);
    }

    #[test]
    fn test_hold_defers_until_repaint() {
        let mut pacing = FramePacing::new();
        pacing.hold();
        assert_eq!(pacing.on_composite(), PacingAction::Defer);
        assert_eq!(pacing.on_repaint_due(), PacingAction::Flush);
    }

    #[test]
    fn test_idle_repaint_does_nothing() {
        let mut pacing = FramePacing::new();
        assert_eq!(pacing.on_repaint_due(), PacingAction::Idle);
        assert_eq!(pacing.on_composite(), PacingAction::Flush);
    }
}

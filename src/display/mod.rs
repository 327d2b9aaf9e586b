//! The root foundation bound to a display surface
//!
//! [`DisplayFoundation::new`] starts three tasks: the surface event
//! translator, the frame pacer (which owns the surface) and the foundation's
//! own dispatch loop. They stop when the `DisplayFoundation` is dropped.

mod pacing;
mod translate;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::block::{clear_paint, Binding, BlockHandle};
use crate::config::UikConfig;
use crate::error::{SurfaceError, UikError};
use crate::foundation::{Foundation, FoundationHandle};
use crate::geometry::{Coord, Rect};
use crate::surface::{Surface, SurfaceGenerator};

use pacing::{Pacer, PacerControl};
use translate::Translator;

pub use pacing::{FramePacing, PacingAction, PacingState};

const CONTROL_CAPACITY: usize = 4;

/// A foundation whose composites end up on a [`Surface`]
pub struct DisplayFoundation {
    foundation: FoundationHandle,
    control: mpsc::Sender<PacerControl>,
    pane: watch::Sender<Option<BlockHandle>>,
    size: watch::Receiver<Coord>,
    closed: watch::Receiver<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl DisplayFoundation {
    /// Build a surface of `width x height` and start the display tasks
    ///
    /// Fails without starting anything if there is no tokio runtime or the
    /// surface cannot be created.
    pub fn new<G>(generator: G, width: u32, height: u32, config: &UikConfig) -> Result<Self, UikError>
    where
        G: SurfaceGenerator,
    {
        tokio::runtime::Handle::try_current().map_err(|_| UikError::NoRuntime)?;
        let mut surface = generator.generate(width, height)?;
        let events = surface.take_events().ok_or(SurfaceError::EventsTaken)?;

        let size = Coord::new(f64::from(width), f64::from(height));
        let foundation = Foundation::with_config(size, clear_paint(), config);
        let (compositor_tx, compositor_rx) =
            mpsc::channel(config.channels.composite_capacity.max(1));
        foundation.block().handle().bind(Binding {
            parent: None,
            compositor: compositor_tx,
        });

        let (control_tx, control_rx) = mpsc::channel(CONTROL_CAPACITY);
        let (pane_tx, pane_rx) = watch::channel(None);
        let (size_tx, size_rx) = watch::channel(size);
        let (closed_tx, closed_rx) = watch::channel(false);

        let pacer = Pacer::new(surface, compositor_rx, control_rx, config.frame_delay());
        let (handle, foundation_task) = foundation.spawn();
        let translator = Translator {
            events,
            foundation: handle.clone(),
            control: control_tx.clone(),
            pane: pane_rx,
            size: size_tx,
            closed: closed_tx,
        };

        let tasks = vec![
            tokio::spawn(translator.run()),
            tokio::spawn(pacer.run()),
            foundation_task,
        ];
        info!(width, height, frame_delay_ms = config.display.frame_delay_ms, "display started");

        Ok(Self {
            foundation: handle,
            control: control_tx,
            pane: pane_tx,
            size: size_rx,
            closed: closed_rx,
            tasks,
        })
    }

    /// Reveal the surface and redraw everything visible
    pub async fn show(&self) -> bool {
        if self.control.send(PacerControl::Show).await.is_err() {
            return false;
        }
        self.foundation.stack_redraw(Rect::sized(self.size()))
    }

    /// Place `block` over the whole display; it follows later resizes
    pub async fn set_pane(&self, block: BlockHandle) -> bool {
        let placed = self
            .foundation
            .place_block(block.clone(), Rect::sized(self.size()))
            .await;
        self.pane.send_replace(Some(block));
        placed
    }

    /// The display's root foundation
    pub fn handle(&self) -> &FoundationHandle {
        &self.foundation
    }

    /// Latest known display size
    pub fn size(&self) -> Coord {
        *self.size.borrow()
    }

    /// Whether the surface reported close (or its event source ended)
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Wait until the surface closes
    pub async fn wait_closed(&mut self) {
        // A dropped sender means the translator is gone, which counts as closed
        let _ = self.closed.wait_for(|closed| *closed).await;
    }
}

impl Drop for DisplayFoundation {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        debug!("display tasks stopped");
    }
}

impl std::fmt::Debug for DisplayFoundation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayFoundation")
            .field("foundation", self.foundation.block())
            .field("size", &self.size())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{HeadlessOutput, HeadlessSurface};

    #[test]
    fn test_new_without_runtime_fails() {
        let (surface, _ctl) = HeadlessSurface::new(4, 4);
        let result = DisplayFoundation::new(surface.into_generator(), 4, 4, &UikConfig::default());
        assert!(matches!(result, Err(UikError::NoRuntime)));
    }

    #[tokio::test]
    async fn test_generator_failure_is_returned() {
        fn unavailable(_: u32, _: u32) -> Result<HeadlessSurface, SurfaceError> {
            Err(SurfaceError::Unavailable("no display".to_string()))
        }
        let result = DisplayFoundation::new(unavailable, 4, 4, &UikConfig::default());
        assert!(matches!(result, Err(UikError::Surface(SurfaceError::Unavailable(_)))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_flushes_first_frame() {
        let (surface, mut ctl) = HeadlessSurface::new(4, 4);
        let display =
            DisplayFoundation::new(surface.into_generator(), 4, 4, &UikConfig::default()).unwrap();

        assert!(display.show().await);
        assert_eq!(ctl.next_output().await, Some(HeadlessOutput::Shown));
        let frame = ctl.next_frame().await.unwrap();
        assert_eq!((frame.width(), frame.height()), (4, 4));
    }
}

//! Surface event translation

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

use super::pacing::PacerControl;
use crate::block::BlockHandle;
use crate::event::{Event, MouseEvent};
use crate::foundation::FoundationHandle;
use crate::geometry::{Coord, Rect};
use crate::surface::SurfaceEvent;

/// Feeds raw surface events into the display's foundation
pub(crate) struct Translator {
    pub(crate) events: mpsc::Receiver<SurfaceEvent>,
    pub(crate) foundation: FoundationHandle,
    pub(crate) control: mpsc::Sender<PacerControl>,
    pub(crate) pane: watch::Receiver<Option<BlockHandle>>,
    pub(crate) size: watch::Sender<Coord>,
    pub(crate) closed: watch::Sender<bool>,
}

impl Translator {
    pub(crate) async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            trace!(?event, "surface event");
            match event {
                SurfaceEvent::Close => {
                    // Children get close before the surface goes away
                    if !self.foundation.close().await {
                        debug!("foundation stopped before close");
                    }
                    self.control(PacerControl::Close).await;
                    break;
                }
                SurfaceEvent::MouseDown { x, y, button } => {
                    let e = MouseEvent::new(Coord::from_device(x, y), button);
                    self.foundation.send_event(Event::MouseDown(e)).await;
                }
                SurfaceEvent::MouseUp { x, y, button } => {
                    let e = MouseEvent::new(Coord::from_device(x, y), button);
                    self.foundation.send_event(Event::MouseUp(e)).await;
                }
                SurfaceEvent::Key(key) => {
                    self.foundation.send_event(Event::Key(key)).await;
                }
                SurfaceEvent::Resize { width, height } => self.resize(width, height).await,
            }
        }
        self.closed.send_replace(true);
        debug!("surface event translator finished");
    }

    /// Resize handshake: hold the pacer, resize everything, redraw in full,
    /// then let the pacer flush again after one frame delay
    async fn resize(&mut self, width: u32, height: u32) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if !self.control(PacerControl::WaitForRepaint(ack_tx)).await || ack_rx.await.is_err() {
            debug!("pacer gone, resize dropped");
            return;
        }
        self.control(PacerControl::Resize(width, height)).await;

        let size = Coord::new(f64::from(width), f64::from(height));
        let bounds = Rect::sized(size);
        self.foundation.send_event(Event::Resize(size)).await;
        let pane = self.pane.borrow().clone();
        if let Some(pane) = pane {
            self.foundation.place_block(pane.clone(), bounds).await;
            pane.send_event(Event::Resize(size)).await;
        }
        self.size.send_replace(size);
        self.foundation.stack_redraw(bounds);
        self.control(PacerControl::ScheduleRepaint).await;
    }

    async fn control(&self, control: PacerControl) -> bool {
        self.control.send(control).await.is_ok()
    }
}

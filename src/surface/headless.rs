//! In-memory surface for tests and offscreen rendering

use tokio::sync::mpsc;

use super::{Surface, SurfaceEvent};
use crate::buffer::Image;
use crate::error::SurfaceError;

/// Capacity of the injected event channel
const EVENT_CAPACITY: usize = 16;

/// What a [`HeadlessSurface`] did, in order
#[derive(Debug, Clone, PartialEq)]
pub enum HeadlessOutput {
    /// A flush, with a copy of the presented back buffer
    Frame(Image),
    Shown,
    Resized(u32, u32),
    Closed,
}

/// A surface that records its output instead of displaying it
pub struct HeadlessSurface {
    screen: Image,
    events: Option<mpsc::Receiver<SurfaceEvent>>,
    output: mpsc::UnboundedSender<HeadlessOutput>,
    closed: bool,
}

/// The other end of a [`HeadlessSurface`]: injects events, observes output
#[derive(Debug)]
pub struct HeadlessController {
    events: mpsc::Sender<SurfaceEvent>,
    output: mpsc::UnboundedReceiver<HeadlessOutput>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> (Self, HeadlessController) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CAPACITY);
        let (output_tx, output_rx) = mpsc::unbounded_channel();
        let surface = Self {
            screen: Image::new(width, height),
            events: Some(events_rx),
            output: output_tx,
            closed: false,
        };
        let controller = HeadlessController {
            events: events_tx,
            output: output_rx,
        };
        (surface, controller)
    }

    /// Generator handing out this surface, sized to whatever is requested
    pub fn into_generator(mut self) -> impl FnOnce(u32, u32) -> Result<Self, SurfaceError> {
        move |width, height| {
            self.screen = Image::new(width, height);
            Ok(self)
        }
    }

    fn record(&self, output: HeadlessOutput) {
        // Nobody watching is fine
        let _ = self.output.send(output);
    }
}

impl Surface for HeadlessSurface {
    fn take_events(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>> {
        self.events.take()
    }

    fn screen(&mut self) -> &mut Image {
        &mut self.screen
    }

    fn flush(&mut self) -> Result<(), SurfaceError> {
        if self.closed {
            return Err(SurfaceError::Unavailable("surface is closed".to_string()));
        }
        self.record(HeadlessOutput::Frame(self.screen.clone()));
        Ok(())
    }

    fn show(&mut self) -> Result<(), SurfaceError> {
        self.record(HeadlessOutput::Shown);
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.screen = Image::new(width, height);
        self.record(HeadlessOutput::Resized(width, height));
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.record(HeadlessOutput::Closed);
        }
    }
}

impl HeadlessController {
    /// Inject a raw surface event; `false` once the surface stopped reading
    pub async fn send(&self, event: SurfaceEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Next recorded output, waiting for it
    pub async fn next_output(&mut self) -> Option<HeadlessOutput> {
        self.output.recv().await
    }

    /// Next recorded output, if one is already there
    pub fn try_output(&mut self) -> Option<HeadlessOutput> {
        self.output.try_recv().ok()
    }

    /// Wait for the next flushed frame, skipping other output
    pub async fn next_frame(&mut self) -> Option<Image> {
        while let Some(output) = self.output.recv().await {
            if let HeadlessOutput::Frame(frame) = output {
                return Some(frame);
            }
        }
        None
    }

    /// Take every output recorded so far
    pub fn drain(&mut self) -> Vec<HeadlessOutput> {
        std::iter::from_fn(|| self.try_output()).collect()
    }
}

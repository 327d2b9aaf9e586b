//! Display surfaces: an event source, a back buffer and a flush
//!
//! [`DisplayFoundation`](crate::display::DisplayFoundation) drives any
//! [`Surface`]. Two are provided: an in-memory [`HeadlessSurface`] and, with
//! the `terminal` feature, a crossterm [`TerminalSurface`].

mod headless;
#[cfg(feature = "terminal")]
mod terminal;

use tokio::sync::mpsc;

use crate::buffer::Image;
use crate::error::SurfaceError;
use crate::event::{Button, KeyEvent};

pub use headless::{HeadlessController, HeadlessOutput, HeadlessSurface};
#[cfg(feature = "terminal")]
pub use terminal::{pixel_size, TerminalSurface};

/// Raw event reported by a surface, in integer device coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceEvent {
    Close,
    MouseDown { x: i32, y: i32, button: Button },
    MouseUp { x: i32, y: i32, button: Button },
    Resize { width: u32, height: u32 },
    Key(KeyEvent),
}

/// A drawable output with its own input source
pub trait Surface: Send + 'static {
    /// Hand out the raw event source; `None` once it has been taken
    fn take_events(&mut self) -> Option<mpsc::Receiver<SurfaceEvent>>;

    /// Back buffer that the next [`flush`](Surface::flush) presents
    fn screen(&mut self) -> &mut Image;

    /// Present the back buffer
    fn flush(&mut self) -> Result<(), SurfaceError>;

    /// Make the surface visible
    fn show(&mut self) -> Result<(), SurfaceError>;

    /// Reallocate the back buffer after the surface changed size
    fn resize(&mut self, width: u32, height: u32);

    /// Tear the surface down
    fn close(&mut self);
}

/// Builds a surface of a given pixel size
pub trait SurfaceGenerator {
    type Surface: Surface;

    fn generate(self, width: u32, height: u32) -> Result<Self::Surface, SurfaceError>;
}

impl<F, S> SurfaceGenerator for F
where
    F: FnOnce(u32, u32) -> Result<S, SurfaceError>,
    S: Surface,
{
    type Surface = S;

    fn generate(self, width: u32, height: u32) -> Result<S, SurfaceError> {
        self(width, height)
    }
}

//! Toolkit error types

use thiserror::Error;

/// Errors raised by a display surface
#[derive(Error, Debug)]
pub enum SurfaceError {
    /// The surface could not be created
    #[error("Surface unavailable: {0}")]
    Unavailable(String),

    /// The surface's event source was already handed out
    #[error("Surface events were already taken")]
    EventsTaken,

    /// Drawing to or flushing the surface failed
    #[error("Surface I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned when building a display foundation
#[derive(Error, Debug)]
pub enum UikError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Display tasks need a running tokio runtime
    #[error("No tokio runtime available to run the display tasks")]
    NoRuntime,
}

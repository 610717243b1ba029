// THEORY:
// Every fallible entry point of the crate reports through one error enum. Shape
// problems are caught once, when a `BgrImage` is constructed, so the scoring and
// counting code downstream never has to re-check channel counts or dimensions.

use thiserror::Error;

/// Errors raised while building or classifying a frame.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The frame does not carry exactly three (blue, green, red) channels.
    #[error("invalid image format: expected 3 channels (blue, green, red), got {channels}")]
    InvalidImageFormat { channels: usize },

    /// The frame has a zero width or height.
    #[error("empty image: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("image I/O error: {0}")]
    Image(#[from] image::ImageError),

    /// A frame was submitted after the worker pool shut down, or its worker vanished.
    #[error("worker pool closed: {0}")]
    WorkerPoolClosed(&'static str),
}

pub type Result<T> = std::result::Result<T, ClassifierError>;

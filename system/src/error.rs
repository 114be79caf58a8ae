use thiserror::Error;

/// Rejected draw. The grid is never touched when one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("pixel ({x}, {y}) is outside of the canvas")]
    OutOfBounds { x: i64, y: i64 },
    #[error("draw request has no color")]
    MissingColor,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u8),
    #[error("empty payload")]
    Empty,
    #[error("invalid session code {0:?}")]
    InvalidCode(String),
    #[error("stored pixel ({x}, {y}) is outside of the canvas")]
    PixelOutOfBounds { x: u16, y: u16 },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid color {0:?}")]
    InvalidColor(String),
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

//! Error type shared by every imaging operation.
//!
//! Core operations fail synchronously with one of four kinds. The CLI host
//! wraps these in `anyhow` with file context.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImagingError {
    /// Zero-area raster, non-positive scale, malformed option combination.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A rendering resource (font, drawing surface) could not be acquired.
    #[error("Rendering context unavailable: {0}")]
    ContextUnavailable(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, ImagingError>;

impl ImagingError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

//! Error types for the SLA pipeline.

use thiserror::Error;

/// Errors that can occur while preparing an SLA print.
#[derive(Error, Debug)]
pub enum SlaError {
    /// Invalid printer or print settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Raster buffer does not match its declared geometry.
    #[error("invalid raster: {0}")]
    InvalidRaster(String),

    /// Configuration document could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for SLA operations.
pub type Result<T> = std::result::Result<T, SlaError>;

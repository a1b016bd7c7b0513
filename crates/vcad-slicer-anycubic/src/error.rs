//! Error types for Anycubic archive export.

use std::path::PathBuf;

use thiserror::Error;
use vcad_slicer_sla::SlaError;

use crate::layout::Section;

/// Errors from planning or writing an archive.
#[derive(Error, Debug)]
pub enum AnycubicError {
    /// Output path has no file name or its directory does not exist.
    #[error("invalid output path: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    /// A section would start past the 32-bit offset range.
    #[error("{section:?} section offset {offset} exceeds the 32-bit range")]
    SectionOverflow {
        /// Section that does not fit.
        section: Section,
        /// Offset it would start at.
        offset: u64,
    },

    /// Serializer position disagrees with the planned layout.
    #[error("{section:?} section written at {actual}, planned at {expected}")]
    LayoutMismatch {
        /// Section being written.
        section: Section,
        /// Planned offset.
        expected: u64,
        /// Actual position.
        actual: u64,
    },

    /// Settings or raster error.
    #[error(transparent)]
    Sla(#[from] SlaError),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for archive operations.
pub type Result<T> = std::result::Result<T, AnycubicError>;

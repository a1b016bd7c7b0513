//! Archive writer contract.

use std::path::Path;

use crate::print::{SlaPrint, Thumbnail};
use crate::raster::{RasterEncoder, RasterGrayscaleAa};

/// A printer-specific output format.
///
/// The rasterization pipeline asks the writer for a raster configured for
/// the target display and for the encoder its layers must go through, then
/// hands the finished print back for export.
pub trait SlaArchiveWriter {
    /// Error produced by this writer.
    type Error: std::error::Error;

    /// Raster matching the printer display.
    fn create_raster(&self) -> Result<RasterGrayscaleAa, Self::Error>;

    /// Encoder producing this archive's layer image format.
    fn encoder(&self) -> Box<dyn RasterEncoder>;

    /// Write `print` to `path`.
    fn export_print(
        &self,
        path: &Path,
        print: &SlaPrint,
        thumbnails: &[Thumbnail],
    ) -> Result<(), Self::Error>;
}

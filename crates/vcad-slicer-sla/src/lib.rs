#![warn(missing_docs)]

//! Resin (MSLA) printing support for the vcad slicer.
//!
//! This crate holds the pieces every resin archive format shares: the
//! flattened print configuration, the sliced print job, antialiased layer
//! rasterization and the [`SlaArchiveWriter`] contract implemented by the
//! vendor format crates.
//!
//! # Example
//!
//! ```ignore
//! use vcad_slicer_sla::{DisplaySettings, RasterGrayscaleAa, SlaConfig, SlaPrint};
//!
//! let config = SlaConfig::load("printer.toml")?;
//! let mut raster = RasterGrayscaleAa::for_display(&DisplaySettings::from_config(&config))?;
//! let mut print = SlaPrint::new(config);
//!
//! for outline in layer_outlines {
//!     raster.clear();
//!     raster.draw(&outline);
//!     print.push_layer(raster.encode(&*writer.encoder()));
//! }
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod path;
pub mod print;
pub mod raster;

pub use archive::SlaArchiveWriter;
pub use config::{ConfigStore, ConfigValue, DisplaySettings, SlaConfig};
pub use error::{Result, SlaError};
pub use path::Polygon;
pub use print::{PrintStatistics, SlaPrint, Thumbnail};
pub use raster::{
    EncodedRaster, Orientation, PixelDim, RasterEncoder, RasterGrayscaleAa, Resolution, Trafo,
};

pub use nalgebra::Point2;

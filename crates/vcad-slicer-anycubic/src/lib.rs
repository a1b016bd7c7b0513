#![warn(missing_docs)]

//! Anycubic Photon Workshop archive export for the vcad slicer.
//!
//! This crate provides:
//! - The four Photon Workshop format generations (v1, v515, v516, v517)
//!   and the printer file extensions that use them
//! - The `pwimg` run-length layer image codec
//! - Print parameter resolution, including material notes overrides
//! - Byte-exact section layout planning and serialization
//! - Atomic archive export through [`SlaArchiveWriter`](vcad_slicer_sla::SlaArchiveWriter)
//!
//! # Example
//!
//! ```ignore
//! use vcad_slicer_anycubic::AnycubicArchive;
//! use vcad_slicer_sla::{SlaArchiveWriter, SlaConfig, SlaPrint};
//!
//! let config = SlaConfig::load("photon-mono-x.toml")?;
//! let archive = AnycubicArchive::for_format(&config, "pwmx").unwrap();
//!
//! let mut raster = archive.create_raster()?;
//! let mut print = SlaPrint::new(config);
//! for outline in layer_outlines {
//!     raster.clear();
//!     raster.draw(&outline);
//!     print.push_layer(raster.encode(&*archive.encoder()));
//! }
//!
//! archive.export_print("part.pwmx".as_ref(), &print, &thumbnails)?;
//! ```

pub mod archive;
pub mod codec;
pub mod error;
pub mod layout;
pub mod notes;
pub mod params;
pub mod preview;
pub mod sections;
pub mod version;

pub use archive::AnycubicArchive;
pub use codec::{AnycubicRasterEncoder, CODEC_NAME};
pub use error::{AnycubicError, Result};
pub use layout::{Layout, LayoutBuilder, Section, SectionOffsetTable};
pub use notes::{MaterialNotes, PrinterNotes};
pub use params::{ParameterResolver, PrintParams};
pub use preview::{PreviewRecord, PREVIEW_HEIGHT, PREVIEW_WIDTH};
pub use version::{AnycubicFormat, FormatCaps, FormatVersion};

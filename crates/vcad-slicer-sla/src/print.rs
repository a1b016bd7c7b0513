//! SLA print job handed to archive writers.

use serde::{Deserialize, Serialize};

use crate::config::SlaConfig;
use crate::error::{Result, SlaError};
use crate::raster::EncodedRaster;

/// Material usage computed by the slicer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintStatistics {
    /// Resin used by the model itself (mm³).
    pub objects_used_material: f64,
    /// Resin used by supports and pad (mm³).
    pub support_used_material: f64,
}

impl PrintStatistics {
    /// Total resin volume (mm³).
    pub fn total_material(&self) -> f64 {
        self.objects_used_material + self.support_used_material
    }
}

/// RGBA8 preview image. Rows are stored bottom-to-top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Width (px).
    pub width: u32,
    /// Height (px).
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl Thumbnail {
    /// Create a thumbnail, checking the buffer length.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(SlaError::InvalidRaster(format!(
                "thumbnail {width}x{height} needs {expected} bytes, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Solid-color thumbnail.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self {
            width,
            height,
            pixels,
        }
    }
}

/// A sliced resin print: configuration plus one encoded image per layer.
#[derive(Debug, Clone, Default)]
pub struct SlaPrint {
    /// Flattened printer, material and print configuration.
    pub config: SlaConfig,
    /// Encoded layer images, bottom layer first.
    pub layers: Vec<EncodedRaster>,
    /// Material usage.
    pub statistics: PrintStatistics,
    /// Model bounding box min corner (mm).
    pub bounds_min: [f64; 3],
    /// Model bounding box max corner (mm).
    pub bounds_max: [f64; 3],
}

impl SlaPrint {
    /// Create an empty print for a configuration.
    pub fn new(config: SlaConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Append an encoded layer.
    pub fn push_layer(&mut self, layer: EncodedRaster) {
        self.layers.push(layer);
    }

    /// Set material statistics.
    pub fn with_statistics(mut self, statistics: PrintStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Set the model bounding box.
    pub fn with_bounds(mut self, min: [f64; 3], max: [f64; 3]) -> Self {
        self.bounds_min = min;
        self.bounds_max = max;
        self
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Model extent along X, Y and Z (mm). Zero for an unset box.
    pub fn model_size(&self) -> [f64; 3] {
        [0usize, 1, 2].map(|i| (self.bounds_max[i] - self.bounds_min[i]).max(0.0))
    }
}

//! Grayscale antialiased rasterization of layer outlines.
//!
//! Outlines arrive in display millimetres (landscape frame, origin at the
//! bottom-left corner of the LCD). The raster itself is stored top-down,
//! one byte per pixel, and is handed to a [`RasterEncoder`] to produce the
//! bytes a printer archive stores for the layer.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigValue, DisplaySettings};
use crate::error::{Result, SlaError};
use crate::path::Polygon;

/// Subsamples per pixel along each axis.
const SAMPLES: usize = 4;

/// How the display is mounted relative to the build plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Long side along X.
    #[default]
    Landscape,
    /// Long side along Y; the image is rotated by 90 degrees.
    Portrait,
}

impl Orientation {
    /// Parse `"landscape"` / `"portrait"` or the numeric form (0 / 1).
    pub fn from_config_value(value: &ConfigValue) -> Option<Self> {
        match value {
            ConfigValue::String(s) => match s.to_ascii_lowercase().as_str() {
                "landscape" => Some(Orientation::Landscape),
                "portrait" => Some(Orientation::Portrait),
                _ => None,
            },
            ConfigValue::Int(0) => Some(Orientation::Landscape),
            ConfigValue::Int(1) => Some(Orientation::Portrait),
            _ => None,
        }
    }
}

/// Raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Pixel columns.
    pub width_px: usize,
    /// Pixel rows.
    pub height_px: usize,
}

impl Resolution {
    /// Create a resolution.
    pub fn new(width_px: usize, height_px: usize) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    /// Total pixel count.
    pub fn pixels(&self) -> usize {
        self.width_px * self.height_px
    }
}

/// Physical size of one pixel (mm).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelDim {
    /// Pixel width (mm).
    pub w_mm: f64,
    /// Pixel height (mm).
    pub h_mm: f64,
}

/// Mapping from display millimetres to raster pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trafo {
    /// Display orientation.
    pub orientation: Orientation,
    /// Mirror along X.
    pub mirror_x: bool,
    /// Mirror along Y.
    pub mirror_y: bool,
}

impl Trafo {
    /// Create a transformation.
    pub fn new(orientation: Orientation, mirror_x: bool, mirror_y: bool) -> Self {
        Self {
            orientation,
            mirror_x,
            mirror_y,
        }
    }

    /// Map a point to pixel coordinates (origin top-left, rows downward).
    fn apply(&self, p: Point2<f64>, res: Resolution, pxdim: PixelDim) -> (f64, f64) {
        let (x, y) = match self.orientation {
            Orientation::Landscape => (p.x, p.y),
            Orientation::Portrait => (p.y, p.x),
        };
        let mut px = x / pxdim.w_mm;
        let mut py = y / pxdim.h_mm;

        // Swapping axes mirrors the image, undo that so portrait is a rotation.
        let mirror_x = self.mirror_x ^ (self.orientation == Orientation::Portrait);
        if mirror_x {
            px = res.width_px as f64 - px;
        }
        if !self.mirror_y {
            py = res.height_px as f64 - py;
        }
        (px, py)
    }
}

/// A compressed layer image together with the codec that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedRaster {
    data: Vec<u8>,
    extension: String,
}

impl EncodedRaster {
    /// Wrap encoded bytes.
    pub fn new(data: Vec<u8>, extension: impl Into<String>) -> Self {
        Self {
            data,
            extension: extension.into(),
        }
    }

    /// Encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoded size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Is the encoded buffer empty?
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Codec identifier (e.g. `"png"`, `"pwimg"`).
    pub fn extension(&self) -> &str {
        &self.extension
    }
}

/// Turns a raw pixel buffer into an archive-specific byte stream.
pub trait RasterEncoder {
    /// Encode `width * height * num_components` bytes, row-major.
    fn encode(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        num_components: usize,
    ) -> EncodedRaster;
}

impl<F> RasterEncoder for F
where
    F: Fn(&[u8], usize, usize, usize) -> EncodedRaster,
{
    fn encode(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        num_components: usize,
    ) -> EncodedRaster {
        self(pixels, width, height, num_components)
    }
}

/// Polygon edge in pixel space, ordered so `y0 < y1`.
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    dir: i32,
}

impl Edge {
    fn new((ax, ay): (f64, f64), (bx, by): (f64, f64)) -> Option<Self> {
        if ay == by {
            return None;
        }
        Some(if ay < by {
            Edge {
                x0: ax,
                y0: ay,
                x1: bx,
                y1: by,
                dir: 1,
            }
        } else {
            Edge {
                x0: bx,
                y0: by,
                x1: ax,
                y1: ay,
                dir: -1,
            }
        })
    }

    /// X where the scanline at `y` crosses this edge. Half-open in Y.
    fn crossing(&self, y: f64) -> Option<f64> {
        if y < self.y0 || y >= self.y1 {
            return None;
        }
        Some(self.x0 + (y - self.y0) * (self.x1 - self.x0) / (self.y1 - self.y0))
    }
}

/// 8-bit grayscale raster with supersampled antialiasing.
#[derive(Debug, Clone)]
pub struct RasterGrayscaleAa {
    resolution: Resolution,
    pixdim: PixelDim,
    trafo: Trafo,
    gamma: f64,
    pixels: Vec<u8>,
}

impl RasterGrayscaleAa {
    /// Create a blank raster.
    pub fn new(resolution: Resolution, pixdim: PixelDim, gamma: f64, trafo: Trafo) -> Result<Self> {
        if resolution.pixels() == 0 {
            return Err(SlaError::InvalidRaster("resolution must be non-zero".into()));
        }
        if pixdim.w_mm <= 0.0 || pixdim.h_mm <= 0.0 {
            return Err(SlaError::InvalidRaster("pixel size must be positive".into()));
        }
        if !(gamma >= 0.0 && gamma.is_finite()) {
            return Err(SlaError::InvalidRaster("gamma must be zero or positive".into()));
        }
        Ok(Self {
            resolution,
            pixdim,
            trafo,
            gamma,
            pixels: vec![0; resolution.pixels()],
        })
    }

    /// Create a raster for a printer display. Portrait displays swap
    /// their physical size and pixel counts.
    pub fn for_display(display: &DisplaySettings) -> Result<Self> {
        display.validate()?;

        let (mut w, mut h) = (display.width_mm, display.height_mm);
        let (mut pw, mut ph) = (display.pixels_x, display.pixels_y);
        if display.orientation == Orientation::Portrait {
            std::mem::swap(&mut w, &mut h);
            std::mem::swap(&mut pw, &mut ph);
        }

        Self::new(
            Resolution::new(pw, ph),
            PixelDim {
                w_mm: w / pw as f64,
                h_mm: h / ph as f64,
            },
            display.gamma,
            Trafo::new(display.orientation, display.mirror_x, display.mirror_y),
        )
    }

    /// Raster size.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Pixel size.
    pub fn pixel_dim(&self) -> PixelDim {
        self.pixdim
    }

    /// Row-major pixel buffer, top row first.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel value at column `x`, row `y`.
    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * self.resolution.width_px + x]
    }

    /// Reset every pixel to black.
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Fill a shape (contours and holes) using non-zero winding.
    ///
    /// Pixels already lit by earlier calls keep the brighter value.
    pub fn draw(&mut self, shape: &[Polygon]) {
        let (res, pxdim, trafo) = (self.resolution, self.pixdim, self.trafo);
        let edges: Vec<Edge> = shape
            .iter()
            .filter(|p| p.len() >= 3 && self.overlaps(p))
            .flat_map(|p| p.edges())
            .filter_map(|(a, b)| Edge::new(trafo.apply(a, res, pxdim), trafo.apply(b, res, pxdim)))
            .collect();
        if edges.is_empty() {
            return;
        }

        let top = edges.iter().map(|e| e.y0).fold(f64::INFINITY, f64::min).max(0.0);
        let bottom = edges
            .iter()
            .map(|e| e.y1)
            .fold(f64::NEG_INFINITY, f64::max)
            .min(res.height_px as f64);
        if top >= bottom {
            return;
        }

        let width = res.width_px;
        let mut coverage = vec![0u16; width];
        let mut crossings: Vec<(f64, i32)> = Vec::new();

        for row in (top.floor() as usize)..(bottom.ceil() as usize).min(res.height_px) {
            coverage.fill(0);
            let mut touched = false;

            for sub in 0..SAMPLES {
                let y = row as f64 + (sub as f64 + 0.5) / SAMPLES as f64;
                crossings.clear();
                crossings.extend(edges.iter().filter_map(|e| e.crossing(y).map(|x| (x, e.dir))));
                if crossings.is_empty() {
                    continue;
                }
                crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut winding = 0;
                let mut span_start = 0.0;
                for &(x, dir) in &crossings {
                    let was_inside = winding != 0;
                    winding += dir;
                    if !was_inside && winding != 0 {
                        span_start = x;
                    } else if was_inside && winding == 0 {
                        touched |= accumulate_span(&mut coverage, span_start, x);
                    }
                }
            }

            if !touched {
                continue;
            }
            let line = &mut self.pixels[row * width..(row + 1) * width];
            for (px, &count) in line.iter_mut().zip(&coverage) {
                if count > 0 {
                    *px = (*px).max(shade(count, self.gamma));
                }
            }
        }
    }

    /// Does the bounding box of `polygon` reach into the raster?
    fn overlaps(&self, polygon: &Polygon) -> bool {
        let Some((min, max)) = polygon.bounds() else {
            return false;
        };
        let (res, pxdim) = (self.resolution, self.pixdim);
        // axis-aligned mapping: the box corners stay box corners
        let (ax, ay) = self.trafo.apply(min, res, pxdim);
        let (bx, by) = self.trafo.apply(max, res, pxdim);
        ax.max(bx) > 0.0
            && ax.min(bx) < res.width_px as f64
            && ay.max(by) > 0.0
            && ay.min(by) < res.height_px as f64
    }

    /// Hand the pixel buffer to an encoder.
    pub fn encode(&self, encoder: &dyn RasterEncoder) -> EncodedRaster {
        encoder.encode(
            &self.pixels,
            self.resolution.width_px,
            self.resolution.height_px,
            1,
        )
    }
}

/// Count the subsamples of one scanline that fall in `[x0, x1)`.
fn accumulate_span(coverage: &mut [u16], x0: f64, x1: f64) -> bool {
    let scale = SAMPLES as f64;
    let limit = (coverage.len() * SAMPLES) as f64;
    // Sample i sits at (i + 0.5) / SAMPLES.
    let first = (x0 * scale - 0.5).ceil().clamp(0.0, limit) as usize;
    let last = (x1 * scale - 0.5).ceil().clamp(0.0, limit) as usize;
    for i in first..last {
        coverage[i / SAMPLES] += 1;
    }
    first < last
}

/// Coverage to gray. Gamma 0 thresholds at half coverage (no antialiasing).
fn shade(count: u16, gamma: f64) -> u8 {
    let fraction = count as f64 / (SAMPLES * SAMPLES) as f64;
    if gamma == 0.0 {
        return if fraction >= 0.5 { 255 } else { 0 };
    }
    (fraction.powf(gamma) * 255.0).round().clamp(0.0, 255.0) as u8
}

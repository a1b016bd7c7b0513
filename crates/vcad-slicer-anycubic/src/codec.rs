//! Layer image run-length codec (`pwimg`).
//!
//! Pixels are 4-bit gray levels kept in the high nibble of a byte. A run of
//! equal pixels is emitted as one code; how long a run may be depends on
//! the pixel value:
//!
//! - solid pixels (`0x0` and `0xF`) use two bytes, `value | len >> 8` and
//!   `len & 0xFF`, for runs of up to 4095 pixels;
//! - gray (antialiased) pixels use one byte, `value | len`, for runs of up
//!   to 15 pixels.
//!
//! Longer runs are split into consecutive codes. Runs continue across row
//! boundaries, the plane is treated as one scanline.

use vcad_slicer_sla::{EncodedRaster, RasterEncoder};

/// Codec identifier attached to encoded layers.
pub const CODEC_NAME: &str = "pwimg";

/// Longest run a solid code can hold.
pub const SOLID_MAX_RUN: usize = 0xFFF;

/// Longest run a gray code can hold.
pub const GRAY_MAX_RUN: usize = 0xF;

/// Is this quantized pixel fully transparent or fully opaque?
pub fn is_solid(value: u8) -> bool {
    value == 0x00 || value == 0xF0
}

/// Drop the low nibble of every 8-bit pixel.
pub fn quantize(pixels: &[u8]) -> Vec<u8> {
    pixels.iter().map(|p| p & 0xF0).collect()
}

/// Run-length encode a quantized plane.
///
/// Only the high nibble of each byte is significant.
pub fn encode_spans(plane: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(plane.len() / 16 + 2);
    let mut rest = plane;

    while let Some(&first) = rest.first() {
        let value = first & 0xF0;
        let max_run = if is_solid(value) {
            SOLID_MAX_RUN
        } else {
            GRAY_MAX_RUN
        };
        let run = rest
            .iter()
            .take(max_run)
            .take_while(|&&p| p & 0xF0 == value)
            .count();

        if is_solid(value) {
            out.push(value | (run >> 8) as u8);
            out.push((run & 0xFF) as u8);
        } else {
            out.push(value | run as u8);
        }
        rest = &rest[run..];
    }

    out
}

/// [`RasterEncoder`] producing Photon Workshop layer images.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnycubicRasterEncoder;

impl RasterEncoder for AnycubicRasterEncoder {
    fn encode(
        &self,
        pixels: &[u8],
        width: usize,
        height: usize,
        num_components: usize,
    ) -> EncodedRaster {
        let expected = width * height * num_components;
        if pixels.len() != expected {
            tracing::warn!(
                expected,
                actual = pixels.len(),
                "layer buffer does not match its dimensions"
            );
        }
        let size = expected.min(pixels.len());
        EncodedRaster::new(encode_spans(&quantize(&pixels[..size])), CODEC_NAME)
    }
}

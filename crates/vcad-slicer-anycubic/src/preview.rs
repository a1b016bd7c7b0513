//! Preview image section.

use vcad_slicer_sla::Thumbnail;

/// Preview width (px).
pub const PREVIEW_WIDTH: u32 = 224;

/// Preview height (px).
pub const PREVIEW_HEIGHT: u32 = 168;

/// Preview resolution (dpi).
pub const PREVIEW_DPI: u32 = 42;

/// Size of the preview pixel buffer: 16 bits per pixel.
pub const PREVIEW_BYTES: usize = (PREVIEW_WIDTH * PREVIEW_HEIGHT * 2) as usize;

/// Fixed-size 16-bit color preview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRecord {
    /// Width (px).
    pub width: u32,
    /// Height (px).
    pub height: u32,
    /// Resolution (dpi).
    pub dpi: u32,
    /// Little-endian 5-6-5 pixels, top row first.
    pub pixels: Vec<u8>,
}

impl Default for PreviewRecord {
    fn default() -> Self {
        Self {
            width: PREVIEW_WIDTH,
            height: PREVIEW_HEIGHT,
            dpi: PREVIEW_DPI,
            pixels: vec![0; PREVIEW_BYTES],
        }
    }
}

impl PreviewRecord {
    /// Build the preview from the first thumbnail.
    ///
    /// A missing thumbnail, or one of the wrong size, leaves the preview
    /// black; export carries on.
    pub fn from_thumbnails(thumbnails: &[Thumbnail]) -> Self {
        let mut preview = Self::default();
        let Some(thumbnail) = thumbnails.first() else {
            return preview;
        };

        if thumbnail.width != PREVIEW_WIDTH
            || thumbnail.height != PREVIEW_HEIGHT
            || thumbnail.pixels.len() != (PREVIEW_WIDTH * PREVIEW_HEIGHT * 4) as usize
        {
            tracing::warn!(
                width = thumbnail.width,
                height = thumbnail.height,
                "incorrect thumbnail size, expected {}x{}; preview left blank",
                PREVIEW_WIDTH,
                PREVIEW_HEIGHT
            );
            return preview;
        }

        convert_rows(&thumbnail.pixels, &mut preview.pixels);
        preview
    }
}

/// Pack one RGBA pixel. Red lands in the low bits, alpha is dropped.
pub fn pack_565(r: u8, g: u8, b: u8) -> u16 {
    ((b as u16 >> 3) << 11) | ((g as u16 >> 2) << 5) | (r as u16 >> 3)
}

/// Thumbnails are stored bottom row first, the preview top row first.
fn convert_rows(rgba: &[u8], dst: &mut [u8]) {
    let src_stride = PREVIEW_WIDTH as usize * 4;
    let dst_stride = PREVIEW_WIDTH as usize * 2;

    for (row, dst_row) in rgba
        .chunks_exact(src_stride)
        .zip(dst.chunks_exact_mut(dst_stride).rev())
    {
        for (px, out) in row.chunks_exact(4).zip(dst_row.chunks_exact_mut(2)) {
            out.copy_from_slice(&pack_565(px[0], px[1], px[2]).to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_red() {
        let thumb = Thumbnail::filled(PREVIEW_WIDTH, PREVIEW_HEIGHT, [255, 0, 0, 255]);
        let preview = PreviewRecord::from_thumbnails(&[thumb]);

        assert_eq!(preview.pixels.len(), PREVIEW_BYTES);
        for px in preview.pixels.chunks_exact(2) {
            assert_eq!(px, &[0x1F, 0x00]);
        }
    }

    #[test]
    fn test_packing() {
        assert_eq!(pack_565(0, 0, 255), 0xF800);
        assert_eq!(pack_565(0, 255, 0), 0x07E0);
        assert_eq!(pack_565(255, 255, 255), 0xFFFF);
        assert_eq!(pack_565(7, 3, 7), 0);
    }

    #[test]
    fn test_rows_are_flipped() {
        let mut thumb = Thumbnail::filled(PREVIEW_WIDTH, PREVIEW_HEIGHT, [0, 0, 0, 255]);
        // First source row (bottom of the image) is white.
        for px in thumb.pixels[..PREVIEW_WIDTH as usize * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&[255, 255, 255, 255]);
        }
        let preview = PreviewRecord::from_thumbnails(&[thumb]);

        let stride = PREVIEW_WIDTH as usize * 2;
        let last_row = &preview.pixels[PREVIEW_BYTES - stride..];
        assert!(last_row.iter().all(|&b| b == 0xFF));
        assert!(preview.pixels[..PREVIEW_BYTES - stride].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_wrong_size_is_blank() {
        let thumb = Thumbnail::filled(100, 100, [255, 255, 255, 255]);
        let preview = PreviewRecord::from_thumbnails(&[thumb]);
        assert_eq!(preview, PreviewRecord::default());
    }

    #[test]
    fn test_only_first_thumbnail_used() {
        let first = Thumbnail::filled(PREVIEW_WIDTH, PREVIEW_HEIGHT, [0, 0, 255, 255]);
        let second = Thumbnail::filled(PREVIEW_WIDTH, PREVIEW_HEIGHT, [255, 0, 0, 255]);
        let preview = PreviewRecord::from_thumbnails(&[first, second]);
        assert_eq!(&preview.pixels[..2], &[0x00, 0xF8]);
        assert_eq!(preview.width, PREVIEW_WIDTH);
        assert_eq!(preview.dpi, PREVIEW_DPI);
    }
}

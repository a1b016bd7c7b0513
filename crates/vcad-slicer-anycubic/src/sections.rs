//! Section records and their binary encoding.
//!
//! Every field is written in a fixed order: little-endian `u16`/`u32`,
//! IEEE-754 `f32`, and NUL-padded fixed-width byte arrays for tags and
//! strings. The only fields that ever come and go are the ones gated by
//! [`FormatCaps`](crate::version::FormatCaps).

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use crate::layout::{Section, SectionOffsetTable};
use crate::preview::{PreviewRecord, PREVIEW_BYTES};
use crate::version::FormatVersion;

/// Length of a section tag.
pub const TAG_LEN: usize = 12;

/// Tag plus payload size field that open most sections.
pub const SECTION_PREFIX_LEN: u32 = TAG_LEN as u32 + 4;

/// Section tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionTag {
    /// File magic, opens the intro.
    Intro,
    /// Print parameters.
    Header,
    /// Preview image.
    Preview,
    /// Layer table.
    Layers,
    /// Extra lift profiles.
    Extra,
    /// Machine description.
    Machine,
    /// Model bounding box.
    Model,
}

impl SectionTag {
    /// ASCII tag text.
    pub const fn name(self) -> &'static str {
        match self {
            SectionTag::Intro => "ANYCUBIC",
            SectionTag::Header => "HEADER",
            SectionTag::Preview => "PREVIEW",
            SectionTag::Layers => "LAYERDEF",
            SectionTag::Extra => "EXTRA",
            SectionTag::Machine => "MACHINE",
            SectionTag::Model => "MODEL",
        }
    }

    /// Tag as written: NUL-padded to [`TAG_LEN`] bytes.
    pub fn bytes(self) -> [u8; TAG_LEN] {
        let mut out = [0u8; TAG_LEN];
        let name = self.name().as_bytes();
        out[..name.len()].copy_from_slice(name);
        out
    }
}

/// Intro size: grows by one offset slot each for machine and model.
pub fn intro_len(version: FormatVersion) -> u32 {
    let caps = version.caps();
    // tag, version, area_num and seven offset slots present in every version
    let mut len = TAG_LEN as u32 + 9 * 4;
    if caps.machine {
        len += 4;
    }
    if caps.model {
        len += 4;
    }
    len
}

/// Header body size with every optional field present.
const HEADER_BODY_LEN: u32 = 92;

/// Print-wide parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRecord {
    /// Pixel pitch (µm).
    pub pixel_size_um: f32,
    /// Layer height (mm).
    pub layer_height_mm: f32,
    /// Normal layer exposure (s).
    pub exposure_time_s: f32,
    /// Wait before each exposure (s).
    pub delay_before_exposure_s: f32,
    /// Bottom layer exposure (s).
    pub bottom_exposure_time_s: f32,
    /// Number of bottom layers, never more than the layer count.
    pub bottom_layer_count: u32,
    /// Lift distance (mm).
    pub lift_distance_mm: f32,
    /// Lift speed (mm/s).
    pub lift_speed_mms: f32,
    /// Retract speed (mm/s).
    pub retract_speed_mms: f32,
    /// Resin volume (ml).
    pub volume_ml: f32,
    /// Antialiasing enabled (0 / 1).
    pub antialiasing: u32,
    /// Horizontal resolution (px).
    pub res_x: u32,
    /// Vertical resolution (px).
    pub res_y: u32,
    /// Resin weight (g).
    pub weight_g: f32,
    /// Resin price.
    pub price: f32,
    /// Currency symbol as a character code.
    pub price_currency: u32,
    /// Per-layer parameter override flag.
    pub per_layer_override: u32,
    /// Estimated print time (s).
    pub print_time_s: u32,
    /// Transition layer count.
    pub transition_layer_count: u32,
    /// Transition layer type.
    pub transition_layer_type: u32,
    /// Advanced mode flag (v516+).
    pub advanced_mode: u32,
    /// Gray level (v517+).
    pub gray: u16,
    /// Blur level (v517+).
    pub blur_level: u16,
    /// Resin code (v517+).
    pub resin_code: u32,
}

impl HeaderRecord {
    /// Declared payload size: the full body minus fields `version` lacks.
    pub fn payload_size(version: FormatVersion) -> u32 {
        let caps = version.caps();
        let mut size = HEADER_BODY_LEN;
        if !caps.header_advanced_mode {
            size -= 4;
        }
        if !caps.header_gray_levels {
            size -= 2 + 2 + 4;
        }
        size
    }

    /// Bytes written for this section.
    pub fn encoded_len(version: FormatVersion) -> u32 {
        SECTION_PREFIX_LEN + Self::payload_size(version)
    }
}

/// Preview payload: width, dpi, height and the pixels.
pub const PREVIEW_PAYLOAD_LEN: u32 = 12 + PREVIEW_BYTES as u32;

/// Bytes written for the preview section.
pub const PREVIEW_LEN: u32 = SECTION_PREFIX_LEN + PREVIEW_PAYLOAD_LEN;

/// Gray levels in the layer color table.
pub const GREY_LEVELS: usize = 16;

/// Grayscale lookup table (v515+). The section has no tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTableRecord {
    /// Use all gray levels.
    pub use_full_grayscale: u32,
    /// Output value of each 4-bit level.
    pub grey: [u8; GREY_LEVELS],
    /// Trailing reserved word.
    pub unknown: u32,
}

impl ColorTableRecord {
    /// Bytes written for this section.
    pub const ENCODED_LEN: u32 = 4 + 4 + GREY_LEVELS as u32 + 4;
}

impl Default for ColorTableRecord {
    /// Identity table: level `n` maps to `n << 4 | 0xF`.
    fn default() -> Self {
        let mut grey = [0u8; GREY_LEVELS];
        for (level, value) in grey.iter_mut().enumerate() {
            *value = ((level as u8) << 4) | 0x0F;
        }
        Self {
            use_full_grayscale: 0,
            grey,
            unknown: 0,
        }
    }
}

/// Layer table header: tag, payload size, layer count.
pub const LAYERS_HEADER_LEN: u32 = SECTION_PREFIX_LEN + 4;

/// Per-layer record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerRecord {
    /// Absolute file offset of the layer image.
    pub image_offset: u32,
    /// Encoded image size.
    pub image_size: u32,
    /// Lift distance (mm).
    pub lift_distance_mm: f32,
    /// Lift speed (mm/s).
    pub lift_speed_mms: f32,
    /// Exposure (s).
    pub exposure_time_s: f32,
    /// Layer height (mm).
    pub layer_height_mm: f32,
}

impl LayerRecord {
    /// Bytes written per layer, including two reserved words.
    pub const ENCODED_LEN: u32 = 32;
}

/// Bytes written for the layer table with `layer_count` records.
pub fn layers_len(layer_count: u32) -> u64 {
    LAYERS_HEADER_LEN as u64 + LayerRecord::ENCODED_LEN as u64 * layer_count as u64
}

/// One lift / retract movement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LiftProfile {
    /// Lift distance (mm).
    pub lift_distance_mm: f32,
    /// Lift speed (mm/s).
    pub lift_speed_mms: f32,
    /// Retract speed (mm/s).
    pub retract_speed_mms: f32,
}

/// Two-stage lift profiles for bottom and normal layers (v516+).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtraRecord {
    /// Bottom layer stages.
    pub bottom: [LiftProfile; 2],
    /// Normal layer stages.
    pub normal: [LiftProfile; 2],
}

impl ExtraRecord {
    /// Payload size field as found in printer-produced files.
    pub const PAYLOAD_SIZE: u32 = 24;
    /// Bytes written for this section.
    pub const ENCODED_LEN: u32 = SECTION_PREFIX_LEN + 4 + 6 * 4 + 4 + 6 * 4;
}

/// Machine description (v516+).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineRecord {
    /// Printer name.
    pub name: String,
    /// Layer image format name.
    pub image_format: String,
    /// Build volume X (mm).
    pub volume_x: f32,
    /// Build volume Y (mm).
    pub volume_y: f32,
    /// Build volume Z (mm).
    pub volume_z: f32,
    /// File format version.
    pub version: u32,
}

impl MachineRecord {
    /// Width of the name field.
    pub const NAME_LEN: usize = 96;
    /// Width of the image format field.
    pub const IMAGE_FORMAT_LEN: usize = 24;
    /// Trailing word seen in printer-produced files.
    pub const TRAILER: u32 = 0x0063_4701;
    /// Payload size.
    pub const PAYLOAD_LEN: u32 = (Self::NAME_LEN + Self::IMAGE_FORMAT_LEN) as u32 + 3 * 4 + 4 + 4;
    /// Bytes written for this section.
    pub const ENCODED_LEN: u32 = SECTION_PREFIX_LEN + Self::PAYLOAD_LEN;
}

/// Producing software (v517+). Opens with its name instead of a tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoftwareRecord {
    /// Software name.
    pub name: String,
    /// Software version.
    pub version: String,
    /// Operating system.
    pub operating_system: String,
    /// Graphics API version.
    pub graphics_api: String,
}

impl SoftwareRecord {
    /// Width of the name and version fields.
    pub const NAME_LEN: usize = 32;
    /// Width of the operating system field.
    pub const OS_LEN: usize = 64;
    /// Width of the graphics API field.
    pub const GRAPHICS_API_LEN: usize = 32;
    /// Bytes written for this section; also its declared payload size.
    pub const ENCODED_LEN: u32 =
        (Self::NAME_LEN + 4 + Self::NAME_LEN + Self::OS_LEN + Self::GRAPHICS_API_LEN) as u32;
}

/// Model bounding box and support settings (v517+).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelRecord {
    /// Bounding box min corner (mm).
    pub min: [f32; 3],
    /// Bounding box max corner (mm).
    pub max: [f32; 3],
    /// Supports generated (0 / 1).
    pub supports_enabled: u32,
    /// Support density (0..1).
    pub supports_density: f32,
}

impl ModelRecord {
    /// Payload size.
    pub const PAYLOAD_LEN: u32 = 6 * 4 + 4 + 4;
    /// Bytes written for this section.
    pub const ENCODED_LEN: u32 = SECTION_PREFIX_LEN + Self::PAYLOAD_LEN;
}

/// Writes section records for one format version.
pub struct SectionWriter<W: Write> {
    writer: W,
    version: FormatVersion,
}

impl<W: Write> SectionWriter<W> {
    /// Create a writer for `version`.
    pub fn new(writer: W, version: FormatVersion) -> Self {
        Self { writer, version }
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the writer and return the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Write the intro: magic, version, section count and offset table.
    pub fn write_intro(&mut self, table: &SectionOffsetTable) -> io::Result<()> {
        let caps = self.version.caps();
        self.put_tag(SectionTag::Intro)?;
        self.put_u32(self.version.number())?;
        self.put_u32(table.area_num())?;
        self.put_u32(table.offset(Section::Header))?;
        self.put_u32(table.offset(Section::Software))?;
        self.put_u32(table.offset(Section::Preview))?;
        self.put_u32(table.offset(Section::LayerColor))?;
        self.put_u32(table.offset(Section::Layers))?;
        self.put_u32(table.offset(Section::Extra))?;
        if caps.machine {
            self.put_u32(table.offset(Section::Machine))?;
        }
        if caps.model {
            self.put_u32(table.offset(Section::Model))?;
        }
        self.put_u32(table.offset(Section::ImageData))
    }

    /// Write the header, dropping fields newer than the target version.
    pub fn write_header(&mut self, h: &HeaderRecord) -> io::Result<()> {
        let caps = self.version.caps();
        self.put_tag(SectionTag::Header)?;
        self.put_u32(HeaderRecord::payload_size(self.version))?;
        self.put_f32(h.pixel_size_um)?;
        self.put_f32(h.layer_height_mm)?;
        self.put_f32(h.exposure_time_s)?;
        self.put_f32(h.delay_before_exposure_s)?;
        self.put_f32(h.bottom_exposure_time_s)?;
        self.put_f32(h.bottom_layer_count as f32)?;
        self.put_f32(h.lift_distance_mm)?;
        self.put_f32(h.lift_speed_mms)?;
        self.put_f32(h.retract_speed_mms)?;
        self.put_f32(h.volume_ml)?;
        self.put_u32(h.antialiasing)?;
        self.put_u32(h.res_x)?;
        self.put_u32(h.res_y)?;
        self.put_f32(h.weight_g)?;
        self.put_f32(h.price)?;
        self.put_u32(h.price_currency)?;
        self.put_u32(h.per_layer_override)?;
        self.put_u32(h.print_time_s)?;
        self.put_u32(h.transition_layer_count)?;
        self.put_u32(h.transition_layer_type)?;
        if caps.header_advanced_mode {
            self.put_u32(h.advanced_mode)?;
        }
        if caps.header_gray_levels {
            self.put_u16(h.gray)?;
            self.put_u16(h.blur_level)?;
            self.put_u32(h.resin_code)?;
        }
        Ok(())
    }

    /// Write the preview section.
    pub fn write_preview(&mut self, p: &PreviewRecord) -> io::Result<()> {
        self.put_tag(SectionTag::Preview)?;
        self.put_u32(PREVIEW_PAYLOAD_LEN)?;
        self.put_u32(p.width)?;
        self.put_u32(p.dpi)?;
        self.put_u32(p.height)?;
        let mut pixels = [0u8; PREVIEW_BYTES];
        let n = p.pixels.len().min(PREVIEW_BYTES);
        pixels[..n].copy_from_slice(&p.pixels[..n]);
        self.writer.write_all(&pixels)
    }

    /// Write the grayscale lookup table.
    pub fn write_layer_color(&mut self, c: &ColorTableRecord) -> io::Result<()> {
        self.put_u32(c.use_full_grayscale)?;
        self.put_u32(GREY_LEVELS as u32)?;
        self.writer.write_all(&c.grey)?;
        self.put_u32(c.unknown)
    }

    /// Write the layer table header.
    pub fn write_layers_header(&mut self, layer_count: u32) -> io::Result<()> {
        self.put_tag(SectionTag::Layers)?;
        self.put_u32(4 + LayerRecord::ENCODED_LEN * layer_count)?;
        self.put_u32(layer_count)
    }

    /// Write one layer record.
    pub fn write_layer(&mut self, l: &LayerRecord) -> io::Result<()> {
        self.put_u32(l.image_offset)?;
        self.put_u32(l.image_size)?;
        self.put_f32(l.lift_distance_mm)?;
        self.put_f32(l.lift_speed_mms)?;
        self.put_f32(l.exposure_time_s)?;
        self.put_f32(l.layer_height_mm)?;
        // reserved
        self.put_f32(0.0)?;
        self.put_f32(0.0)
    }

    /// Write the extra lift profiles.
    pub fn write_extra(&mut self, e: &ExtraRecord) -> io::Result<()> {
        self.put_tag(SectionTag::Extra)?;
        self.put_u32(ExtraRecord::PAYLOAD_SIZE)?;
        self.put_u32(e.bottom.len() as u32)?;
        for stage in &e.bottom {
            self.put_lift_profile(stage)?;
        }
        self.put_u32(e.normal.len() as u32)?;
        for stage in &e.normal {
            self.put_lift_profile(stage)?;
        }
        Ok(())
    }

    /// Write the machine description.
    pub fn write_machine(&mut self, m: &MachineRecord) -> io::Result<()> {
        self.put_tag(SectionTag::Machine)?;
        self.put_u32(MachineRecord::PAYLOAD_LEN)?;
        self.put_str(&m.name, MachineRecord::NAME_LEN)?;
        self.put_str(&m.image_format, MachineRecord::IMAGE_FORMAT_LEN)?;
        self.put_f32(m.volume_x)?;
        self.put_f32(m.volume_y)?;
        self.put_f32(m.volume_z)?;
        self.put_u32(m.version)?;
        self.put_u32(MachineRecord::TRAILER)
    }

    /// Write the software description.
    pub fn write_software(&mut self, s: &SoftwareRecord) -> io::Result<()> {
        self.put_str(&s.name, SoftwareRecord::NAME_LEN)?;
        self.put_u32(SoftwareRecord::ENCODED_LEN)?;
        self.put_str(&s.version, SoftwareRecord::NAME_LEN)?;
        self.put_str(&s.operating_system, SoftwareRecord::OS_LEN)?;
        self.put_str(&s.graphics_api, SoftwareRecord::GRAPHICS_API_LEN)
    }

    /// Write the model description.
    pub fn write_model(&mut self, m: &ModelRecord) -> io::Result<()> {
        self.put_tag(SectionTag::Model)?;
        self.put_u32(ModelRecord::PAYLOAD_LEN)?;
        for v in m.min.iter().chain(&m.max) {
            self.put_f32(*v)?;
        }
        self.put_u32(m.supports_enabled)?;
        self.put_f32(m.supports_density)
    }

    /// Append encoded layer image bytes.
    pub fn write_image_data(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data)
    }

    fn put_lift_profile(&mut self, p: &LiftProfile) -> io::Result<()> {
        self.put_f32(p.lift_distance_mm)?;
        self.put_f32(p.lift_speed_mms)?;
        self.put_f32(p.retract_speed_mms)
    }

    fn put_tag(&mut self, tag: SectionTag) -> io::Result<()> {
        self.writer.write_all(&tag.bytes())
    }

    /// NUL-padded fixed-width string, always NUL-terminated.
    fn put_str(&mut self, s: &str, len: usize) -> io::Result<()> {
        let mut field = vec![0u8; len];
        let bytes = s.as_bytes();
        let n = bytes.len().min(len - 1);
        field[..n].copy_from_slice(&bytes[..n]);
        self.writer.write_all(&field)
    }

    fn put_u16(&mut self, v: u16) -> io::Result<()> {
        self.writer.write_u16::<LittleEndian>(v)
    }

    fn put_u32(&mut self, v: u32) -> io::Result<()> {
        self.writer.write_u32::<LittleEndian>(v)
    }

    fn put_f32(&mut self, v: f32) -> io::Result<()> {
        self.writer.write_f32::<LittleEndian>(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutBuilder;

    fn writer(version: FormatVersion) -> SectionWriter<Vec<u8>> {
        SectionWriter::new(Vec::new(), version)
    }

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
    }

    #[test]
    fn test_tags_are_padded() {
        assert_eq!(&SectionTag::Intro.bytes(), b"ANYCUBIC\0\0\0\0");
        assert_eq!(&SectionTag::Layers.bytes(), b"LAYERDEF\0\0\0\0");
        assert_eq!(&SectionTag::Machine.bytes(), b"MACHINE\0\0\0\0\0");
        assert_eq!(&SectionTag::Model.bytes(), b"MODEL\0\0\0\0\0\0\0");
    }

    #[test]
    fn test_header_payload_matches_body() {
        let header = HeaderRecord {
            layer_height_mm: 0.05,
            bottom_layer_count: 6,
            ..Default::default()
        };
        for version in FormatVersion::ALL {
            let mut w = writer(version);
            w.write_header(&header).unwrap();
            let buf = w.into_inner();

            assert_eq!(buf.len() as u32, HeaderRecord::encoded_len(version), "{version}");
            assert_eq!(u32_at(&buf, TAG_LEN), HeaderRecord::payload_size(version));
            assert_eq!(buf.len() as u32 - SECTION_PREFIX_LEN, HeaderRecord::payload_size(version));
        }
        assert_eq!(HeaderRecord::payload_size(FormatVersion::V1), 80);
        assert_eq!(HeaderRecord::payload_size(FormatVersion::V515), 80);
        assert_eq!(HeaderRecord::payload_size(FormatVersion::V516), 84);
        assert_eq!(HeaderRecord::payload_size(FormatVersion::V517), 92);
    }

    #[test]
    fn test_header_field_order() {
        let header = HeaderRecord {
            pixel_size_um: 50.0,
            bottom_layer_count: 6,
            res_x: 3840,
            price_currency: '$' as u32,
            ..Default::default()
        };
        let mut w = writer(FormatVersion::V1);
        w.write_header(&header).unwrap();
        let buf = w.into_inner();

        assert_eq!(&buf[16..20], &50.0f32.to_le_bytes());
        assert_eq!(&buf[36..40], &6.0f32.to_le_bytes());
        assert_eq!(u32_at(&buf, 16 + 44), 3840);
        assert_eq!(u32_at(&buf, 16 + 60), 0x24);
    }

    fn f32_at(buf: &[u8], at: usize) -> f32 {
        f32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
    }

    fn profile(n: f32) -> LiftProfile {
        LiftProfile {
            lift_distance_mm: n,
            lift_speed_mms: n + 0.25,
            retract_speed_mms: n + 0.5,
        }
    }

    #[test]
    fn test_extra_field_order() {
        let extra = ExtraRecord {
            bottom: [profile(1.0), profile(2.0)],
            normal: [profile(3.0), profile(4.0)],
        };
        let mut w = writer(FormatVersion::V516);
        w.write_extra(&extra).unwrap();
        let buf = w.into_inner();

        assert_eq!(&buf[..TAG_LEN], &SectionTag::Extra.bytes());
        assert_eq!(u32_at(&buf, 12), ExtraRecord::PAYLOAD_SIZE);
        assert_eq!(u32_at(&buf, 16), 2);
        assert_eq!(u32_at(&buf, 44), 2);
        // stage n starts with its distance, then lift and retract speed
        for (n, at) in [(1.0, 20), (2.0, 32), (3.0, 48), (4.0, 60)] {
            assert_eq!(f32_at(&buf, at), n);
            assert_eq!(f32_at(&buf, at + 4), n + 0.25);
            assert_eq!(f32_at(&buf, at + 8), n + 0.5);
        }
    }

    #[test]
    fn test_model_field_order() {
        let model = ModelRecord {
            min: [-10.0, -5.0, 0.0],
            max: [10.0, 5.0, 7.5],
            supports_enabled: 1,
            supports_density: 0.8,
        };
        let mut w = writer(FormatVersion::V517);
        w.write_model(&model).unwrap();
        let buf = w.into_inner();

        assert_eq!(&buf[..TAG_LEN], &SectionTag::Model.bytes());
        assert_eq!(u32_at(&buf, 12), ModelRecord::PAYLOAD_LEN);
        let floats: Vec<f32> = (0..6).map(|i| f32_at(&buf, 16 + 4 * i)).collect();
        assert_eq!(floats, vec![-10.0, -5.0, 0.0, 10.0, 5.0, 7.5]);
        assert_eq!(u32_at(&buf, 40), 1);
        assert_eq!(f32_at(&buf, 44), 0.8);
    }

    #[test]
    fn test_software_field_order() {
        let software = SoftwareRecord {
            name: "vcad".into(),
            version: "0.8.0".into(),
            operating_system: "linux".into(),
            graphics_api: "3.3-CoreProfile".into(),
        };
        let mut w = writer(FormatVersion::V517);
        w.write_software(&software).unwrap();
        let buf = w.into_inner();

        // no tag: the name comes first, then the payload size
        assert_eq!(&buf[..5], b"vcad\0");
        assert_eq!(u32_at(&buf, 32), SoftwareRecord::ENCODED_LEN);
        assert_eq!(&buf[36..42], b"0.8.0\0");
        assert_eq!(&buf[68..74], b"linux\0");
        assert_eq!(&buf[132..148], b"3.3-CoreProfile\0");
    }

    #[test]
    fn test_fixed_section_sizes() {
        let mut w = writer(FormatVersion::V517);
        w.write_preview(&PreviewRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, PREVIEW_LEN);

        let mut w = writer(FormatVersion::V517);
        w.write_layer_color(&ColorTableRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, ColorTableRecord::ENCODED_LEN);
        assert_eq!(ColorTableRecord::ENCODED_LEN, 28);

        let mut w = writer(FormatVersion::V517);
        w.write_layers_header(3).unwrap();
        for _ in 0..3 {
            w.write_layer(&LayerRecord::default()).unwrap();
        }
        assert_eq!(w.get_ref().len() as u64, layers_len(3));
        assert_eq!(u32_at(w.get_ref(), TAG_LEN), 4 + 3 * 32);

        let mut w = writer(FormatVersion::V517);
        w.write_extra(&ExtraRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, ExtraRecord::ENCODED_LEN);

        let mut w = writer(FormatVersion::V517);
        w.write_machine(&MachineRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, MachineRecord::ENCODED_LEN);
        assert_eq!(MachineRecord::PAYLOAD_LEN, 140);

        let mut w = writer(FormatVersion::V517);
        w.write_software(&SoftwareRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, SoftwareRecord::ENCODED_LEN);
        assert_eq!(SoftwareRecord::ENCODED_LEN, 164);

        let mut w = writer(FormatVersion::V517);
        w.write_model(&ModelRecord::default()).unwrap();
        assert_eq!(w.get_ref().len() as u32, ModelRecord::ENCODED_LEN);
    }

    #[test]
    fn test_intro_size_per_version() {
        for version in FormatVersion::ALL {
            let layout = LayoutBuilder::new(version).build().unwrap();
            let mut w = writer(version);
            w.write_intro(layout.table()).unwrap();
            assert_eq!(w.get_ref().len() as u32, intro_len(version), "{version}");
        }
        assert_eq!(intro_len(FormatVersion::V1), 48);
        assert_eq!(intro_len(FormatVersion::V516), 52);
        assert_eq!(intro_len(FormatVersion::V517), 56);
    }

    #[test]
    fn test_color_table() {
        let table = ColorTableRecord::default();
        assert_eq!(table.grey[0], 15);
        assert_eq!(table.grey[1], 31);
        assert_eq!(table.grey[15], 255);
    }

    #[test]
    fn test_strings_truncate_and_pad() {
        let machine = MachineRecord {
            name: "X".repeat(200),
            image_format: "pw0Img".into(),
            ..Default::default()
        };
        let mut w = writer(FormatVersion::V516);
        w.write_machine(&machine).unwrap();
        let buf = w.into_inner();

        let name = &buf[16..16 + MachineRecord::NAME_LEN];
        assert!(name[..95].iter().all(|&b| b == b'X'));
        assert_eq!(name[95], 0);
        let format = &buf[16 + 96..16 + 96 + 24];
        assert_eq!(&format[..7], b"pw0Img\0");
        assert_eq!(u32_at(&buf, buf.len() - 4), MachineRecord::TRAILER);
    }
}

//! Section layout planning.
//!
//! Offsets are computed once, before any byte is written, from the
//! encoded size of every present section. The serializer then checks its
//! position against the plan at each section boundary.

use crate::error::{AnycubicError, Result};
use crate::sections::{
    intro_len, layers_len, ColorTableRecord, ExtraRecord, HeaderRecord, MachineRecord,
    ModelRecord, SoftwareRecord, PREVIEW_LEN,
};
use crate::version::FormatVersion;

const SECTION_COUNT: usize = 9;

/// Archive sections, in the order they are laid out after the intro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Print parameters.
    Header,
    /// Preview image.
    Preview,
    /// Grayscale lookup table.
    LayerColor,
    /// Layer table.
    Layers,
    /// Extra lift profiles.
    Extra,
    /// Machine description.
    Machine,
    /// Producing software.
    Software,
    /// Model bounding box.
    Model,
    /// Concatenated layer images.
    ImageData,
}

impl Section {
    /// All sections in layout order.
    pub const ALL: [Section; SECTION_COUNT] = [
        Section::Header,
        Section::Preview,
        Section::LayerColor,
        Section::Layers,
        Section::Extra,
        Section::Machine,
        Section::Software,
        Section::Model,
        Section::ImageData,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    /// Encoded size of this section for `version`. Image data is sized by
    /// its layers and reported as 0 here.
    pub fn encoded_len(self, version: FormatVersion, layer_count: u32) -> u64 {
        match self {
            Section::Header => HeaderRecord::encoded_len(version) as u64,
            Section::Preview => PREVIEW_LEN as u64,
            Section::LayerColor => ColorTableRecord::ENCODED_LEN as u64,
            Section::Layers => layers_len(layer_count),
            Section::Extra => ExtraRecord::ENCODED_LEN as u64,
            Section::Machine => MachineRecord::ENCODED_LEN as u64,
            Section::Software => SoftwareRecord::ENCODED_LEN as u64,
            Section::Model => ModelRecord::ENCODED_LEN as u64,
            Section::ImageData => 0,
        }
    }
}

/// Absolute offset of every section, 0 for sections the version lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionOffsetTable {
    area_num: u32,
    offsets: [u32; SECTION_COUNT],
}

impl SectionOffsetTable {
    /// Section count stored in the intro.
    pub fn area_num(&self) -> u32 {
        self.area_num
    }

    /// Offset of `section`, 0 when absent.
    pub fn offset(&self, section: Section) -> u32 {
        self.offsets[section.index()]
    }

    /// Is `section` present in the file?
    pub fn is_present(&self, section: Section) -> bool {
        self.offset(section) != 0
    }

    /// Present sections and their offsets, in layout order.
    pub fn entries(&self) -> impl Iterator<Item = (Section, u32)> + '_ {
        Section::ALL
            .into_iter()
            .map(|s| (s, self.offset(s)))
            .filter(|(_, offset)| *offset != 0)
    }
}

/// Byte-exact plan of an archive.
#[derive(Debug, Clone)]
pub struct Layout {
    version: FormatVersion,
    table: SectionOffsetTable,
    image_offsets: Vec<u32>,
    image_sizes: Vec<u32>,
    file_len: u64,
}

impl Layout {
    /// Format version this layout was planned for.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Section offsets.
    pub fn table(&self) -> &SectionOffsetTable {
        &self.table
    }

    /// Offset of `section`, 0 when absent.
    pub fn offset(&self, section: Section) -> u32 {
        self.table.offset(section)
    }

    /// Number of layers.
    pub fn layer_count(&self) -> u32 {
        self.image_offsets.len() as u32
    }

    /// Image offset and size of every layer, in layer order.
    pub fn images(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.image_offsets
            .iter()
            .copied()
            .zip(self.image_sizes.iter().copied())
    }

    /// Total file size.
    pub fn file_len(&self) -> u64 {
        self.file_len
    }
}

/// Builds a [`Layout`] from a version and the encoded layer sizes.
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    version: FormatVersion,
    image_sizes: Vec<u64>,
}

impl LayoutBuilder {
    /// Start a layout for `version` with no layers.
    pub fn new(version: FormatVersion) -> Self {
        Self {
            version,
            image_sizes: Vec::new(),
        }
    }

    /// Append one layer image of `size` bytes.
    pub fn layer(mut self, size: usize) -> Self {
        self.image_sizes.push(size as u64);
        self
    }

    /// Append layer images of the given sizes.
    pub fn layers(mut self, sizes: impl IntoIterator<Item = usize>) -> Self {
        self.image_sizes.extend(sizes.into_iter().map(|s| s as u64));
        self
    }

    /// Compute every offset.
    pub fn build(self) -> Result<Layout> {
        let version = self.version;
        let caps = version.caps();
        let layer_count = u32::try_from(self.image_sizes.len()).map_err(|_| {
            AnycubicError::SectionOverflow {
                section: Section::Layers,
                offset: self.image_sizes.len() as u64,
            }
        })?;

        let mut offsets = [0u32; Section::ALL.len()];
        let mut pos = intro_len(version) as u64;
        for section in Section::ALL {
            if !caps.has(section) {
                continue;
            }
            offsets[section.index()] = to_offset(section, pos)?;
            pos += section.encoded_len(version, layer_count);
        }

        let mut image_offsets = Vec::with_capacity(self.image_sizes.len());
        let mut image_sizes = Vec::with_capacity(self.image_sizes.len());
        for size in &self.image_sizes {
            image_offsets.push(to_offset(Section::ImageData, pos)?);
            image_sizes.push(to_offset(Section::ImageData, *size)?);
            pos += size;
        }

        Ok(Layout {
            version,
            table: SectionOffsetTable {
                area_num: caps.area_num,
                offsets,
            },
            image_offsets,
            image_sizes,
            file_len: pos,
        })
    }
}

fn to_offset(section: Section, offset: u64) -> Result<u32> {
    u32::try_from(offset).map_err(|_| AnycubicError::SectionOverflow { section, offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_v1_layout() {
        let layout = LayoutBuilder::new(FormatVersion::V1)
            .layers([10, 20])
            .build()
            .unwrap();
        let table = layout.table();

        assert_eq!(table.area_num(), 4);
        assert_eq!(table.offset(Section::Header), 48);
        assert_eq!(table.offset(Section::Preview), 48 + 96);
        assert_eq!(table.offset(Section::Layers), 48 + 96 + PREVIEW_LEN);
        for absent in [
            Section::LayerColor,
            Section::Extra,
            Section::Machine,
            Section::Software,
            Section::Model,
        ] {
            assert!(!table.is_present(absent), "{absent:?}");
        }
        assert_eq!(
            table.offset(Section::ImageData),
            table.offset(Section::Layers) + 20 + 2 * 32
        );
    }

    #[test]
    fn test_v517_layout_has_every_section() {
        let layout = LayoutBuilder::new(FormatVersion::V517)
            .layers([5])
            .build()
            .unwrap();
        let entries: Vec<_> = layout.table().entries().collect();

        assert_eq!(layout.table().area_num(), 9);
        assert_eq!(entries.len(), 9);
        assert!(entries.windows(2).all(|w| w[0].1 < w[1].1));
        assert_eq!(entries[0], (Section::Header, 56));
    }

    #[test]
    fn test_image_offsets_are_running_sums() {
        let layout = LayoutBuilder::new(FormatVersion::V516)
            .layers([7, 0, 13])
            .build()
            .unwrap();
        let images: Vec<_> = layout.images().collect();
        let base = layout.offset(Section::ImageData);

        assert_eq!(images, vec![(base, 7), (base + 7, 0), (base + 7, 13)]);
        assert_eq!(layout.file_len(), base as u64 + 20);
    }

    #[test]
    fn test_overflow() {
        let err = LayoutBuilder::new(FormatVersion::V1)
            .layer(u32::MAX as usize)
            .layer(1)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            AnycubicError::SectionOverflow {
                section: Section::ImageData,
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn prop_offsets_follow_section_sizes(
            version_idx in 0usize..4,
            sizes in prop::collection::vec(0usize..5000, 0..40),
        ) {
            let version = FormatVersion::ALL[version_idx];
            let layout = LayoutBuilder::new(version).layers(sizes.clone()).build().unwrap();
            let n = sizes.len() as u32;

            let mut pos = intro_len(version) as u64;
            for (section, offset) in layout.table().entries() {
                prop_assert_eq!(offset as u64, pos);
                pos += section.encoded_len(version, n);
            }
            prop_assert_eq!(layout.file_len(), pos + sizes.iter().sum::<usize>() as u64);
        }
    }
}

//! Photon Workshop archive writer.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use vcad_slicer_sla::{
    ConfigStore, DisplaySettings, RasterEncoder, RasterGrayscaleAa, SlaArchiveWriter, SlaPrint,
    Thumbnail,
};

use crate::codec::{AnycubicRasterEncoder, CODEC_NAME};
use crate::error::{AnycubicError, Result};
use crate::layout::{Layout, LayoutBuilder, Section};
use crate::params::ParameterResolver;
use crate::preview::PreviewRecord;
use crate::sections::{ColorTableRecord, SectionWriter};
use crate::version::{AnycubicFormat, FormatVersion};

/// Writes prints as Photon Workshop archives of one format version.
#[derive(Debug, Clone)]
pub struct AnycubicArchive {
    display: DisplaySettings,
    version: FormatVersion,
}

impl AnycubicArchive {
    /// Archive writer for the printer described by `config`.
    pub fn new(config: &impl ConfigStore, version: FormatVersion) -> Self {
        Self {
            display: DisplaySettings::from_config(config),
            version,
        }
    }

    /// Archive writer for a printer file extension such as `"pwmx"`.
    pub fn for_format(config: &impl ConfigStore, extension: &str) -> Option<Self> {
        AnycubicFormat::by_extension(extension).map(|f| Self::new(config, f.version))
    }

    /// Format version written.
    pub fn version(&self) -> FormatVersion {
        self.version
    }

    /// Display the layers are rasterized for.
    pub fn display(&self) -> &DisplaySettings {
        &self.display
    }

    /// Plan the layout of `print`.
    pub fn layout(&self, print: &SlaPrint) -> Result<Layout> {
        LayoutBuilder::new(self.version)
            .layers(print.layers.iter().map(|l| l.len()))
            .build()
    }

    /// Serialize `print` into a complete archive.
    pub fn to_bytes(&self, print: &SlaPrint, thumbnails: &[Thumbnail]) -> Result<Vec<u8>> {
        let version = self.version;
        let caps = version.caps();
        let layout = self.layout(print)?;
        let resolver = ParameterResolver::new(&print.config);
        let params = resolver.print_params(layout.layer_count(), &print.statistics);

        if let Some(layer) = print.layers.iter().find(|l| l.extension() != CODEC_NAME) {
            tracing::warn!(
                codec = layer.extension(),
                "layer images were not encoded as {CODEC_NAME}"
            );
        }

        let mut w = SectionWriter::new(Vec::with_capacity(layout.file_len() as usize), version);
        w.write_intro(layout.table())?;

        for section in Section::ALL {
            if !caps.has(section) {
                continue;
            }
            check_position(w.get_ref(), section, layout.offset(section) as u64)?;

            match section {
                Section::Header => w.write_header(&params.header)?,
                Section::Preview => w.write_preview(&PreviewRecord::from_thumbnails(thumbnails))?,
                Section::LayerColor => w.write_layer_color(&ColorTableRecord::default())?,
                Section::Layers => {
                    w.write_layers_header(layout.layer_count())?;
                    for (i, (offset, size)) in layout.images().enumerate() {
                        w.write_layer(&params.for_layer(i).record(offset, size))?;
                    }
                }
                Section::Extra => w.write_extra(&resolver.extra())?,
                Section::Machine => w.write_machine(&resolver.machine(version))?,
                Section::Software => w.write_software(&resolver.software())?,
                Section::Model => w.write_model(&resolver.model(print.model_size()))?,
                Section::ImageData => {
                    for layer in &print.layers {
                        w.write_image_data(layer.data())?;
                    }
                }
            }
        }

        let bytes = w.into_inner();
        if bytes.len() as u64 != layout.file_len() {
            return Err(AnycubicError::LayoutMismatch {
                section: Section::ImageData,
                expected: layout.file_len(),
                actual: bytes.len() as u64,
            });
        }
        Ok(bytes)
    }

    /// Write `print` to `path`.
    ///
    /// The archive is built in memory and moved into place once fully
    /// written; on failure an existing file at `path` is left as it was.
    pub fn export(&self, path: &Path, print: &SlaPrint, thumbnails: &[Thumbnail]) -> Result<()> {
        tracing::info!(
            path = %path.display(),
            version = %self.version,
            layers = print.layer_count(),
            "exporting Photon Workshop archive"
        );

        let bytes = self
            .to_bytes(print, thumbnails)
            .and_then(|bytes| write_atomic(path, &bytes).map(|()| bytes))
            .inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "archive export failed");
            })?;

        tracing::info!(path = %path.display(), bytes = bytes.len(), "archive written");
        Ok(())
    }
}

impl SlaArchiveWriter for AnycubicArchive {
    type Error = AnycubicError;

    fn create_raster(&self) -> Result<RasterGrayscaleAa> {
        Ok(RasterGrayscaleAa::for_display(&self.display)?)
    }

    fn encoder(&self) -> Box<dyn RasterEncoder> {
        Box::new(AnycubicRasterEncoder)
    }

    fn export_print(&self, path: &Path, print: &SlaPrint, thumbnails: &[Thumbnail]) -> Result<()> {
        self.export(path, print, thumbnails)
    }
}

fn check_position(buf: &[u8], section: Section, expected: u64) -> Result<()> {
    let actual = buf.len() as u64;
    if actual != expected {
        return Err(AnycubicError::LayoutMismatch {
            section,
            expected,
            actual,
        });
    }
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if path.file_name().is_none() || path.is_dir() {
        return Err(AnycubicError::InvalidOutputPath(path.to_path_buf()));
    }
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Err(AnycubicError::InvalidOutputPath(path.to_path_buf()));
    }

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

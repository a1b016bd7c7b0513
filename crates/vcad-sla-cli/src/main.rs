//! vcad-sla CLI - Photon Workshop archive export
//!
//! Packs a directory of pre-rendered layer images, a print configuration
//! and an optional thumbnail into an Anycubic printer archive.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use vcad_slicer_anycubic::{
    AnycubicArchive, AnycubicFormat, FormatVersion, PREVIEW_HEIGHT, PREVIEW_WIDTH,
};
use vcad_slicer_sla::{
    ConfigStore, PrintStatistics, SlaArchiveWriter, SlaConfig, SlaPrint, Thumbnail,
};

#[derive(Parser)]
#[command(name = "vcad-sla")]
#[command(about = "Resin printer archive export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export layer images as a Photon Workshop archive
    Export {
        /// Print configuration (.toml or .json)
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of layer PNGs, exported in file name order
        #[arg(short, long)]
        layers: PathBuf,
        /// Preview image, resized to 224x168
        #[arg(short, long)]
        thumbnail: Option<PathBuf>,
        /// Printer file extension (default: taken from the output file)
        #[arg(short, long, conflicts_with = "version")]
        format: Option<String>,
        /// Format version number (1, 515, 516 or 517)
        #[arg(long)]
        version: Option<u32>,
        /// Resin used by the model and supports (mm³)
        #[arg(long, default_value_t = 0.0)]
        material: f64,
        /// Output archive
        output: PathBuf,
    },
    /// List printer file extensions and their format versions
    Formats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            config,
            layers,
            thumbnail,
            format,
            version,
            material,
            output,
        } => {
            let version = resolve_version(format.as_deref(), version, &output)?;
            export_archive(&config, &layers, thumbnail.as_deref(), version, material, &output)?;
        }
        Commands::Formats => {
            list_formats();
        }
    }

    Ok(())
}

fn resolve_version(format: Option<&str>, version: Option<u32>, output: &Path) -> Result<FormatVersion> {
    if let Some(number) = version {
        return FormatVersion::from_number(number)
            .with_context(|| format!("Unknown format version: {}", number));
    }

    let ext = match format {
        Some(ext) => ext.to_string(),
        None => output
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string(),
    };
    FormatVersion::from_extension(&ext).with_context(|| {
        format!(
            "Unknown printer format '{}' (run `vcad-sla formats` for the list)",
            ext
        )
    })
}

fn export_archive(
    config_path: &Path,
    layers_dir: &Path,
    thumbnail: Option<&Path>,
    version: FormatVersion,
    material: f64,
    output: &Path,
) -> Result<()> {
    let config = SlaConfig::load(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))?;
    let archive = AnycubicArchive::new(&config, version);
    let raster = archive.create_raster()?;
    let encoder = archive.encoder();
    let pixdim = raster.pixel_dim();
    let resolution = raster.resolution();

    let layer_files = list_layers(layers_dir)?;
    if layer_files.is_empty() {
        anyhow::bail!("No layer images found in {}", layers_dir.display());
    }

    let mut print = SlaPrint::new(config.clone()).with_statistics(PrintStatistics {
        objects_used_material: material,
        support_used_material: 0.0,
    });
    let mut lit: Option<(u32, u32, u32, u32)> = None;

    for path in &layer_files {
        let img = image::open(path)
            .with_context(|| format!("Failed to read layer {}", path.display()))?
            .to_luma8();
        let (w, h) = img.dimensions();
        if (w as usize, h as usize) != (resolution.width_px, resolution.height_px) {
            anyhow::bail!(
                "Layer {} is {}x{}, display expects {}x{}",
                path.display(),
                w,
                h,
                resolution.width_px,
                resolution.height_px
            );
        }

        for (x, y, p) in img.enumerate_pixels() {
            if p.0[0] == 0 {
                continue;
            }
            lit = Some(match lit {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }

        let encoded = encoder.encode(img.as_raw(), w as usize, h as usize, 1);
        tracing::debug!(layer = %path.display(), bytes = encoded.len(), "Encoded layer");
        print.push_layer(encoded);
    }

    if let Some((x0, y0, x1, y1)) = lit {
        let height = print.layer_count() as f64 * config.get_float("layer_height", 0.05);
        print = print.with_bounds(
            [x0 as f64 * pixdim.w_mm, y0 as f64 * pixdim.h_mm, 0.0],
            [
                (x1 + 1) as f64 * pixdim.w_mm,
                (y1 + 1) as f64 * pixdim.h_mm,
                height,
            ],
        );
    }

    let thumbnails = match thumbnail {
        Some(path) => vec![load_thumbnail(path)?],
        None => Vec::new(),
    };

    archive
        .export_print(output, &print, &thumbnails)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Exported {} layers to {} ({})",
        print.layer_count(),
        output.display(),
        version
    );
    Ok(())
}

fn list_layers(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read layer directory {}", dir.display()))?
    {
        let path = entry?.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load a preview image as bottom-to-top RGBA.
fn load_thumbnail(path: &Path) -> Result<Thumbnail> {
    let img = image::open(path)
        .with_context(|| format!("Failed to read thumbnail {}", path.display()))?
        .resize_exact(
            PREVIEW_WIDTH,
            PREVIEW_HEIGHT,
            image::imageops::FilterType::Triangle,
        )
        .flipv()
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(Thumbnail::new(w, h, img.into_raw())?)
}

fn list_formats() {
    println!("{:<6} {:<8} Printer", "Ext", "Version");
    for format in AnycubicFormat::all() {
        println!(
            "{:<6} {:<8} {}",
            format.extension,
            format.version.to_string(),
            format.printer
        );
    }
}

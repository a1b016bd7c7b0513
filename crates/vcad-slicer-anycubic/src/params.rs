//! Resolution of section records from print configuration.
//!
//! Everything written to the header, extra, machine, software and model
//! sections is derived here from the [`ConfigStore`] and the material and
//! printer notes it carries. Note values arrive already clamped.

use vcad_slicer_sla::{ConfigStore, DisplaySettings, Orientation, PrintStatistics};

use crate::notes::{keys, MaterialNotes, PrinterNotes};
use crate::sections::{
    ExtraRecord, HeaderRecord, LayerRecord, LiftProfile, MachineRecord, ModelRecord,
    SoftwareRecord,
};
use crate::version::FormatVersion;

/// Machine name when the printer notes do not set one.
pub const DEFAULT_MACHINE_NAME: &str = "Photon Mono";

/// Layer image format name written to the machine section.
pub const IMAGE_FORMAT: &str = "pw0Img";

/// Graphics API reported in the software section.
pub const GRAPHICS_API: &str = "3.3-CoreProfile";

/// Build height (mm) when `max_print_height` is unset.
pub const DEFAULT_PRINT_HEIGHT: f64 = 160.0;

/// Movement and exposure of one group of layers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerParams {
    /// Layer height (mm).
    pub layer_height_mm: f32,
    /// Exposure (s).
    pub exposure_time_s: f32,
    /// Lift distance (mm).
    pub lift_distance_mm: f32,
    /// Lift speed (mm/s).
    pub lift_speed_mms: f32,
}

impl LayerParams {
    /// Layer record for an image at `image_offset`.
    pub fn record(&self, image_offset: u32, image_size: u32) -> LayerRecord {
        LayerRecord {
            image_offset,
            image_size,
            lift_distance_mm: self.lift_distance_mm,
            lift_speed_mms: self.lift_speed_mms,
            exposure_time_s: self.exposure_time_s,
            layer_height_mm: self.layer_height_mm,
        }
    }
}

/// Header plus per-layer parameters for bottom and normal layers.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintParams {
    /// Header record.
    pub header: HeaderRecord,
    /// Parameters of the first `header.bottom_layer_count` layers.
    pub bottom: LayerParams,
    /// Parameters of the remaining layers.
    pub normal: LayerParams,
}

impl PrintParams {
    /// Parameters of layer `index`.
    pub fn for_layer(&self, index: usize) -> &LayerParams {
        if index < self.header.bottom_layer_count as usize {
            &self.bottom
        } else {
            &self.normal
        }
    }
}

/// Estimated print time (s).
///
/// Bottom layers expose for the bottom time, the rest for the normal time,
/// and every layer pays one lift, one retract and the pre-exposure delay.
pub fn estimate_print_time(header: &HeaderRecord, layer_count: u32) -> f64 {
    let n = layer_count as f64;
    let bottom = header.bottom_layer_count as f64;
    let lift = header.lift_distance_mm as f64;

    let per_layer_motion = lift / header.retract_speed_mms as f64
        + lift / header.lift_speed_mms as f64
        + header.delay_before_exposure_s as f64;

    bottom * header.bottom_exposure_time_s as f64
        + (n - bottom) * header.exposure_time_s as f64
        + n * per_layer_motion
}

/// Resolves section records from a configuration store.
pub struct ParameterResolver<'a, C: ConfigStore> {
    config: &'a C,
    display: DisplaySettings,
    material: MaterialNotes,
    printer: PrinterNotes,
}

impl<'a, C: ConfigStore> ParameterResolver<'a, C> {
    /// Parse the notes carried by `config`.
    pub fn new(config: &'a C) -> Self {
        Self {
            config,
            display: DisplaySettings::from_config(config),
            material: MaterialNotes::parse(&config.get_string("material_notes", "")),
            printer: PrinterNotes::parse(&config.get_string("printer_notes", "")),
        }
    }

    fn note(&self, key: &str) -> f32 {
        self.material.get(key).unwrap_or_default() as f32
    }

    fn is_portrait(&self) -> bool {
        self.display.orientation == Orientation::Portrait
    }

    /// Header record and bottom / normal layer parameters.
    pub fn print_params(&self, layer_count: u32, stats: &PrintStatistics) -> PrintParams {
        let cfg = self.config;
        let display = &self.display;

        let bottom_layer_count = cfg.get_int("faded_layers", 10).clamp(0, layer_count as i64) as u32;

        let (mut res_x, mut res_y) = (display.pixels_x as u32, display.pixels_y as u32);
        if self.is_portrait() {
            std::mem::swap(&mut res_x, &mut res_y);
        }
        let pixel_size_um = if display.pixels_x > 0 {
            (display.width_mm * 1000.0 / display.pixels_x as f64).round()
        } else {
            0.0
        };

        // bottle_weight is in kg, bottle_volume in ml
        let volume_ml = stats.total_material() / 1000.0;
        let bottle_volume = cfg.get_float("bottle_volume", 0.0);
        let (weight_g, price) = if bottle_volume > 0.0 {
            let density = cfg.get_float("bottle_weight", 0.0) * 1000.0 / bottle_volume;
            let cost = cfg.get_float("bottle_cost", 0.0);
            (volume_ml * density, volume_ml * cost / bottle_volume)
        } else {
            (0.0, 0.0)
        };

        let layer_height = cfg.get_float("layer_height", 0.05);

        let mut header = HeaderRecord {
            pixel_size_um: pixel_size_um as f32,
            layer_height_mm: layer_height as f32,
            exposure_time_s: cfg.get_float("exposure_time", 10.0) as f32,
            delay_before_exposure_s: self.note(keys::DELAY_BEFORE_EXPOSURE),
            bottom_exposure_time_s: cfg.get_float("initial_exposure_time", 15.0) as f32,
            bottom_layer_count,
            lift_distance_mm: self.note(keys::LIFT_DISTANCE),
            lift_speed_mms: self.note(keys::LIFT_SPEED),
            retract_speed_mms: self.note(keys::RETRACT_SPEED),
            volume_ml: volume_ml as f32,
            antialiasing: self.note(keys::ANTIALIASING) as u32,
            res_x,
            res_y,
            weight_g: weight_g as f32,
            price: price as f32,
            price_currency: '$' as u32,
            ..Default::default()
        };
        header.print_time_s = estimate_print_time(&header, layer_count) as u32;

        let bottom = LayerParams {
            layer_height_mm: cfg.get_float("initial_layer_height", layer_height) as f32,
            exposure_time_s: header.bottom_exposure_time_s,
            lift_distance_mm: self.note(keys::BOTTOM_LIFT_DISTANCE),
            lift_speed_mms: self.note(keys::BOTTOM_LIFT_SPEED),
        };
        let normal = LayerParams {
            layer_height_mm: header.layer_height_mm,
            exposure_time_s: header.exposure_time_s,
            lift_distance_mm: header.lift_distance_mm,
            lift_speed_mms: header.lift_speed_mms,
        };

        PrintParams {
            header,
            bottom,
            normal,
        }
    }

    fn lift_profile(&self, stage: u32) -> LiftProfile {
        LiftProfile {
            lift_distance_mm: self.note(&format!("{}{stage}", keys::EXTRA_LIFT_DISTANCE)),
            lift_speed_mms: self.note(&format!("{}{stage}", keys::EXTRA_LIFT_SPEED)),
            retract_speed_mms: self.note(&format!("{}{stage}", keys::EXTRA_RETRACT_SPEED)),
        }
    }

    /// Two-stage lift profiles: stages 1-2 for bottom layers, 3-4 for the rest.
    pub fn extra(&self) -> ExtraRecord {
        ExtraRecord {
            bottom: [self.lift_profile(1), self.lift_profile(2)],
            normal: [self.lift_profile(3), self.lift_profile(4)],
        }
    }

    /// Machine description for `version`.
    pub fn machine(&self, version: FormatVersion) -> MachineRecord {
        let (mut volume_x, mut volume_y) = (self.display.width_mm, self.display.height_mm);
        if self.is_portrait() {
            std::mem::swap(&mut volume_x, &mut volume_y);
        }
        MachineRecord {
            name: self
                .printer
                .get_or(keys::EXPORT_MACHINE_NAME, DEFAULT_MACHINE_NAME)
                .to_string(),
            image_format: IMAGE_FORMAT.to_string(),
            volume_x: volume_x as f32,
            volume_y: volume_y as f32,
            volume_z: self
                .config
                .get_float("max_print_height", DEFAULT_PRINT_HEIGHT) as f32,
            version: version.number(),
        }
    }

    /// Software description of this build.
    pub fn software(&self) -> SoftwareRecord {
        SoftwareRecord {
            name: "vcad".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            operating_system: std::env::consts::OS.to_string(),
            graphics_api: GRAPHICS_API.to_string(),
        }
    }

    /// Model box centered on X/Y, resting on Z = 0.
    pub fn model(&self, size: [f64; 3]) -> ModelRecord {
        let half_x = (size[0] / 2.0) as f32;
        let half_y = (size[1] / 2.0) as f32;
        ModelRecord {
            min: [-half_x, -half_y, 0.0],
            max: [half_x, half_y, size[2] as f32],
            supports_enabled: self.config.get_bool("supports_enable", false) as u32,
            supports_density: (self
                .config
                .get_float("support_points_density_relative", 100.0)
                / 100.0) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use vcad_slicer_sla::SlaConfig;

    fn base_config() -> SlaConfig {
        SlaConfig::new()
            .with("layer_height", 0.05)
            .with("initial_layer_height", 0.1)
            .with("exposure_time", 2.0)
            .with("initial_exposure_time", 30.0)
            .with("faded_layers", 6)
            .with("display_width", 192.0)
            .with("display_height", 120.0)
            .with("display_pixels_x", 3840)
            .with("display_pixels_y", 2400)
            .with("material_notes", "LIFT_DISTANCE=5\\nLIFT_SPEED=2\\nRETRACT_SPEED=4\\nDELAY_BEFORE_EXPOSURE=1")
    }

    fn header_of(cfg: &SlaConfig, stats: &PrintStatistics) -> HeaderRecord {
        ParameterResolver::new(cfg).print_params(1, stats).header
    }

    #[test]
    fn test_header_fields() {
        let cfg = base_config();
        let params = ParameterResolver::new(&cfg).print_params(100, &PrintStatistics::default());
        let h = &params.header;

        assert_eq!(h.pixel_size_um, 50.0);
        assert_eq!(h.res_x, 3840);
        assert_eq!(h.res_y, 2400);
        assert_eq!(h.bottom_layer_count, 6);
        assert_eq!(h.lift_distance_mm, 5.0);
        assert_eq!(h.antialiasing, 1);
        assert_eq!(h.price_currency, 0x24);
        assert_eq!(h.advanced_mode, 0);
    }

    #[test]
    fn test_bottom_layers_capped_by_layer_count() {
        let cfg = base_config().with("faded_layers", 10);
        let params = ParameterResolver::new(&cfg).print_params(3, &PrintStatistics::default());
        assert_eq!(params.header.bottom_layer_count, 3);

        let cfg = base_config().with("faded_layers", -4);
        let params = ParameterResolver::new(&cfg).print_params(3, &PrintStatistics::default());
        assert_eq!(params.header.bottom_layer_count, 0);
    }

    #[test]
    fn test_print_time() {
        let cfg = base_config();
        let params = ParameterResolver::new(&cfg).print_params(100, &PrintStatistics::default());

        // 6*30 + 94*2 + 100*(5/4 + 5/2 + 1)
        assert_relative_eq!(estimate_print_time(&params.header, 100), 843.0, epsilon = 1e-3);
        assert_eq!(params.header.print_time_s, 843);
    }

    #[test]
    fn test_layer_params() {
        let cfg = base_config().with("material_notes", "LIFT_DISTANCE=5\\nBOTTOM_LIFT_SPEED=1");
        let params = ParameterResolver::new(&cfg).print_params(10, &PrintStatistics::default());

        assert_relative_eq!(params.for_layer(0).layer_height_mm, 0.1);
        assert_eq!(params.for_layer(5).exposure_time_s, 30.0);
        assert_eq!(params.for_layer(5).lift_distance_mm, 5.0);
        assert_eq!(params.for_layer(5).lift_speed_mms, 1.0);
        assert_eq!(params.for_layer(6).exposure_time_s, 2.0);
        assert_eq!(params.for_layer(6).lift_speed_mms, 2.0);
    }

    #[test]
    fn test_portrait_swaps_resolution_and_volume() {
        let cfg = base_config().with("display_orientation", "portrait");
        let resolver = ParameterResolver::new(&cfg);
        let params = resolver.print_params(1, &PrintStatistics::default());
        let machine = resolver.machine(FormatVersion::V516);

        assert_eq!((params.header.res_x, params.header.res_y), (2400, 3840));
        assert_eq!(params.header.pixel_size_um, 50.0);
        assert_eq!((machine.volume_x, machine.volume_y), (120.0, 192.0));
    }

    #[test]
    fn test_material_cost() {
        let stats = PrintStatistics {
            objects_used_material: 9000.0,
            support_used_material: 1000.0,
        };
        let cfg = base_config()
            .with("bottle_volume", 1000.0)
            .with("bottle_weight", 1.1)
            .with("bottle_cost", 40.0);
        let h = header_of(&cfg, &stats);

        assert_relative_eq!(h.volume_ml, 10.0);
        assert_relative_eq!(h.weight_g, 11.0, epsilon = 1e-4);
        assert_relative_eq!(h.price, 0.4, epsilon = 1e-6);

        let h = header_of(&base_config().with("bottle_cost", 40.0), &stats);
        assert_eq!(h.weight_g, 0.0);
        assert_eq!(h.price, 0.0);
    }

    #[test]
    fn test_extra_defaults() {
        let cfg = SlaConfig::new();
        let extra = ParameterResolver::new(&cfg).extra();

        assert_eq!(extra.bottom[0].lift_distance_mm, 1.5);
        assert_eq!(extra.bottom[1].retract_speed_mms, 6.0);
        assert_eq!(extra.normal[1].lift_distance_mm, 4.0);
    }

    #[test]
    fn test_machine_name_from_printer_notes() {
        let cfg = SlaConfig::new();
        assert_eq!(ParameterResolver::new(&cfg).machine(FormatVersion::V516).name, "Photon Mono");

        let cfg = SlaConfig::new()
            .with("printer_notes", "PRINTER_VENDOR_ANYCUBIC\\nEXPORT_MACHINE_NAME=Photon Mono X2")
            .with("max_print_height", 200.0);
        let machine = ParameterResolver::new(&cfg).machine(FormatVersion::V516);
        assert_eq!(machine.name, "Photon Mono X2");
        assert_eq!(machine.image_format, "pw0Img");
        assert_eq!(machine.volume_z, 200.0);
        assert_eq!(machine.version, 516);
    }

    #[test]
    fn test_model_box() {
        let cfg = SlaConfig::new()
            .with("supports_enable", true)
            .with("support_points_density_relative", 80);
        let model = ParameterResolver::new(&cfg).model([20.0, 10.0, 5.0]);

        assert_eq!(model.min, [-10.0, -5.0, 0.0]);
        assert_eq!(model.max, [10.0, 5.0, 5.0]);
        assert_eq!(model.supports_enabled, 1);
        assert_relative_eq!(model.supports_density, 0.8);
    }
}

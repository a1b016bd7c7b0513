//! Print configuration store.
//!
//! Printer, material and print profiles are flattened into one string-keyed
//! map before export. Values keep the type they were written with; typed
//! accessors coerce between numeric kinds and fall back to a default when a
//! key is absent or holds a non-numeric value.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlaError};
use crate::raster::Orientation;

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean option.
    Bool(bool),
    /// Integer option.
    Int(i64),
    /// Floating point option.
    Float(f64),
    /// Free-form string option.
    String(String),
}

impl ConfigValue {
    /// Numeric value as float. Integers widen, everything else is `None`.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Numeric value as integer. Floats truncate toward zero.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ConfigValue::Int(v) => Some(*v),
            ConfigValue::Float(v) => Some(v.trunc() as i64),
            _ => None,
        }
    }

    /// Boolean value. Integers are true when non-zero.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(v) => Some(*v),
            ConfigValue::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Textual form of the value, as it would be written to a profile.
    pub fn serialize(&self) -> String {
        match self {
            ConfigValue::Bool(v) => String::from(if *v { "1" } else { "0" }),
            ConfigValue::Int(v) => v.to_string(),
            ConfigValue::Float(v) => v.to_string(),
            ConfigValue::String(v) => v.clone(),
        }
    }
}

impl From<f64> for ConfigValue {
    fn from(v: f64) -> Self {
        ConfigValue::Float(v)
    }
}

impl From<i64> for ConfigValue {
    fn from(v: i64) -> Self {
        ConfigValue::Int(v)
    }
}

impl From<i32> for ConfigValue {
    fn from(v: i32) -> Self {
        ConfigValue::Int(v as i64)
    }
}

impl From<bool> for ConfigValue {
    fn from(v: bool) -> Self {
        ConfigValue::Bool(v)
    }
}

impl From<&str> for ConfigValue {
    fn from(v: &str) -> Self {
        ConfigValue::String(v.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(v: String) -> Self {
        ConfigValue::String(v)
    }
}

/// Read-only, string-keyed access to print configuration.
pub trait ConfigStore {
    /// Raw value stored under `key`.
    fn option(&self, key: &str) -> Option<&ConfigValue>;

    /// Is `key` present?
    fn has(&self, key: &str) -> bool {
        self.option(key).is_some()
    }

    /// Float lookup with default.
    fn get_float(&self, key: &str, default: f64) -> f64 {
        self.option(key)
            .and_then(ConfigValue::as_float)
            .unwrap_or(default)
    }

    /// Integer lookup with default.
    fn get_int(&self, key: &str, default: i64) -> i64 {
        self.option(key)
            .and_then(ConfigValue::as_int)
            .unwrap_or(default)
    }

    /// Boolean lookup with default.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        self.option(key)
            .and_then(ConfigValue::as_bool)
            .unwrap_or(default)
    }

    /// String lookup with default. Non-string values are serialized.
    fn get_string(&self, key: &str, default: &str) -> String {
        self.option(key)
            .map(ConfigValue::serialize)
            .unwrap_or_else(|| default.to_string())
    }
}

/// Flat configuration map for one print.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlaConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl SlaConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`SlaConfig::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Is the configuration empty?
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parse a TOML document with a single top-level table of options.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| SlaError::Config(e.to_string()))
    }

    /// Parse a JSON object of options.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| SlaError::Config(e.to_string()))
    }

    /// Load a configuration file. `.json` files are parsed as JSON,
    /// anything else as TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_str(&text)?,
            _ => Self::from_toml_str(&text)?,
        };
        tracing::debug!(path = %path.display(), keys = config.len(), "loaded print config");
        Ok(config)
    }
}

impl ConfigStore for SlaConfig {
    fn option(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }
}

/// Printer display (LCD mask) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Display width (mm), landscape frame.
    pub width_mm: f64,
    /// Display height (mm), landscape frame.
    pub height_mm: f64,
    /// Horizontal pixel count, landscape frame.
    pub pixels_x: usize,
    /// Vertical pixel count, landscape frame.
    pub pixels_y: usize,
    /// Mirror the image along X.
    pub mirror_x: bool,
    /// Mirror the image along Y.
    pub mirror_y: bool,
    /// How the display is mounted.
    pub orientation: Orientation,
    /// Gamma applied to antialiased edge coverage.
    pub gamma: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            width_mm: 120.96,
            height_mm: 68.04,
            pixels_x: 2560,
            pixels_y: 1440,
            mirror_x: false,
            mirror_y: false,
            orientation: Orientation::Landscape,
            gamma: 1.0,
        }
    }
}

impl DisplaySettings {
    /// Read display settings from a configuration store.
    pub fn from_config(cfg: &impl ConfigStore) -> Self {
        let defaults = Self::default();
        Self {
            width_mm: cfg.get_float("display_width", defaults.width_mm),
            height_mm: cfg.get_float("display_height", defaults.height_mm),
            pixels_x: cfg.get_int("display_pixels_x", defaults.pixels_x as i64).max(0) as usize,
            pixels_y: cfg.get_int("display_pixels_y", defaults.pixels_y as i64).max(0) as usize,
            mirror_x: cfg.get_bool("display_mirror_x", defaults.mirror_x),
            mirror_y: cfg.get_bool("display_mirror_y", defaults.mirror_y),
            orientation: cfg
                .option("display_orientation")
                .and_then(Orientation::from_config_value)
                .unwrap_or(defaults.orientation),
            gamma: cfg.get_float("gamma_correction", defaults.gamma),
        }
    }

    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.width_mm <= 0.0 || self.height_mm <= 0.0 {
            return Err(SlaError::InvalidSettings(
                "display dimensions must be positive".into(),
            ));
        }
        if self.pixels_x == 0 || self.pixels_y == 0 {
            return Err(SlaError::InvalidSettings(
                "display pixel counts must be positive".into(),
            ));
        }
        // 0 disables antialiasing
        if !(self.gamma >= 0.0 && self.gamma.is_finite()) {
            return Err(SlaError::InvalidSettings(
                "gamma_correction must be zero or positive".into(),
            ));
        }
        Ok(())
    }
}

//! Overrides embedded in the material and printer notes.
//!
//! Profiles have no dedicated options for several Photon parameters, so
//! they are carried as text in the notes fields. Both fields store line
//! breaks as the literal two-character sequences `\n` and `\r`.
//!
//! Material notes are an INI document restricted to the keys listed in
//! [`MATERIAL_NOTE_KEYS`]. Each key has a type, a default and a valid
//! range, and every resolved value is clamped into that range, so bad
//! input can never produce an out-of-range field.
//!
//! Printer notes are a list of independent `KEY=value` lines.

use std::collections::BTreeMap;

/// Names of the recognized material note keys.
pub mod keys {
    /// Lift distance (mm).
    pub const LIFT_DISTANCE: &str = "LIFT_DISTANCE";
    /// Lift speed (mm/s).
    pub const LIFT_SPEED: &str = "LIFT_SPEED";
    /// Retract speed (mm/s).
    pub const RETRACT_SPEED: &str = "RETRACT_SPEED";
    /// Delay before exposure (s).
    pub const DELAY_BEFORE_EXPOSURE: &str = "DELAY_BEFORE_EXPOSURE";
    /// Bottom layer lift distance (mm).
    pub const BOTTOM_LIFT_DISTANCE: &str = "BOTTOM_LIFT_DISTANCE";
    /// Bottom layer lift speed (mm/s).
    pub const BOTTOM_LIFT_SPEED: &str = "BOTTOM_LIFT_SPEED";
    /// Antialiasing flag (0 / 1).
    pub const ANTIALIASING: &str = "ANTIALIASING";
    /// Prefix of the numbered extra lift distances (`EXTRA_LIFT_DISTANCE1`..`4`).
    pub const EXTRA_LIFT_DISTANCE: &str = "EXTRA_LIFT_DISTANCE";
    /// Prefix of the numbered extra lift speeds.
    pub const EXTRA_LIFT_SPEED: &str = "EXTRA_LIFT_SPEED";
    /// Prefix of the numbered extra retract speeds.
    pub const EXTRA_RETRACT_SPEED: &str = "EXTRA_RETRACT_SPEED";

    /// Printer notes key holding the machine name.
    pub const EXPORT_MACHINE_NAME: &str = "EXPORT_MACHINE_NAME";
}

/// Value type of a note key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    /// Floating point value.
    Float,
    /// Integer value; fractional input is truncated.
    Int,
}

/// Fallback used when a key is absent or unparsable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteDefault {
    /// A fixed value.
    Value(f64),
    /// Whatever another key resolves to.
    SameAs(&'static str),
}

/// Type, default and valid range of one note key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteDescriptor {
    /// Key name.
    pub key: &'static str,
    /// Value type.
    pub kind: NoteKind,
    /// Fallback value.
    pub default: NoteDefault,
    /// Smallest allowed value.
    pub min: f64,
    /// Largest allowed value.
    pub max: f64,
}

const fn float(key: &'static str, default: f64, min: f64, max: f64) -> NoteDescriptor {
    NoteDescriptor {
        key,
        kind: NoteKind::Float,
        default: NoteDefault::Value(default),
        min,
        max,
    }
}

/// Every key recognized in the material notes.
pub const MATERIAL_NOTE_KEYS: &[NoteDescriptor] = &[
    float(keys::LIFT_DISTANCE, 8.0, 0.0, 100.0),
    float(keys::LIFT_SPEED, 2.0, 0.1, 20.0),
    float(keys::RETRACT_SPEED, 3.0, 0.1, 20.0),
    float(keys::DELAY_BEFORE_EXPOSURE, 0.5, 0.0, 1000.0),
    NoteDescriptor {
        key: keys::BOTTOM_LIFT_DISTANCE,
        kind: NoteKind::Float,
        default: NoteDefault::SameAs(keys::LIFT_DISTANCE),
        min: 0.0,
        max: 100.0,
    },
    NoteDescriptor {
        key: keys::BOTTOM_LIFT_SPEED,
        kind: NoteKind::Float,
        default: NoteDefault::SameAs(keys::LIFT_SPEED),
        min: 0.1,
        max: 20.0,
    },
    NoteDescriptor {
        key: keys::ANTIALIASING,
        kind: NoteKind::Int,
        default: NoteDefault::Value(1.0),
        min: 0.0,
        max: 1.0,
    },
    float("EXTRA_LIFT_DISTANCE1", 1.5, 0.1, 100.0),
    float("EXTRA_LIFT_SPEED1", 2.0, 0.1, 20.0),
    float("EXTRA_RETRACT_SPEED1", 3.0, 0.1, 20.0),
    float("EXTRA_LIFT_DISTANCE2", 4.5, 0.1, 100.0),
    float("EXTRA_LIFT_SPEED2", 4.0, 0.1, 20.0),
    float("EXTRA_RETRACT_SPEED2", 6.0, 0.1, 20.0),
    float("EXTRA_LIFT_DISTANCE3", 1.5, 0.1, 100.0),
    float("EXTRA_LIFT_SPEED3", 2.0, 0.1, 20.0),
    float("EXTRA_RETRACT_SPEED3", 3.0, 0.1, 20.0),
    float("EXTRA_LIFT_DISTANCE4", 4.0, 0.1, 100.0),
    float("EXTRA_LIFT_SPEED4", 2.0, 0.1, 20.0),
    float("EXTRA_RETRACT_SPEED4", 3.0, 0.1, 20.0),
];

/// Look up the descriptor of a material note key.
pub fn descriptor(key: &str) -> Option<&'static NoteDescriptor> {
    MATERIAL_NOTE_KEYS.iter().find(|d| d.key == key)
}

/// Replace literal `\n` / `\r` escapes with real line breaks.
pub fn unescape(raw: &str) -> String {
    raw.replace("\\n", "\n").replace("\\r", "\r")
}

/// Parsed material notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialNotes {
    values: BTreeMap<String, String>,
}

impl MaterialNotes {
    /// Parse escaped notes text. Unrecognized keys are ignored.
    pub fn parse(raw: &str) -> Self {
        let mut values = BTreeMap::new();

        for line in unescape(raw).lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(['#', ';', '[']) {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if descriptor(key).is_none() {
                tracing::debug!(key, "ignoring unknown material notes key");
                continue;
            }
            values.insert(key.to_string(), value.trim().to_string());
        }

        Self { values }
    }

    /// Resolve a recognized key: parse, fall back to its default, clamp.
    ///
    /// Returns `None` only for keys missing from [`MATERIAL_NOTE_KEYS`].
    pub fn get(&self, key: &str) -> Option<f64> {
        let desc = descriptor(key)?;

        let parsed = self.values.get(key).and_then(|raw| {
            let value = raw.parse::<f64>().ok().filter(|v| v.is_finite());
            if value.is_none() {
                tracing::debug!(key, raw = raw.as_str(), "unparsable material notes value");
            }
            value
        });

        let value = match (parsed, desc.kind) {
            (Some(v), NoteKind::Float) => v,
            (Some(v), NoteKind::Int) => v.trunc(),
            (None, _) => match desc.default {
                NoteDefault::Value(v) => v,
                NoteDefault::SameAs(other) => self.get(other)?,
            },
        };

        let clamped = value.clamp(desc.min, desc.max);
        if clamped != value {
            tracing::debug!(key, value, clamped, "material notes value out of range");
        }
        Some(clamped)
    }
}

/// Parsed printer notes: independent `KEY=value` lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrinterNotes {
    items: Vec<String>,
}

impl PrinterNotes {
    /// Split escaped notes text into lines, dropping empty ones.
    pub fn parse(raw: &str) -> Self {
        let items = unescape(raw)
            .split(['\n', '\r'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self { items }
    }

    /// Value of the first `KEY=value` line for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.iter().find_map(|item| {
            let (k, v) = item.split_once('=')?;
            (k.trim() == key).then(|| v.trim())
        })
    }

    /// Value for `key`, or `default`.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_unescape() {
        assert_eq!(unescape("A=1\\nB=2\\r\\nC=3"), "A=1\nB=2\r\nC=3");
    }

    #[test]
    fn test_defaults() {
        let notes = MaterialNotes::parse("");
        assert_eq!(notes.get(keys::LIFT_DISTANCE), Some(8.0));
        assert_eq!(notes.get(keys::LIFT_SPEED), Some(2.0));
        assert_eq!(notes.get(keys::RETRACT_SPEED), Some(3.0));
        assert_eq!(notes.get(keys::DELAY_BEFORE_EXPOSURE), Some(0.5));
        assert_eq!(notes.get(keys::ANTIALIASING), Some(1.0));
        assert_eq!(notes.get("EXTRA_LIFT_DISTANCE2"), Some(4.5));
        assert_eq!(notes.get("EXTRA_RETRACT_SPEED2"), Some(6.0));
        assert_eq!(notes.get("NOT_A_KEY"), None);
    }

    #[test]
    fn test_escaped_overrides() {
        let notes = MaterialNotes::parse(
            "; photon overrides\\nLIFT_DISTANCE = 6\\nLIFT_SPEED=1.5\\r\\nUNKNOWN=5\\nANTIALIASING=0",
        );
        assert_eq!(notes.get("UNKNOWN"), None);
        assert_eq!(notes.get(keys::LIFT_DISTANCE), Some(6.0));
        assert_eq!(notes.get(keys::LIFT_SPEED), Some(1.5));
        assert_eq!(notes.get(keys::ANTIALIASING), Some(0.0));
    }

    #[test]
    fn test_bottom_keys_follow_normal_values() {
        let notes = MaterialNotes::parse("LIFT_DISTANCE=5\nLIFT_SPEED=4");
        assert_eq!(notes.get(keys::BOTTOM_LIFT_DISTANCE), Some(5.0));
        assert_eq!(notes.get(keys::BOTTOM_LIFT_SPEED), Some(4.0));

        let notes = MaterialNotes::parse("LIFT_DISTANCE=5\nBOTTOM_LIFT_DISTANCE=250");
        assert_eq!(notes.get(keys::BOTTOM_LIFT_DISTANCE), Some(100.0));
    }

    #[test]
    fn test_malformed_values_use_default() {
        let notes = MaterialNotes::parse("LIFT_SPEED=fast\nRETRACT_SPEED=nan\nLIFT_DISTANCE");
        assert_eq!(notes.get(keys::LIFT_SPEED), Some(2.0));
        assert_eq!(notes.get(keys::RETRACT_SPEED), Some(3.0));
        assert_eq!(notes.get(keys::LIFT_DISTANCE), Some(8.0));
    }

    #[test]
    fn test_int_keys_truncate() {
        let notes = MaterialNotes::parse("ANTIALIASING=0.9");
        assert_eq!(notes.get(keys::ANTIALIASING), Some(0.0));
        let notes = MaterialNotes::parse("ANTIALIASING=7");
        assert_eq!(notes.get(keys::ANTIALIASING), Some(1.0));
    }

    #[test]
    fn test_table_is_consistent() {
        for d in MATERIAL_NOTE_KEYS {
            assert!(d.min <= d.max, "{}", d.key);
            if let NoteDefault::Value(v) = d.default {
                assert!((d.min..=d.max).contains(&v), "{}", d.key);
            }
            if let NoteDefault::SameAs(other) = d.default {
                assert!(descriptor(other).is_some(), "{}", d.key);
            }
        }
        for n in 1..=4 {
            for prefix in [keys::EXTRA_LIFT_DISTANCE, keys::EXTRA_LIFT_SPEED, keys::EXTRA_RETRACT_SPEED] {
                assert!(descriptor(&format!("{prefix}{n}")).is_some());
            }
        }
    }

    #[test]
    fn test_printer_notes() {
        let notes = PrinterNotes::parse(
            "PRINTER_VENDOR_ANYCUBIC\\nEXPORT_MACHINE_NAME=Photon Mono X\\r\\n\\nFOO=bar",
        );
        assert_eq!(notes.get(keys::EXPORT_MACHINE_NAME), Some("Photon Mono X"));
        assert_eq!(notes.get("FOO"), Some("bar"));
        assert_eq!(notes.get("PRINTER_VENDOR_ANYCUBIC"), None);
        assert_eq!(notes.get_or("MISSING", "Photon Mono"), "Photon Mono");
    }

    proptest! {
        #[test]
        fn prop_values_always_in_range(value in prop::num::f64::ANY) {
            let text = MATERIAL_NOTE_KEYS
                .iter()
                .map(|d| format!("{}={}", d.key, value))
                .collect::<Vec<_>>()
                .join("\\n");
            let notes = MaterialNotes::parse(&text);
            for d in MATERIAL_NOTE_KEYS {
                let v = notes.get(d.key).unwrap();
                prop_assert!(v >= d.min && v <= d.max, "{} = {}", d.key, v);
            }
        }

        #[test]
        fn prop_huge_and_negative(value in prop_oneof![-1e12f64..-1e-3, 1e3f64..1e12]) {
            let notes = MaterialNotes::parse(&format!("LIFT_DISTANCE={value}\nLIFT_SPEED={value}\nDELAY_BEFORE_EXPOSURE={value}"));
            let lift = notes.get(keys::LIFT_DISTANCE).unwrap();
            let speed = notes.get(keys::LIFT_SPEED).unwrap();
            let delay = notes.get(keys::DELAY_BEFORE_EXPOSURE).unwrap();
            prop_assert!((0.0..=100.0).contains(&lift));
            prop_assert!((0.1..=20.0).contains(&speed));
            prop_assert!((0.0..=1000.0).contains(&delay));
        }
    }
}

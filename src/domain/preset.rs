use serde::Serialize;

use crate::error::{Result, SimbeatError};

use super::{BeatSpec, FrequencyValue};

/// Built-in presets as `(name, left Hz, right Hz)`.
const CATALOG: &[(&str, f64, f64)] = &[
    ("Focus (10 Hz)", 220.0, 230.0),
    ("Relax (6 Hz)", 200.0, 206.0),
    ("Sleep (2 Hz)", 180.0, 182.0),
    ("Meditation (7.83 Hz)", 200.0, 207.83),
];

/// A named carrier pair whose beat has been checked against [`BeatSpec`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preset {
    name: String,
    left: FrequencyValue,
    right: FrequencyValue,
}

impl Preset {
    pub fn create(name: &str, left_hz: f64, right_hz: f64) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SimbeatError::EmptyPresetName);
        }

        let left = FrequencyValue::from_hz(left_hz)?;
        let right = FrequencyValue::from_hz(right_hz)?;
        BeatSpec::create(left, right)?;

        Ok(Self {
            name: name.to_string(),
            left,
            right,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn left(&self) -> FrequencyValue {
        self.left
    }

    pub fn right(&self) -> FrequencyValue {
        self.right
    }

    /// Fresh [`BeatSpec`] stamped with the current time.
    pub fn beat(&self) -> Result<BeatSpec> {
        BeatSpec::create(self.left, self.right)
    }
}

/// The built-in presets, in catalog order.
pub fn catalog() -> Result<Vec<Preset>> {
    CATALOG
        .iter()
        .map(|&(name, left, right)| Preset::create(name, left, right))
        .collect()
}

/// Looks a preset up by its exact name.
pub fn find_preset(name: &str) -> Result<Preset> {
    catalog()?
        .into_iter()
        .find(|preset| preset.name == name)
        .ok_or_else(|| SimbeatError::PresetNotFound(name.to_string()))
}

mod calibration;
mod library;
mod loader;

pub use calibration::{CalibrationCurve, CalibrationTable, ColorKey};
pub use library::ProfileLibrary;
pub use loader::{LocalLoader, ModelData, ModelMetadata, ProfileLoader};

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::ProfileError;
use crate::core::unit::Watt;
use crate::device::ColorMode;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    #[display("fixed")]
    Fixed,
    #[display("linear")]
    Linear,
    #[display("lut")]
    Lut,
}

/// Cache key of one power profile: manufacturer and model plus the optional
/// custom data directory it should be loaded from. Manufacturer and model
/// are normalized to lowercase, matching the library directory layout.
#[derive(Debug, Clone, Hash, Eq, PartialEq, derive_more::Display)]
#[display("{manufacturer}/{model}")]
pub struct ProfileFingerprint {
    pub manufacturer: String,
    pub model: String,
    pub custom_dir: Option<PathBuf>,
}

impl ProfileFingerprint {
    pub fn new(manufacturer: &str, model: &str) -> Self {
        Self {
            manufacturer: manufacturer.to_lowercase(),
            model: model.to_lowercase(),
            custom_dir: None,
        }
    }

    pub fn with_custom_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.custom_dir = Some(dir.into());
        self
    }
}

/// Linear mode parameters: a min/max power range and/or calibration anchor
/// points in `"<level> -> <watt>"` syntax.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct LinearConfig {
    #[serde(default)]
    pub min_power: Option<f64>,
    #[serde(default)]
    pub max_power: Option<f64>,
    #[serde(default)]
    pub calibrate: Option<Vec<String>>,
}

impl LinearConfig {
    pub fn power_range(&self) -> Option<(f64, f64)> {
        match (self.min_power, self.max_power) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct FixedConfig {
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub states_power: HashMap<String, f64>,
}

/// Per-model configuration bundle: metadata plus the decoded calibration
/// tables. Created once by the profile library, shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerProfile {
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub standby_usage: Option<Watt>,
    pub supported_modes: Vec<PowerMode>,
    pub linear_config: Option<LinearConfig>,
    pub fixed_config: Option<FixedConfig>,
    pub lut_tables: HashMap<ColorMode, CalibrationTable>,
}

impl PowerProfile {
    pub fn supports(&self, mode: PowerMode) -> bool {
        self.supported_modes.contains(&mode)
    }

    pub(crate) fn from_model_data(fingerprint: &ProfileFingerprint, data: ModelData) -> Result<Self, ProfileError> {
        let metadata = data.metadata;
        let invalid = |reason: String| ProfileError::InvalidMetadata {
            model: fingerprint.to_string(),
            reason,
        };

        if metadata.supported_modes.is_empty() {
            return Err(invalid("supported_modes must not be empty".to_owned()));
        }

        if let Some(standby) = &metadata.standby_usage {
            if standby.is_negative() {
                return Err(invalid(format!("standby_usage must be non-negative, got {}", standby.0)));
            }
        }

        if let Some(linear) = &metadata.linear_config {
            let has_curve = linear.calibrate.as_ref().is_some_and(|c| !c.is_empty());
            match linear.power_range() {
                Some((min, max)) if min < 0.0 || min > max => {
                    return Err(invalid(format!(
                        "linear_config requires 0 <= min_power <= max_power, got {} / {}",
                        min, max
                    )));
                }
                None if !has_curve => {
                    return Err(invalid("linear_config needs a min/max power range or calibration points".to_owned()));
                }
                _ => {}
            }
        }

        if let Some(fixed) = &metadata.fixed_config {
            if fixed.power.is_some_and(|p| p < 0.0) {
                return Err(invalid("fixed_config.power must be non-negative".to_owned()));
            }
            if fixed.states_power.values().any(|p| *p < 0.0) {
                return Err(invalid("fixed_config.states_power must be non-negative".to_owned()));
            }
        }

        let mut lut_tables = HashMap::new();
        for (mode, bytes) in data.datasets {
            let table = CalibrationTable::decode_csv(mode, &bytes).map_err(|e| ProfileError::CorruptDataset {
                model: fingerprint.to_string(),
                dataset: format!("{}.csv", mode),
                reason: format!("{:#}", e),
            })?;
            tracing::debug!("Decoded {} calibration rows ({}) for {}", table.len(), mode, fingerprint);
            lut_tables.insert(mode, table);
        }

        if metadata.supported_modes.contains(&PowerMode::Lut) && lut_tables.is_empty() {
            return Err(ProfileError::MissingDataset {
                model: fingerprint.to_string(),
                dataset: "at least one color mode dataset".to_owned(),
            });
        }

        Ok(Self {
            manufacturer: fingerprint.manufacturer.clone(),
            model: fingerprint.model.clone(),
            name: metadata.name,
            standby_usage: metadata.standby_usage,
            supported_modes: metadata.supported_modes,
            linear_config: metadata.linear_config,
            fixed_config: metadata.fixed_config,
            lut_tables,
        })
    }
}

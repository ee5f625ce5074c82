mod service;

pub use service::PowerEstimationService;

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::core::unit::Watt;
use crate::device::StateSnapshot;
use crate::power_profile::PowerMode;
use crate::strategy::PowerStrategy;

/// Outcome of one evaluation. Unavailable means the current state could not
/// be resolved against the calibration data, which is distinct from a
/// legitimate zero-watt reading and retried on the next state change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Power(Watt),
    Unavailable,
}

impl Estimate {
    pub fn watts(&self) -> Option<f64> {
        match self {
            Estimate::Power(watt) => Some(watt.0),
            Estimate::Unavailable => None,
        }
    }
}

/// Per-sensor configuration supplied by the user, overriding or replacing
/// the model profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SensorPowerConfig {
    #[serde(default)]
    pub mode: Option<PowerMode>,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub states_power: HashMap<String, f64>,
    #[serde(default)]
    pub min_power: Option<f64>,
    #[serde(default)]
    pub max_power: Option<f64>,
    #[serde(default)]
    pub calibration_curve: Vec<String>,
    #[serde(default)]
    pub standby_usage: Option<f64>,
    #[serde(default)]
    pub disable_standby_usage: bool,
    #[serde(default)]
    pub multiply_factor: Option<f64>,
    #[serde(default)]
    pub multiply_factor_standby: bool,
    /// Directory holding this sensor's model files directly, bypassing the
    /// library layout.
    #[serde(default)]
    pub custom_model_directory: Option<PathBuf>,
}

/// Evaluates state-change events for one sensor. Holds the strategy selected
/// at setup and the resolved standby policy, nothing else: identical
/// snapshots always produce identical estimates.
#[derive(Debug, Clone)]
pub struct PowerEstimator {
    strategy: PowerStrategy,
    standby_usage: Option<Watt>,
    disable_standby_usage: bool,
    multiply_factor: Option<f64>,
    multiply_factor_standby: bool,
}

impl PowerEstimator {
    pub(crate) fn new(
        strategy: PowerStrategy,
        standby_usage: Option<Watt>,
        disable_standby_usage: bool,
        multiply_factor: Option<f64>,
        multiply_factor_standby: bool,
    ) -> Self {
        Self {
            strategy,
            standby_usage,
            disable_standby_usage,
            multiply_factor,
            multiply_factor_standby,
        }
    }

    pub fn mode(&self) -> PowerMode {
        self.strategy.mode()
    }

    pub fn estimate(&self, state: &StateSnapshot) -> Estimate {
        if !state.is_on {
            return self.standby_estimate();
        }

        match self.strategy.calculate(state) {
            Some(watt) => Estimate::Power(self.apply_factor(watt)),
            None => {
                tracing::debug!("Strategy '{}' could not resolve the current state, reporting unavailable", self.mode());
                Estimate::Unavailable
            }
        }
    }

    fn standby_estimate(&self) -> Estimate {
        if self.disable_standby_usage {
            return Estimate::Power(Watt::ZERO);
        }

        match self.standby_usage {
            Some(watt) if self.multiply_factor_standby => Estimate::Power(self.apply_factor(watt)),
            Some(watt) => Estimate::Power(watt),
            //No standby configured: every strategy draws nothing while off
            None => Estimate::Power(Watt::ZERO),
        }
    }

    fn apply_factor(&self, watt: Watt) -> Watt {
        match self.multiply_factor {
            Some(factor) => watt * factor,
            None => watt,
        }
    }
}

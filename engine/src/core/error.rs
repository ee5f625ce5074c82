use derive_more::derive::{Display, Error, From};

use crate::power_profile::PowerMode;

/// Model data could not be loaded or is invalid. Fatal for every sensor
/// referencing that model. Cloneable so that all waiters of a shared load
/// receive the same failure.
#[derive(Debug, Clone, Display, Error)]
pub enum ProfileError {
    #[display("Model {manufacturer}/{model} not found in profile library")]
    ModelNotFound { manufacturer: String, model: String },

    #[display("Malformed metadata for model {model}: {reason}")]
    InvalidMetadata { model: String, reason: String },

    #[display("Missing calibration dataset '{dataset}' for model {model}")]
    MissingDataset { model: String, dataset: String },

    #[display("Corrupt calibration dataset '{dataset}' for model {model}: {reason}")]
    CorruptDataset {
        model: String,
        dataset: String,
        reason: String,
    },

    #[display("I/O error reading '{path}': {reason}")]
    Io { path: String, reason: String },
}

/// Configuration mismatch detected while resolving the calculation strategy
/// for a sensor. Always fatal at setup, never raised during evaluation.
#[derive(Debug, Clone, Display, Error)]
pub enum StrategySetupError {
    #[display("Mode '{mode}' cannot be used: {reason}")]
    UnsupportedMode { mode: PowerMode, reason: String },

    #[display("Unable to determine a calculation strategy, no mode declared or configured")]
    UndeterminedStrategy,

    #[display("Mode '{mode}' selected but no configuration for it is present")]
    MissingConfig { mode: PowerMode },

    #[display("Calibration curve needs at least 2 points, got {points}")]
    InsufficientCalibration { points: usize },

    #[display("Invalid calibration point '{entry}': {reason}")]
    InvalidCalibrationPoint { entry: String, reason: String },

    #[display("Invalid setting '{setting}': {reason}")]
    InvalidSetting { setting: String, reason: String },
}

/// Anything that can abort sensor setup. Runtime incompleteness is not an
/// error, it surfaces as [`crate::Estimate::Unavailable`] instead.
#[derive(Debug, Display, Error, From)]
pub enum SetupError {
    #[display("{_0}")]
    Profile(ProfileError),

    #[display("{_0}")]
    Strategy(StrategySetupError),
}

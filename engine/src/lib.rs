#![allow(async_fn_in_trait)]

mod core;
mod device;
mod estimation;
mod power_profile;
mod settings;
mod strategy;

pub use crate::core::error::{ProfileError, SetupError, StrategySetupError};
pub use crate::core::unit::{Percent, Watt};
pub use crate::device::{ColorMode, DeviceDomain, StateSnapshot};
pub use crate::estimation::{Estimate, PowerEstimationService, PowerEstimator, SensorPowerConfig};
pub use crate::power_profile::{
    CalibrationCurve, CalibrationTable, ColorKey, FixedConfig, LinearConfig, LocalLoader, ModelData, ModelMetadata,
    PowerMode, PowerProfile, ProfileFingerprint, ProfileLibrary, ProfileLoader,
};
pub use crate::settings::{EngineSettings, LibrarySettings};
pub use crate::strategy::{FixedStrategy, LinearStrategy, LutStrategy, PowerStrategy, select_strategy};

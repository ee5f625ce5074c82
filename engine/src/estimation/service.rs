use std::sync::Arc;

use crate::core::error::{SetupError, StrategySetupError};
use crate::core::unit::Watt;
use crate::device::DeviceDomain;
use crate::power_profile::{LocalLoader, PowerProfile, ProfileFingerprint, ProfileLibrary, ProfileLoader};
use crate::settings::EngineSettings;
use crate::strategy::select_strategy;

use super::{PowerEstimator, SensorPowerConfig};

/// Entry point for the host platform. Owns the shared profile library and
/// performs the one-time sensor setup: profile load, curve parsing and
/// strategy selection. Creating an estimator is the only operation that
/// suspends, evaluation itself is synchronous.
pub struct PowerEstimationService<L = LocalLoader> {
    library: ProfileLibrary<L>,
}

impl PowerEstimationService<LocalLoader> {
    pub fn new(settings: &EngineSettings) -> Self {
        let mut loader = LocalLoader::new(&settings.library.data_dir);
        if let Some(dir) = &settings.library.custom_dir {
            loader = loader.with_custom_dir(dir);
        }
        Self::with_loader(loader)
    }
}

impl<L: ProfileLoader> PowerEstimationService<L> {
    pub fn with_loader(loader: L) -> Self {
        Self {
            library: ProfileLibrary::new(loader),
        }
    }

    /// Fingerprint for a discovered (manufacturer, model) pair.
    pub fn fingerprint(&self, manufacturer: &str, model: &str) -> ProfileFingerprint {
        ProfileFingerprint::new(manufacturer, model)
    }

    pub async fn get_profile(&self, fingerprint: &ProfileFingerprint) -> Result<Arc<PowerProfile>, SetupError> {
        Ok(self.library.get_profile(fingerprint).await?)
    }

    /// One-time setup for a sensor. Errors here are permanent configuration
    /// problems and abort sensor creation; they never occur again at
    /// evaluation time. Reconfiguring a sensor means calling this again.
    pub async fn create_estimator(
        &self,
        domain: DeviceDomain,
        model: Option<&ProfileFingerprint>,
        config: &SensorPowerConfig,
    ) -> Result<PowerEstimator, SetupError> {
        let profile = match model {
            //A sensor-level custom directory becomes part of the cache key,
            //other sensors of the same model keep the library profile
            Some(fingerprint) => {
                let fingerprint = match &config.custom_model_directory {
                    Some(dir) => fingerprint.clone().with_custom_dir(dir.clone()),
                    None => fingerprint.clone(),
                };
                Some(self.library.get_profile(&fingerprint).await?)
            }
            None => None,
        };

        let strategy = select_strategy(domain, profile.as_ref(), config)?;
        let standby_usage = resolve_standby(config, profile.as_deref())?;
        let multiply_factor = validate_multiply_factor(config)?;

        tracing::debug!(
            "Created {} power estimator for a {} sensor (model: {})",
            strategy.mode(),
            domain,
            model.map(|m| m.to_string()).unwrap_or_else(|| "none".to_owned())
        );

        Ok(PowerEstimator::new(
            strategy,
            standby_usage,
            config.disable_standby_usage,
            multiply_factor,
            config.multiply_factor_standby,
        ))
    }

    /// Drops a cached profile, e.g. after the custom model directory was
    /// reconfigured. Estimators created earlier keep their old profile until
    /// they are recreated.
    pub async fn invalidate_profile(&self, fingerprint: &ProfileFingerprint) {
        self.library.invalidate(fingerprint).await;
    }
}

fn resolve_standby(config: &SensorPowerConfig, profile: Option<&PowerProfile>) -> Result<Option<Watt>, StrategySetupError> {
    if let Some(standby) = config.standby_usage {
        if standby < 0.0 {
            return Err(StrategySetupError::InvalidSetting {
                setting: "standby_usage".to_owned(),
                reason: "must be non-negative".to_owned(),
            });
        }
        return Ok(Some(Watt(standby)));
    }

    Ok(profile.and_then(|p| p.standby_usage))
}

fn validate_multiply_factor(config: &SensorPowerConfig) -> Result<Option<f64>, StrategySetupError> {
    if let Some(factor) = config.multiply_factor {
        if factor <= 0.0 {
            return Err(StrategySetupError::InvalidSetting {
                setting: "multiply_factor".to_owned(),
                reason: "must be positive".to_owned(),
            });
        }
    }
    Ok(config.multiply_factor)
}

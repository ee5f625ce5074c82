use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::StrategySetupError;
use crate::core::unit::Watt;
use crate::device::DeviceDomain;
use crate::estimation::SensorPowerConfig;
use crate::power_profile::{CalibrationCurve, PowerMode, PowerProfile};

use super::{FixedStrategy, LinearStrategy, LutStrategy, PowerStrategy};

/// Resolves and instantiates the calculation strategy for one sensor. Runs
/// once at sensor setup: an explicit user mode wins over the profile's
/// declared modes, and for lights with multiple declared modes LUT is
/// preferred over Linear over Fixed. All configuration problems surface
/// here, evaluation never fails on configuration.
pub fn select_strategy(
    domain: DeviceDomain,
    profile: Option<&Arc<PowerProfile>>,
    config: &SensorPowerConfig,
) -> Result<PowerStrategy, StrategySetupError> {
    let mode = resolve_mode(domain, profile, config)?;
    tracing::debug!("Resolved calculation mode '{}' for {} sensor", mode, domain);

    match mode {
        PowerMode::Fixed => build_fixed(profile, config),
        PowerMode::Linear => build_linear(domain, profile, config),
        PowerMode::Lut => build_lut(domain, profile),
    }
}

fn resolve_mode(
    domain: DeviceDomain,
    profile: Option<&Arc<PowerProfile>>,
    config: &SensorPowerConfig,
) -> Result<PowerMode, StrategySetupError> {
    if let Some(mode) = config.mode {
        if mode == PowerMode::Lut && domain != DeviceDomain::Light {
            return Err(StrategySetupError::UnsupportedMode {
                mode,
                reason: format!("lut mode is only supported for lights, not for {}", domain),
            });
        }

        if let Some(profile) = profile {
            if !profile.supports(mode) {
                return Err(StrategySetupError::UnsupportedMode {
                    mode,
                    reason: format!(
                        "model {}/{} only declares modes {:?}",
                        profile.manufacturer, profile.model, profile.supported_modes
                    ),
                });
            }
        }

        return Ok(mode);
    }

    if let Some(profile) = profile {
        let priority: &[PowerMode] = if domain == DeviceDomain::Light {
            &[PowerMode::Lut, PowerMode::Linear, PowerMode::Fixed]
        } else {
            &[PowerMode::Linear, PowerMode::Fixed]
        };

        return priority
            .iter()
            .find(|mode| profile.supports(**mode))
            .copied()
            .ok_or_else(|| StrategySetupError::UnsupportedMode {
                mode: profile.supported_modes[0],
                reason: format!("none of the declared modes is usable for a {} device", domain),
            });
    }

    //Standalone sensor configuration without a model profile
    if config.power.is_some() || !config.states_power.is_empty() {
        Ok(PowerMode::Fixed)
    } else if !config.calibration_curve.is_empty() || config.min_power.is_some() || config.max_power.is_some() {
        Ok(PowerMode::Linear)
    } else {
        Err(StrategySetupError::UndeterminedStrategy)
    }
}

fn build_fixed(
    profile: Option<&Arc<PowerProfile>>,
    config: &SensorPowerConfig,
) -> Result<PowerStrategy, StrategySetupError> {
    if config.power.is_some_and(|p| p < 0.0) {
        return Err(StrategySetupError::InvalidSetting {
            setting: "power".to_owned(),
            reason: "must be non-negative".to_owned(),
        });
    }
    if config.states_power.values().any(|p| *p < 0.0) {
        return Err(StrategySetupError::InvalidSetting {
            setting: "states_power".to_owned(),
            reason: "must be non-negative".to_owned(),
        });
    }

    let profile_fixed = profile.and_then(|p| p.fixed_config.as_ref());

    let power = config
        .power
        .or_else(|| profile_fixed.and_then(|f| f.power))
        .map(Watt);

    let states_power: HashMap<String, Watt> = if !config.states_power.is_empty() {
        config.states_power.iter().map(|(state, watt)| (state.clone(), Watt(*watt))).collect()
    } else {
        profile_fixed
            .map(|f| f.states_power.iter().map(|(state, watt)| (state.clone(), Watt(*watt))).collect())
            .unwrap_or_default()
    };

    if power.is_none() && states_power.is_empty() {
        return Err(StrategySetupError::MissingConfig { mode: PowerMode::Fixed });
    }

    Ok(PowerStrategy::Fixed(FixedStrategy::new(power, states_power)))
}

fn build_linear(
    domain: DeviceDomain,
    profile: Option<&Arc<PowerProfile>>,
    config: &SensorPowerConfig,
) -> Result<PowerStrategy, StrategySetupError> {
    let profile_linear = profile.and_then(|p| p.linear_config.as_ref());

    if !config.calibration_curve.is_empty() {
        let curve = CalibrationCurve::parse(&config.calibration_curve)?;
        return Ok(PowerStrategy::Linear(LinearStrategy::with_curve(domain, curve)));
    }

    if let Some(entries) = profile_linear.and_then(|l| l.calibrate.as_ref()).filter(|c| !c.is_empty()) {
        let curve = CalibrationCurve::parse(entries)?;
        return Ok(PowerStrategy::Linear(LinearStrategy::with_curve(domain, curve)));
    }

    if let (Some(min), Some(max)) = (config.min_power, config.max_power) {
        if min < 0.0 || min > max {
            return Err(StrategySetupError::InvalidSetting {
                setting: "min_power/max_power".to_owned(),
                reason: format!("requires 0 <= min_power <= max_power, got {} / {}", min, max),
            });
        }
        return Ok(PowerStrategy::Linear(LinearStrategy::with_range(domain, min, max)));
    }

    if let Some((min, max)) = profile_linear.and_then(|l| l.power_range()) {
        return Ok(PowerStrategy::Linear(LinearStrategy::with_range(domain, min, max)));
    }

    Err(StrategySetupError::MissingConfig { mode: PowerMode::Linear })
}

fn build_lut(domain: DeviceDomain, profile: Option<&Arc<PowerProfile>>) -> Result<PowerStrategy, StrategySetupError> {
    if domain != DeviceDomain::Light {
        return Err(StrategySetupError::UnsupportedMode {
            mode: PowerMode::Lut,
            reason: format!("lut mode is only supported for lights, not for {}", domain),
        });
    }

    let Some(profile) = profile else {
        return Err(StrategySetupError::UnsupportedMode {
            mode: PowerMode::Lut,
            reason: "no power profile available for this sensor".to_owned(),
        });
    };

    Ok(PowerStrategy::Lut(LutStrategy::new(profile.clone())))
}

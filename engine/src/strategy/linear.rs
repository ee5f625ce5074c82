use crate::core::unit::Watt;
use crate::device::{DeviceDomain, StateSnapshot};
use crate::power_profile::CalibrationCurve;

/// Power rising linearly with the device's level, either between a
/// min/max range or along a piecewise calibration curve.
#[derive(Debug, Clone)]
pub struct LinearStrategy {
    scale: LevelScale,
    params: LinearParams,
}

#[derive(Debug, Clone)]
enum LinearParams {
    Range { min_power: f64, max_power: f64 },
    Curve(CalibrationCurve),
}

/// Which attribute drives the level and its full-scale value: brightness
/// 0-255 for lights, percentage 0-100 for speed-controlled devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LevelScale {
    Brightness,
    Percentage,
}

impl LevelScale {
    fn for_domain(domain: DeviceDomain) -> Self {
        match domain {
            DeviceDomain::Light => LevelScale::Brightness,
            _ => LevelScale::Percentage,
        }
    }

    fn max(&self) -> f64 {
        match self {
            LevelScale::Brightness => 255.0,
            LevelScale::Percentage => 100.0,
        }
    }

    fn level_of(&self, state: &StateSnapshot) -> Option<f64> {
        match self {
            LevelScale::Brightness => state.brightness,
            LevelScale::Percentage => state.percentage.map(f64::from),
        }
    }
}

impl LinearStrategy {
    pub(crate) fn with_range(domain: DeviceDomain, min_power: f64, max_power: f64) -> Self {
        Self {
            scale: LevelScale::for_domain(domain),
            params: LinearParams::Range { min_power, max_power },
        }
    }

    pub(crate) fn with_curve(domain: DeviceDomain, curve: CalibrationCurve) -> Self {
        Self {
            scale: LevelScale::for_domain(domain),
            params: LinearParams::Curve(curve),
        }
    }

    pub fn calculate(&self, state: &StateSnapshot) -> Option<Watt> {
        let reported = self.scale.level_of(state)?;

        //A device reporting level 0 while on is at its minimum dimmable
        //level, not at zero output
        let level = if reported <= 0.0 && state.is_on {
            1.0
        } else {
            reported.clamp(0.0, self.scale.max())
        };

        let watt = match &self.params {
            LinearParams::Range { min_power, max_power } => {
                Watt(min_power + (max_power - min_power) * (level / self.scale.max()))
            }
            LinearParams::Curve(curve) => curve.interpolate(level),
        };

        Some(watt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_scales_between_min_and_max_power() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);
        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(128.0);

        let watt = strategy.calculate(&state).unwrap();
        assert!((watt.0 - 4.2647).abs() < 0.001);
    }

    #[test]
    fn full_brightness_yields_max_power() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);
        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(255.0);

        assert_eq!(strategy.calculate(&state), Some(Watt(8.0)));
    }

    #[test]
    fn monotonically_non_decreasing_in_brightness() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);

        let mut previous = f64::MIN;
        for brightness in 0..=255 {
            let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(brightness as f64);
            let watt = strategy.calculate(&state).unwrap();
            assert!(watt.0 >= previous, "power decreased at brightness {}", brightness);
            previous = watt.0;
        }
    }

    #[test]
    fn level_zero_while_on_counts_as_minimum_level() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);
        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(0.0);

        let watt = strategy.calculate(&state).unwrap();
        let expected = 0.5 + 7.5 * (1.0 / 255.0);
        assert!((watt.0 - expected).abs() < 1e-9);
        assert!(watt.0 > 0.5);
    }

    #[test]
    fn fan_uses_percentage_scale() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Fan, 2.0, 40.0);
        let state = StateSnapshot::on(DeviceDomain::Fan).with_percentage(50.0);

        assert_eq!(strategy.calculate(&state), Some(Watt(21.0)));
    }

    #[test]
    fn brightness_above_range_is_clamped() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);
        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(300.0);

        assert_eq!(strategy.calculate(&state), Some(Watt(8.0)));
    }

    #[test]
    fn missing_level_attribute_is_unavailable() {
        let strategy = LinearStrategy::with_range(DeviceDomain::Light, 0.5, 8.0);
        let state = StateSnapshot::on(DeviceDomain::Light);

        assert_eq!(strategy.calculate(&state), None);
    }

    #[test]
    fn curve_takes_precedence_over_range_formula() {
        let curve = CalibrationCurve::new(vec![(1.0, 0.3), (10.0, 1.25), (50.0, 3.50), (100.0, 6.8), (255.0, 15.3)]).unwrap();
        let strategy = LinearStrategy::with_curve(DeviceDomain::Light, curve);

        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(75.0);
        let watt = strategy.calculate(&state).unwrap();
        assert!((watt.0 - 5.15).abs() < 1e-9);
    }
}

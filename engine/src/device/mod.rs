use serde::{Deserialize, Serialize};

use crate::core::unit::Percent;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum DeviceDomain {
    #[display("light")]
    Light,
    #[display("fan")]
    Fan,
    #[display("switch")]
    Switch,
    #[display("media_player")]
    MediaPlayer,
}

/// Which attribute dimensions currently describe a light's output. Doubles
/// as the key for calibration tables and as the dataset file stem.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[display("hs")]
    Hs,
    #[display("color_temp")]
    ColorTemp,
    #[display("brightness")]
    Brightness,
}

impl ColorMode {
    pub fn variants() -> [ColorMode; 3] {
        [ColorMode::Hs, ColorMode::ColorTemp, ColorMode::Brightness]
    }
}

/// Snapshot of a device's state at one point in time. Built fresh for every
/// evaluation and discarded afterwards, never stored by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct StateSnapshot {
    pub domain: DeviceDomain,
    pub is_on: bool,
    /// Raw state tag as reported by the device (e.g. "playing" for media
    /// players), used for per-state fixed power lookups.
    pub state: Option<String>,
    pub brightness: Option<f64>,
    pub hue: Option<f64>,
    pub saturation: Option<f64>,
    pub color_temp_mired: Option<f64>,
    pub percentage: Option<Percent>,
}

impl StateSnapshot {
    pub fn on(domain: DeviceDomain) -> Self {
        Self {
            domain,
            is_on: true,
            state: None,
            brightness: None,
            hue: None,
            saturation: None,
            color_temp_mired: None,
            percentage: None,
        }
    }

    pub fn off(domain: DeviceDomain) -> Self {
        Self {
            is_on: false,
            ..Self::on(domain)
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = Some(state.to_owned());
        self
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_hs(mut self, hue: f64, saturation: f64) -> Self {
        self.hue = Some(hue);
        self.saturation = Some(saturation);
        self
    }

    pub fn with_color_temp(mut self, mired: f64) -> Self {
        self.color_temp_mired = Some(mired);
        self
    }

    pub fn with_percentage(mut self, percentage: f64) -> Self {
        self.percentage = Some(Percent(percentage));
        self
    }

    /// Resolves the active color mode from the attributes actually present.
    /// Hue/saturation wins over color temperature when a light reports both.
    pub fn color_mode(&self) -> Option<ColorMode> {
        if self.hue.is_some() && self.saturation.is_some() {
            Some(ColorMode::Hs)
        } else if self.color_temp_mired.is_some() {
            Some(ColorMode::ColorTemp)
        } else if self.brightness.is_some() {
            Some(ColorMode::Brightness)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_mode_prefers_hs_over_color_temp() {
        let state = StateSnapshot::on(DeviceDomain::Light)
            .with_brightness(100.0)
            .with_hs(1000.0, 100.0)
            .with_color_temp(370.0);

        assert_eq!(state.color_mode(), Some(ColorMode::Hs));
    }

    #[test]
    fn color_mode_falls_back_to_brightness() {
        let state = StateSnapshot::on(DeviceDomain::Light).with_brightness(100.0);
        assert_eq!(state.color_mode(), Some(ColorMode::Brightness));
    }

    #[test]
    fn color_mode_unresolved_without_attributes() {
        let state = StateSnapshot::on(DeviceDomain::Light);
        assert_eq!(state.color_mode(), None);
    }
}

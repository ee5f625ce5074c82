use std::sync::Arc;

use crate::core::unit::Watt;
use crate::device::{ColorMode, StateSnapshot};
use crate::power_profile::{ColorKey, PowerProfile};

/// Looks up the measured wattage nearest to the light's current state in
/// the model's calibration tables. The table is chosen per evaluation from
/// the snapshot's active color mode.
#[derive(Debug, Clone)]
pub struct LutStrategy {
    profile: Arc<PowerProfile>,
}

impl LutStrategy {
    pub(crate) fn new(profile: Arc<PowerProfile>) -> Self {
        Self { profile }
    }

    pub fn calculate(&self, state: &StateSnapshot) -> Option<Watt> {
        let Some(mode) = state.color_mode() else {
            tracing::debug!("Snapshot of {} carries no color attributes, color mode unresolved", self.profile.model);
            return None;
        };

        let Some(table) = self.profile.lut_tables.get(&mode) else {
            tracing::warn!(
                "Model {}/{} has no calibration table for color mode {}",
                self.profile.manufacturer,
                self.profile.model,
                mode
            );
            return None;
        };

        let brightness = state.brightness?;
        let color = match mode {
            ColorMode::Hs => ColorKey::HueSat {
                hue: state.hue?,
                saturation: state.saturation?,
            },
            ColorMode::ColorTemp => ColorKey::Mired(state.color_temp_mired?),
            ColorMode::Brightness => ColorKey::None,
        };

        Some(table.nearest_watt(brightness, color))
    }
}

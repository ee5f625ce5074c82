use std::collections::HashMap;

use crate::core::unit::Watt;
use crate::device::StateSnapshot;

/// Constant wattage while the device is on. Devices whose draw depends on a
/// discrete state rather than on/off (media players, vacuums) use the
/// per-state map, consulted before the flat power value.
#[derive(Debug, Clone)]
pub struct FixedStrategy {
    power: Option<Watt>,
    states_power: HashMap<String, Watt>,
}

impl FixedStrategy {
    pub(crate) fn new(power: Option<Watt>, states_power: HashMap<String, Watt>) -> Self {
        Self { power, states_power }
    }

    pub fn calculate(&self, state: &StateSnapshot) -> Option<Watt> {
        if let Some(tag) = &state.state {
            if let Some(watt) = self.states_power.get(tag) {
                return Some(*watt);
            }
        }

        if self.power.is_none() && !self.states_power.is_empty() {
            tracing::debug!("No per-state power for state {:?} and no flat power configured", state.state);
        }

        self.power
    }
}

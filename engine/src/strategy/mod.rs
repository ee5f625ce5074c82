mod fixed;
mod linear;
mod lut;
mod selector;

pub use fixed::FixedStrategy;
pub use linear::LinearStrategy;
pub use lut::LutStrategy;
pub use selector::select_strategy;

use crate::core::unit::Watt;
use crate::device::StateSnapshot;
use crate::power_profile::PowerMode;

//Closed set of calculation modes. A trait object would force boxing and
//dynamic dispatch for a set that never grows at runtime.
#[derive(Debug, Clone)]
pub enum PowerStrategy {
    Fixed(FixedStrategy),
    Linear(LinearStrategy),
    Lut(LutStrategy),
}

impl PowerStrategy {
    /// Wattage for the given snapshot, `None` when the state cannot be
    /// resolved against the available calibration data. Pure and synchronous,
    /// all data was loaded at setup.
    pub fn calculate(&self, state: &StateSnapshot) -> Option<Watt> {
        match self {
            PowerStrategy::Fixed(strategy) => strategy.calculate(state),
            PowerStrategy::Linear(strategy) => strategy.calculate(state),
            PowerStrategy::Lut(strategy) => strategy.calculate(state),
        }
    }

    pub fn mode(&self) -> PowerMode {
        match self {
            PowerStrategy::Fixed(_) => PowerMode::Fixed,
            PowerStrategy::Linear(_) => PowerMode::Linear,
            PowerStrategy::Lut(_) => PowerMode::Lut,
        }
    }
}

use std::fmt::Display;

use derive_more::derive::AsRef;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsRef, Serialize, Deserialize)]
pub struct Watt(pub f64);

impl Watt {
    pub const ZERO: Watt = Watt(0.0);

    pub fn is_negative(&self) -> bool {
        self.0 < 0.0
    }
}

impl Display for Watt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} W", self.0)
    }
}

impl From<&Watt> for f64 {
    fn from(value: &Watt) -> Self {
        value.0
    }
}

impl From<Watt> for f64 {
    fn from(value: Watt) -> Self {
        value.0
    }
}

impl From<f64> for Watt {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl std::ops::Mul<f64> for Watt {
    type Output = Watt;

    fn mul(self, rhs: f64) -> Self::Output {
        Watt(self.0 * rhs)
    }
}

mod local;

pub use local::LocalLoader;

use serde::Deserialize;

use crate::core::error::ProfileError;
use crate::core::unit::Watt;
use crate::device::ColorMode;
use crate::power_profile::{FixedConfig, LinearConfig, PowerMode, ProfileFingerprint};

/// Structured metadata record of one model, as found in the library.
/// Unknown fields are tolerated, the library format keeps growing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    #[serde(default)]
    pub standby_usage: Option<Watt>,
    pub supported_modes: Vec<PowerMode>,
    #[serde(default)]
    pub linear_config: Option<LinearConfig>,
    #[serde(default)]
    pub fixed_config: Option<FixedConfig>,
}

/// Raw load result: parsed metadata plus the decompressed CSV bytes of every
/// calibration dataset found for the model. Decoding into tables happens in
/// [`crate::PowerProfile`], the loader only produces bytes.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub metadata: ModelMetadata,
    pub datasets: Vec<(ColorMode, Vec<u8>)>,
}

pub trait ProfileLoader {
    async fn load_model(&self, fingerprint: &ProfileFingerprint) -> Result<ModelData, ProfileError>;
}

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;

use crate::core::error::ProfileError;
use crate::device::ColorMode;
use crate::power_profile::{PowerMode, ProfileFingerprint};

use super::{ModelData, ModelMetadata, ProfileLoader};

/// Loads model profiles from a library directory laid out as
/// `<data_dir>/<manufacturer>/<model>/model.json` with the calibration
/// datasets next to it as `<color_mode>.csv` or `<color_mode>.csv.gz`.
/// An optional custom directory with the same layout overrides the library
/// model by model. A fingerprint carrying its own custom directory bypasses
/// the layout entirely and reads the model files directly from there.
#[derive(Debug, Clone)]
pub struct LocalLoader {
    data_dir: PathBuf,
    custom_dir: Option<PathBuf>,
}

impl LocalLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            custom_dir: None,
        }
    }

    pub fn with_custom_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.custom_dir = Some(dir.into());
        self
    }

    async fn model_dir(&self, fingerprint: &ProfileFingerprint) -> PathBuf {
        if let Some(dir) = &fingerprint.custom_dir {
            return dir.clone();
        }

        let relative = Path::new(&fingerprint.manufacturer).join(&fingerprint.model);

        if let Some(root) = &self.custom_dir {
            let overlay = root.join(&relative);
            if matches!(tokio::fs::try_exists(overlay.join("model.json")).await, Ok(true)) {
                return overlay;
            }
        }

        self.data_dir.join(relative)
    }

    async fn read_metadata(&self, dir: &Path, fingerprint: &ProfileFingerprint) -> Result<ModelMetadata, ProfileError> {
        let path = dir.join("model.json");

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No model.json at {}", path.display());
                return Err(ProfileError::ModelNotFound {
                    manufacturer: fingerprint.manufacturer.clone(),
                    model: fingerprint.model.clone(),
                });
            }
            Err(e) => {
                return Err(ProfileError::Io {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_slice(&raw).map_err(|e| ProfileError::InvalidMetadata {
            model: fingerprint.to_string(),
            reason: e.to_string(),
        })
    }

    /// Dataset bytes for one color mode, decompressed if only the gzipped
    /// variant exists. `None` when the model ships no dataset for the mode.
    async fn read_dataset(
        &self,
        dir: &Path,
        mode: ColorMode,
        fingerprint: &ProfileFingerprint,
    ) -> Result<Option<Vec<u8>>, ProfileError> {
        let plain = dir.join(format!("{}.csv", mode));
        if let Some(bytes) = read_optional(&plain).await? {
            return Ok(Some(bytes));
        }

        let gzipped = dir.join(format!("{}.csv.gz", mode));
        let Some(compressed) = read_optional(&gzipped).await? else {
            return Ok(None);
        };

        let mut bytes = Vec::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_end(&mut bytes)
            .map_err(|e| ProfileError::CorruptDataset {
                model: fingerprint.to_string(),
                dataset: format!("{}.csv.gz", mode),
                reason: e.to_string(),
            })?;

        Ok(Some(bytes))
    }
}

impl ProfileLoader for LocalLoader {
    async fn load_model(&self, fingerprint: &ProfileFingerprint) -> Result<ModelData, ProfileError> {
        let dir = self.model_dir(fingerprint).await;
        tracing::debug!("Loading model {} from {}", fingerprint, dir.display());

        let metadata = self.read_metadata(&dir, fingerprint).await?;

        let mut datasets = Vec::new();
        if metadata.supported_modes.contains(&PowerMode::Lut) {
            for mode in ColorMode::variants() {
                if let Some(bytes) = self.read_dataset(&dir, mode, fingerprint).await? {
                    datasets.push((mode, bytes));
                }
            }
        }

        Ok(ModelData { metadata, datasets })
    }
}

async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ProfileError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ProfileError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

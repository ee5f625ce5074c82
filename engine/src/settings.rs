use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineSettings {
    pub library: LibrarySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LibrarySettings {
    /// Root of the model library, one directory per manufacturer with one
    /// directory per model inside.
    pub data_dir: PathBuf,
    /// Directory overriding the library model by model, laid out like the
    /// library itself (`<custom_dir>/<manufacturer>/<model>`). Models absent
    /// here keep resolving from the library.
    #[serde(default)]
    pub custom_dir: Option<PathBuf>,
}

impl EngineSettings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name("config.toml"))
            .add_source(Environment::default().separator("_").list_separator(","));

        let s = builder.build()?;
        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_deserialize_from_toml() {
        let settings: EngineSettings = Config::builder()
            .add_source(config::File::from_str(
                "[library]\ndata_dir = \"/var/lib/profiles\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.library.data_dir, PathBuf::from("/var/lib/profiles"));
        assert_eq!(settings.library.custom_dir, None);
    }
}

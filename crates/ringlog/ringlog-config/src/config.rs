use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize, Debug)]
pub struct StoreConfig {
    pub path: String,
    #[serde(default = "defaults::size_kb")]
    pub size_kb: u32,
    #[serde(default = "defaults::flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn size_kb() -> u32 {
        64 * 1024 // 64 MB
    }

    pub fn flush_interval_ms() -> u64 {
        1000
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl StoreConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: StoreConfig = toml::from_str(&toml_str)?;
        Ok(config)
    }
}

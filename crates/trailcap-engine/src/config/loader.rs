use super::schema::TrailcapConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./trailcap.yaml
    /// 2. ~/.trailcap/config.yaml
    /// 3. Default configuration
    pub async fn load_default() -> Result<TrailcapConfig, ConfigError> {
        let local_config = PathBuf::from("./trailcap.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".trailcap").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(TrailcapConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<TrailcapConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        // An empty file is a valid "all defaults" config.
        if content.trim().is_empty() {
            return Ok(TrailcapConfig::default());
        }
        let config: TrailcapConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `path` when given, the default search otherwise.
    pub async fn load(path: Option<&Path>) -> Result<TrailcapConfig, ConfigError> {
        match path {
            Some(path) => Self::load_from(path).await,
            None => Self::load_default().await,
        }
    }
}

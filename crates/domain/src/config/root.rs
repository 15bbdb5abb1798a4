use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::filtering::FilteringConfig;
use super::logging::LoggingConfig;

/// Main configuration structure for the Warden DNS filtering core
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Filter engine configuration (services, caches)
    #[serde(default)]
    pub filtering: FilteringConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. warden-dns.toml in current directory
    /// 3. Default configuration
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let config = if let Some(path) = path {
            Self::from_file(path)?
        } else if std::path::Path::new("warden-dns.toml").exists() {
            Self::from_file("warden-dns.toml")?
        } else {
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.filtering.cache_time_secs == 0 {
            return Err(ConfigError::Validation(
                "cache_time_secs cannot be 0".to_string(),
            ));
        }

        if self.filtering.safe_browsing_cache_size == 0
            || self.filtering.parental_cache_size == 0
            || self.filtering.safe_search_cache_size == 0
        {
            return Err(ConfigError::Validation(
                "cache sizes cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

//! Configuration management.
//!
//! Settings come from three layers, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file (`--config`, or `~/.config/irma-datastore/config.toml`)
//! 3. `IRMA_DATASTORE__<SECTION>__<KEY>` environment variables

mod file_config;

pub use file_config::{load_config, save_config, ConfigFileError};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Production DataStore REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://irmaservices.nps.gov/datastore/v4/rest/";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// DataStore API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Where downloaded packages and exports are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// DataStore API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every request is built from; must end with `/`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            user_agent: None,
        }
    }
}

impl ApiConfig {
    /// Check that the base URL is an absolute http(s) URL ending in `/` and
    /// that both timeouts are non-zero
    pub fn validate(&self) -> Result<(), ConfigFileError> {
        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            ConfigFileError::Invalid(format!("api.base_url '{}': {}", self.base_url, e))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigFileError::Invalid(format!(
                "api.base_url '{}' must use http or https",
                self.base_url
            )));
        }

        if !self.base_url.ends_with('/') {
            return Err(ConfigFileError::Invalid(format!(
                "api.base_url '{}' must end with '/'",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigFileError::Invalid(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigFileError::Invalid(
                "api.connect_timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Root directory for downloaded packages (`<root>/<reference id>/`)
    #[serde(default = "default_packages_dir")]
    pub packages_dir: PathBuf,

    /// Directory for CSV exports (`<dir>/<term>.csv`)
    #[serde(default = "default_search_results_dir")]
    pub search_results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            packages_dir: default_packages_dir(),
            search_results_dir: default_search_results_dir(),
        }
    }
}

fn default_packages_dir() -> PathBuf {
    PathBuf::from("packages")
}

fn default_search_results_dir() -> PathBuf {
    PathBuf::from("search_results")
}

/// In-memory response cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Default location of the configuration file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("irma-datastore").join("config.toml"))
}

/// Find an existing configuration file in the default locations
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("irma-datastore.toml");
    if local.is_file() {
        return Some(local);
    }

    default_config_path().filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert!(config.cache.enabled);
        assert_eq!(config.output.packages_dir, PathBuf::from("packages"));
        assert_eq!(
            config.output.search_results_dir,
            PathBuf::from("search_results")
        );
        assert!(config.api.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_trailing_slash() {
        let api = ApiConfig {
            base_url: "https://irmaservices.nps.gov/datastore/v4/rest".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(api.validate(), Err(ConfigFileError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_scheme() {
        let api = ApiConfig {
            base_url: "ftp://example.org/rest/".to_string(),
            ..ApiConfig::default()
        };
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let api = ApiConfig {
            timeout_secs: 0,
            ..ApiConfig::default()
        };
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_connect_timeout() {
        let api = ApiConfig {
            connect_timeout_secs: 0,
            ..ApiConfig::default()
        };
        let err = api.validate().unwrap_err();
        assert!(err.to_string().contains("connect_timeout_secs"));
    }
}

//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! base_url = "https://irmaservices.nps.gov/datastore/v4/rest/"
//! timeout_secs = 30
//! connect_timeout_secs = 10
//!
//! [output]
//! packages_dir = "packages"
//! search_results_dir = "search_results"
//!
//! [cache]
//! enabled = true
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Any key can be overridden from the environment, e.g.
//! `IRMA_DATASTORE__API__TIMEOUT_SECS=60`.

use std::path::Path;

use super::Config;

/// Prefix for environment overrides
const ENV_PREFIX: &str = "IRMA_DATASTORE";

/// Load configuration from an optional TOML file plus environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigFileError> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.is_file() {
            return Err(ConfigFileError::Io(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        builder = builder.add_source(config::File::from(path).format(config::FileFormat::Toml));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigFileError::Parse(e.to_string()))?;

    let config: Config = settings
        .try_deserialize()
        .map_err(|e| ConfigFileError::Parse(e.to_string()))?;

    config.api.validate()?;
    Ok(config)
}

/// Save configuration to a TOML file, creating parent directories
pub fn save_config(path: &Path, config: &Config) -> Result<(), ConfigFileError> {
    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
    }

    std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

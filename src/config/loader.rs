//! Configuration loading from disk.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// File looked up inside the config directory.
pub const CONFIG_FILE_NAME: &str = "app.toml";

/// Environment variable that overrides the bind address from the file.
pub const SERVE_ADDRESS_ENV: &str = "SERVE_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config path is empty")]
    EmptyPath,

    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to unmarshal config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from `<dir>/app.toml`.
///
/// `SERVE_ADDRESS` in the process environment takes precedence over the
/// file value.
pub fn load_config(dir: &Path) -> Result<AppConfig, ConfigError> {
    load_config_with(dir, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
pub fn load_config_with<F>(dir: &Path, env: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if dir.as_os_str().is_empty() {
        return Err(ConfigError::EmptyPath);
    }

    let path = dir.join(CONFIG_FILE_NAME);
    let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::NotFound(path.clone()),
        _ => ConfigError::Read {
            path: path.clone(),
            source: e,
        },
    })?;

    let mut config: AppConfig = toml::from_str(&content)?;
    if let Some(address) = env(SERVE_ADDRESS_ENV).filter(|a| !a.is_empty()) {
        tracing::debug!(address = %address, "SERVE_ADDRESS overridden from environment");
        config.serve_address = address;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

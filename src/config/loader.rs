//! Configuration loading from the environment and disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::env::Environment;
use crate::config::schema::{GatewayConfig, GatewaySettings};
use crate::config::validation::{validate_environment, validate_settings, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate the optional TOML tuning file.
pub fn load_settings(path: &Path) -> Result<GatewaySettings, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let settings: GatewaySettings = toml::from_str(&content)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;
    Ok(settings)
}

/// Build an environment from the process plus an env file that only fills gaps.
pub fn load_environment(env_file: &Path) -> Result<Environment, ConfigError> {
    let mut env = Environment::from_process();
    env.merge_env_file(env_file).map_err(|source| ConfigError::Io {
        path: env_file.display().to_string(),
        source,
    })?;
    Ok(env)
}

/// Combine required environment values with the tuning settings.
pub fn load_config(env: &Environment, settings: GatewaySettings) -> Result<GatewayConfig, ConfigError> {
    let (port, backends) = validate_environment(env).map_err(ConfigError::Validation)?;
    validate_settings(&settings).map_err(ConfigError::Validation)?;

    Ok(GatewayConfig {
        port,
        backends,
        settings,
    })
}

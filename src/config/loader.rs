//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::LookupConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<LookupConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => LookupConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay the variables the service has always been deployed with.
pub fn apply_env_overrides<F>(config: &mut LookupConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(env) = var("APP_ENV") {
        config.app.env = env;
    }
    if let Some(port) = var("APP_PORT") {
        let host = config
            .app
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.app.bind_address = format!("{}:{}", host, port);
    }
    if let Some(path) = var("DB_PATH") {
        config.store.path = if path.is_empty() { None } else { Some(path) };
    }
    if let Some(uri) = var("API_URI") {
        config.remote.base_url = uri;
    }
    if let Some(level) = var("LOG_LEVEL") {
        config.observability.log_level = level;
    }
}

//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (ROLEGATE__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::config::types::EngineConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "rolegate.toml",
    ".rolegate.toml",
    "~/.config/rolegate/config.toml",
    "/etc/rolegate/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<EngineConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let engine_config: EngineConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&engine_config)?;

    Ok(engine_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<EngineConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        // Explicit path provided - must exist
        std::fs::metadata(path).map_err(|source| ConfigError::Io {
            path: path.into(),
            source,
        })?;
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // First existing default path wins
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // e.g. ROLEGATE__RULES__PATH, ROLEGATE__LOGGING__FORMAT
    builder = builder.add_source(
        Environment::with_prefix("ROLEGATE")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let engine_config: EngineConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&engine_config)?;

    Ok(engine_config)
}

/// Validate configuration values
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.rules.path.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "rules.path".to_string(),
        });
    }

    config.rules.resolved_format()?;

    Ok(())
}

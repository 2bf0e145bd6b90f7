//! Configuration types for rolegate
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::controller::{ControllerOption, ReloadSchedule, with_json, with_yaml};
use crate::error::{ConfigError, LoaderError};
use crate::loader::RulesFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Where rules come from and how often they are reloaded
    pub rules: RulesConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Controller option loading the configured rules file
    pub fn controller_option(&self) -> Result<ControllerOption, LoaderError> {
        self.rules.controller_option()
    }
}

/// Rules file settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Path to the rules file (`~` is expanded)
    pub path: String,

    /// File format; inferred from the extension when absent
    pub format: Option<RulesFormat>,

    /// Seconds between reloads. Values below 1 fall back to 5, negative
    /// values disable reloading.
    pub reload_interval_secs: i64,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            path: "rules.yaml".to_string(),
            format: None,
            reload_interval_secs: 5,
        }
    }
}

impl RulesConfig {
    /// Rules path with `~` expanded
    pub fn expanded_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).as_ref())
    }

    /// Explicit format, or the one implied by the file extension
    pub fn resolved_format(&self) -> Result<RulesFormat, ConfigError> {
        self.format
            .or_else(|| RulesFormat::from_path(&self.path))
            .ok_or_else(|| ConfigError::Invalid {
                message: format!(
                    "cannot infer rules format from '{}', set rules.format to json or yaml",
                    self.path
                ),
            })
    }

    pub fn schedule(&self) -> ReloadSchedule {
        ReloadSchedule::from_secs(self.reload_interval_secs)
    }

    /// Controller option loading this rules file.
    ///
    /// Unknown formats are reported by config validation; here they fall back
    /// to YAML.
    pub fn controller_option(&self) -> Result<ControllerOption, LoaderError> {
        let path = self.expanded_path();
        match self.resolved_format().unwrap_or(RulesFormat::Yaml) {
            RulesFormat::Json => with_json(path, self.schedule()),
            RulesFormat::Yaml => with_yaml(path, self.schedule()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}

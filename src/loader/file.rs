//! File-backed loaders
//!
//! Both loaders parse their file once when created, so a missing or broken
//! file is reported before a controller is built, and read it again on every
//! subsequent load.

use crate::access_control::RuleSet;
use crate::error::LoaderError;
use crate::loader::RuleLoader;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// On-disk format of a rules file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesFormat {
    Json,
    Yaml,
}

impl RulesFormat {
    /// Guess the format from a file extension (`.json`, `.yaml`, `.yml`)
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Parse rules from raw text in this format
    pub fn parse(&self, path: &Path, text: &str) -> Result<RuleSet, LoaderError> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|source| LoaderError::Json {
                path: path.to_path_buf(),
                source,
            }),
            Self::Yaml => serde_yaml::from_str(text).map_err(|source| LoaderError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

fn read_rules(path: &Path, format: RulesFormat) -> Result<RuleSet, LoaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    format.parse(path, &text)
}

/// Loads rules from a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileLoader {
    path: PathBuf,
}

impl JsonFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LoaderError> {
        let loader = Self { path: path.into() };
        loader.load()?;
        Ok(loader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleLoader for JsonFileLoader {
    fn load(&self) -> Result<RuleSet, LoaderError> {
        read_rules(&self.path, RulesFormat::Json)
    }
}

/// Loads rules from a YAML file
#[derive(Debug, Clone)]
pub struct YamlFileLoader {
    path: PathBuf,
}

impl YamlFileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, LoaderError> {
        let loader = Self { path: path.into() };
        loader.load()?;
        Ok(loader)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleLoader for YamlFileLoader {
    fn load(&self) -> Result<RuleSet, LoaderError> {
        read_rules(&self.path, RulesFormat::Yaml)
    }
}

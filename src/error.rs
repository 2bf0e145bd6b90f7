//! Error types for rolegate
//!
//! This module defines the error hierarchy used throughout the crate.
//! Every layer has its own `thiserror` enum; `AppError` ties them together
//! for callers that do not care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
}

/// Malformed wildcard pattern syntax
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("unterminated character class in pattern '{pattern}'")]
    UnterminatedClass { pattern: String },

    #[error("empty character class in pattern '{pattern}'")]
    EmptyClass { pattern: String },

    #[error("unterminated alternation group in pattern '{pattern}'")]
    UnterminatedGroup { pattern: String },

    #[error("dangling escape at end of pattern '{pattern}'")]
    DanglingEscape { pattern: String },
}

/// Why a single rule failed validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// One of host, path or method is empty
    #[error("resource field '{field}' is empty")]
    IncompleteResource { field: &'static str },

    /// A resource pattern does not parse
    #[error(transparent)]
    MalformedPattern(PatternError),

    /// Neither `allow_anyone` nor any role list is set
    #[error("permission grants nothing: set allow_anyone or at least one role list")]
    EmptyPermission,
}

/// A validation failure attributed to one rule of a rule set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("rule #{position} (id {id}): {reason}")]
pub struct RuleViolation {
    /// Position of the rule in its rule set
    pub position: usize,
    /// The rule's priority ID
    pub id: i64,
    pub reason: ViolationReason,
}

/// Every violation found in a rule set, reported together
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", format_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<RuleViolation>,
}

fn format_violations(violations: &[RuleViolation]) -> String {
    let mut message = format!("{} invalid rule(s)", violations.len());
    for violation in violations {
        message.push_str(&format!("\n  * {}", violation));
    }
    message
}

/// Errors raised while producing a rule set
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read rules from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON rules from {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse YAML rules from {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Rule source failed: {0}")]
    Source(String),
}

/// Errors raised while answering a query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl QueryError {
    pub fn missing(field: &str) -> Self {
        Self::InvalidRequest {
            reason: format!("{} is missing", field),
        }
    }
}

/// Errors raised while constructing or reloading a controller
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("No rule loader configured")]
    UndefinedLoader,

    #[error(transparent)]
    Loader(#[from] LoaderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to build rule index: {0}")]
    Index(#[from] PatternError),

    #[error("Periodic reload requires a running tokio runtime")]
    NoRuntime,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Failed to access configuration file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for query operations
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Result type alias for controller operations
pub type ControllerResult<T> = std::result::Result<T, ControllerError>;

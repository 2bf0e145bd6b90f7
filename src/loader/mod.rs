//! Rule loaders
//!
//! A loader is a zero-argument source of a [`RuleSet`]. The controller calls it
//! once at construction and again on every reload, so loaders backed by
//! storage should re-read that storage on each call.
//!
//! Any `Fn() -> Result<RuleSet, LoaderError>` closure is a loader, which is
//! the simplest way to plug in a database or remote source.

pub mod advanced;
pub mod file;

pub use advanced::{AdvancedRule, AdvancedRulesLoader};
pub use file::{JsonFileLoader, RulesFormat, YamlFileLoader};

use crate::access_control::RuleSet;
use crate::error::LoaderError;

/// Source of rules for a controller
pub trait RuleLoader: Send + Sync {
    /// Produce the current rule set
    fn load(&self) -> Result<RuleSet, LoaderError>;
}

impl<F> RuleLoader for F
where
    F: Fn() -> Result<RuleSet, LoaderError> + Send + Sync,
{
    fn load(&self) -> Result<RuleSet, LoaderError> {
        self()
    }
}

/// Loader returning a fixed, in-memory rule set
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    rules: RuleSet,
}

impl StaticLoader {
    pub fn new(rules: impl Into<RuleSet>) -> Self {
        Self {
            rules: rules.into(),
        }
    }
}

impl RuleLoader for StaticLoader {
    fn load(&self) -> Result<RuleSet, LoaderError> {
        Ok(self.rules.clone())
    }
}

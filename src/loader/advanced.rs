//! Compact rule templates
//!
//! An [`AdvancedRule`] lists several hosts, paths and methods at once and
//! expands into one [`Rule`] per combination, all sharing the same permission.

use crate::access_control::{Permission, Resource, Rule, RuleSet};
use crate::error::LoaderError;
use crate::loader::RuleLoader;
use serde::{Deserialize, Serialize};

/// Template covering the cross product of its hosts, paths and methods
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedRule {
    /// Priority shared by every expanded rule
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub host: Vec<String>,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default)]
    pub method: Vec<String>,
    #[serde(flatten)]
    pub permission: Permission,
}

impl AdvancedRule {
    /// Expand into individual rules, hosts varying slowest
    pub fn expand(&self) -> impl Iterator<Item = Rule> + '_ {
        self.host.iter().flat_map(move |host| {
            self.path.iter().flat_map(move |path| {
                self.method.iter().map(move |method| {
                    Rule::new(
                        self.id,
                        Resource::new(host.as_str(), path.as_str(), method.as_str()),
                        self.permission.clone(),
                    )
                })
            })
        })
    }
}

/// Expand a list of templates into a rule set
pub fn expand_all(templates: &[AdvancedRule]) -> RuleSet {
    templates.iter().flat_map(|template| template.expand()).collect()
}

/// Loader serving the expansion of a fixed list of templates
#[derive(Debug, Clone, Default)]
pub struct AdvancedRulesLoader {
    templates: Vec<AdvancedRule>,
}

impl AdvancedRulesLoader {
    pub fn new(templates: Vec<AdvancedRule>) -> Self {
        Self { templates }
    }
}

impl RuleLoader for AdvancedRulesLoader {
    fn load(&self) -> Result<RuleSet, LoaderError> {
        Ok(expand_all(&self.templates))
    }
}

//! Versioned rule snapshot
//!
//! A snapshot pairs a validated rule set with the index built from it. The
//! controller swaps whole snapshots, so a query always sees rules and index
//! from the same load.

use crate::access_control::{PermissionState, Query, Rule, RuleSet, WildcardIndex, resolve};
use crate::error::PatternError;

#[derive(Debug)]
pub struct Snapshot {
    version: u64,
    rules: RuleSet,
    /// Maps resource patterns to positions in `rules`
    index: WildcardIndex<usize>,
}

impl Snapshot {
    /// Index `rules`; the rules are expected to be validated already
    pub fn build(version: u64, rules: RuleSet) -> Result<Self, PatternError> {
        let mut index = WildcardIndex::new();
        for (position, rule) in rules.iter().enumerate() {
            index.insert(&rule.resource.segments(), position)?;
        }

        Ok(Self {
            version,
            rules,
            index,
        })
    }

    /// Load counter, starting at 1 for the initial load
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Rules whose resource matches the query, in declaration order
    pub fn candidates(&self, query: &Query) -> Vec<&Rule> {
        let mut positions: Vec<usize> = self
            .index
            .query(&query.segments())
            .into_iter()
            .copied()
            .collect();
        positions.sort_unstable();

        positions
            .into_iter()
            .filter_map(|position| self.rules.get(position))
            .collect()
    }

    /// Decide the query for a caller holding `roles`
    pub fn decide<S: AsRef<str>>(&self, query: &Query, roles: &[S]) -> PermissionState {
        resolve(self.candidates(query), roles)
    }
}

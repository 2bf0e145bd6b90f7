//! Rule evaluation
//!
//! Resolution happens in two steps:
//! 1. Among the rules whose resource matched, pick the one with the highest ID
//! 2. Evaluate that rule's permission against the caller's roles
//!
//! Within a permission the layers apply in this order:
//! - `allow_anyone` grants, even without roles
//! - no roles at all is refused
//! - any forbidden role refuses, whatever else the caller holds
//! - any authorized role grants
//! - anything else is refused

use crate::access_control::patterns::{check_syntax, match_pattern};
use crate::access_control::types::{
    ANY_ROLE, Permission, PermissionState, Query, Resource, Rule, RuleSet,
};
use crate::error::{PatternError, RuleViolation, ValidationError, ViolationReason};
use tracing::trace;

impl Resource {
    /// Whether host, path and method of the query all match.
    ///
    /// Stops at the first segment that does not match.
    pub fn matches(&self, query: &Query) -> Result<bool, PatternError> {
        for (pattern, literal) in self.segments().into_iter().zip(query.segments()) {
            if !match_pattern(pattern, literal)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn violations(&self) -> Vec<ViolationReason> {
        let mut reasons = Vec::new();
        for (field, pattern) in ["host", "path", "method"].into_iter().zip(self.segments()) {
            if pattern.is_empty() {
                reasons.push(ViolationReason::IncompleteResource { field });
            } else if let Err(e) = check_syntax(pattern) {
                reasons.push(ViolationReason::MalformedPattern(e));
            }
        }
        reasons
    }
}

impl Permission {
    /// A permission must grant something to somebody
    pub fn is_valid(&self) -> bool {
        self.allow_anyone || !self.authorized_roles.is_empty() || !self.forbidden_roles.is_empty()
    }

    /// Decide whether a caller holding `roles` passes this permission
    pub fn grant<S: AsRef<str>>(&self, roles: &[S]) -> PermissionState {
        if self.allow_anyone {
            return PermissionState::Granted;
        }

        if roles.is_empty() {
            return PermissionState::Ungranted;
        }

        let listed = |list: &[String], role: &str| {
            list.iter().any(|entry| entry == ANY_ROLE || entry == role)
        };

        if roles
            .iter()
            .any(|role| listed(&self.forbidden_roles, role.as_ref()))
        {
            return PermissionState::Ungranted;
        }

        if roles
            .iter()
            .any(|role| listed(&self.authorized_roles, role.as_ref()))
        {
            return PermissionState::Granted;
        }

        PermissionState::Ungranted
    }
}

impl RuleSet {
    /// Check every rule, reporting all violations at once
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        for (position, rule) in self.iter().enumerate() {
            let mut reasons = rule.resource.violations();
            if !rule.permission.is_valid() {
                reasons.push(ViolationReason::EmptyPermission);
            }

            violations.extend(reasons.into_iter().map(|reason| RuleViolation {
                position,
                id: rule.id,
                reason,
            }));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations })
        }
    }

    /// Rules whose resource matches the query, in rule-set order.
    ///
    /// Linear scan the index is checked against.
    #[cfg(test)]
    pub(crate) fn matching(&self, query: &Query) -> Result<Vec<&Rule>, PatternError> {
        let mut matched = Vec::new();
        for rule in self {
            if rule.resource.matches(query)? {
                matched.push(rule);
            }
        }
        Ok(matched)
    }
}

/// Resolve the candidates that matched a query into a decision.
///
/// Only the permission of the highest ID counts. Among several rules sharing
/// that ID, the one yielded last wins, so callers pass candidates in
/// rule-set order to make the latest declaration authoritative.
pub fn resolve<'a, I, S>(candidates: I, roles: &[S]) -> PermissionState
where
    I: IntoIterator<Item = &'a Rule>,
    S: AsRef<str>,
{
    match candidates.into_iter().max_by_key(|rule| rule.id) {
        Some(rule) => {
            trace!(rule_id = rule.id, "Resolved governing rule");
            rule.permission.grant(roles)
        }
        None => PermissionState::Neglected,
    }
}

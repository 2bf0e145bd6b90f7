//! Access control types
//!
//! Core types used by the access control system: the resources rules
//! apply to, the permissions they carry, and the queries evaluated
//! against them.

use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker accepted in role lists meaning "any role held"
pub const ANY_ROLE: &str = "*";

/// Resource a rule applies to, as three wildcard patterns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Host pattern, e.g. `api-{prod,sit}.domain.com`
    #[serde(default)]
    pub host: String,
    /// Path pattern, e.g. `/api/**`
    #[serde(default)]
    pub path: String,
    /// Method pattern, e.g. `{GET,HEAD}`
    #[serde(default)]
    pub method: String,
}

impl Resource {
    pub fn new(host: impl Into<String>, path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            method: method.into(),
        }
    }

    /// Patterns in index order: host, path, method
    pub fn segments(&self) -> [&str; 3] {
        [&self.host, &self.path, &self.method]
    }
}

/// Who may access a resource
///
/// `forbidden_roles` takes precedence over `authorized_roles`, and
/// `allow_anyone` takes precedence over both. The `*` marker in either list
/// stands for any role, but a caller must hold at least one role for it to
/// apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub authorized_roles: Vec<String>,
    #[serde(default)]
    pub forbidden_roles: Vec<String>,
    /// Grants access to everyone, including callers without roles
    #[serde(default)]
    pub allow_anyone: bool,
}

impl Permission {
    /// Permission that lets every caller through
    pub fn anyone() -> Self {
        Self {
            allow_anyone: true,
            ..Default::default()
        }
    }

    /// Permission granted to holders of any of the given roles
    pub fn for_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            authorized_roles: roles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Add roles that are always refused
    pub fn forbidding<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Relationship between a resource and its permission
///
/// The higher the `id`, the higher the priority: when several rules match a
/// query only the permission of the highest one is evaluated. On disk the
/// resource and permission fields sit directly on the rule object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub id: i64,
    #[serde(flatten)]
    pub resource: Resource,
    #[serde(flatten)]
    pub permission: Permission,
}

impl Rule {
    pub fn new(id: i64, resource: Resource, permission: Permission) -> Self {
        Self {
            id,
            resource,
            permission,
        }
    }
}

/// Ordered collection of rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Rule> {
        self.0.get(position)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for RuleSet {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

/// One incoming request, described by literal values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub host: String,
    pub path: String,
    pub method: String,
}

impl Query {
    /// Build a query, rejecting empty fields
    pub fn new(
        host: impl Into<String>,
        path: impl Into<String>,
        method: impl Into<String>,
    ) -> Result<Self, QueryError> {
        let query = Self {
            host: host.into(),
            path: path.into(),
            method: method.into(),
        };

        for (field, value) in [
            ("host", &query.host),
            ("path", &query.path),
            ("method", &query.method),
        ] {
            if value.is_empty() {
                return Err(QueryError::missing(field));
            }
        }

        Ok(query)
    }

    /// Literals in index order: host, path, method
    pub fn segments(&self) -> [&str; 3] {
        [&self.host, &self.path, &self.method]
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    /// No decision could be made; only ever paired with an error
    #[default]
    Unknown,
    /// A matching rule admits the caller
    Granted,
    /// A matching rule refuses the caller
    Ungranted,
    /// No rule matched the request
    Neglected,
}

impl PermissionState {
    /// Granted in the strict sense: a rule explicitly admits the caller.
    ///
    /// Prefer this over [`is_loosely_granted`](Self::is_loosely_granted) so
    /// that requests nobody wrote a rule for stay closed.
    pub const fn is_granted(&self) -> bool {
        matches!(self, PermissionState::Granted)
    }

    /// Granted, or not covered by any rule at all
    pub const fn is_loosely_granted(&self) -> bool {
        matches!(self, PermissionState::Granted | PermissionState::Neglected)
    }

    pub const fn is_neglected(&self) -> bool {
        matches!(self, PermissionState::Neglected)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionState::Unknown => "Permission Unknown",
            PermissionState::Granted => "Permission Granted",
            PermissionState::Ungranted => "Permission Ungranted",
            PermissionState::Neglected => "Permission Neglected",
        }
    }
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_state_predicates() {
        assert!(PermissionState::Granted.is_granted());
        assert!(!PermissionState::Neglected.is_granted());
        assert!(!PermissionState::Ungranted.is_granted());
        assert!(!PermissionState::Unknown.is_granted());

        assert!(PermissionState::Granted.is_loosely_granted());
        assert!(PermissionState::Neglected.is_loosely_granted());
        assert!(!PermissionState::Ungranted.is_loosely_granted());
        assert!(!PermissionState::Unknown.is_loosely_granted());

        assert!(PermissionState::Neglected.is_neglected());
        assert!(!PermissionState::Granted.is_neglected());
    }

    #[test]
    fn test_permission_state_display() {
        assert_eq!(PermissionState::Granted.to_string(), "Permission Granted");
        assert_eq!(PermissionState::Ungranted.to_string(), "Permission Ungranted");
        assert_eq!(PermissionState::Neglected.to_string(), "Permission Neglected");
        assert_eq!(PermissionState::default().to_string(), "Permission Unknown");
    }

    #[test]
    fn test_rule_deserializes_flattened_fields() {
        let json = r#"{
            "id": 7,
            "host": "domain.com",
            "path": "/api/**",
            "method": "POST",
            "authorized_roles": ["editor"],
            "forbidden_roles": ["black_user"],
            "allow_anyone": false
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, 7);
        assert_eq!(rule.resource, Resource::new("domain.com", "/api/**", "POST"));
        assert_eq!(
            rule.permission,
            Permission::for_roles(["editor"]).forbidding(["black_user"])
        );
    }

    #[test]
    fn test_rule_missing_fields_default_to_empty() {
        let rule: Rule = serde_json::from_str(r#"{"host": "domain.com"}"#).unwrap();
        assert_eq!(rule.id, 0);
        assert!(rule.resource.path.is_empty());
        assert!(!rule.permission.allow_anyone);
    }

    #[test]
    fn test_rule_set_display_is_json() {
        let rules = RuleSet::new(vec![Rule::new(
            1,
            Resource::new("*", "**", "*"),
            Permission::anyone(),
        )]);
        let value: serde_json::Value = serde_json::from_str(&rules.to_string()).unwrap();
        assert_eq!(value[0]["id"], 1);
        assert_eq!(value[0]["host"], "*");
        assert_eq!(value[0]["allow_anyone"], true);
    }

    #[test]
    fn test_query_rejects_missing_fields() {
        assert!(Query::new("domain.com", "/", "GET").is_ok());
        assert_eq!(
            Query::new("", "/", "GET").unwrap_err(),
            QueryError::missing("host")
        );
        assert_eq!(
            Query::new("domain.com", "/", "").unwrap_err(),
            QueryError::missing("method")
        );
    }
}

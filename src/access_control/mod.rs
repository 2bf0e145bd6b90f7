//! Access control module
//!
//! Decides whether a caller holding a set of roles may access a request
//! described by host, path and method.
//!
//! ## Access Control Model
//!
//! A rule pairs a [`Resource`] (three wildcard patterns) with a
//! [`Permission`]. For a given query:
//!
//! 1. Every rule whose host, path and method patterns all match is a candidate
//! 2. No candidate at all means the request is [`PermissionState::Neglected`]
//! 3. Otherwise only the candidate with the highest `id` is evaluated
//!
//! Within the permission, `allow_anyone` admits everyone, any forbidden role
//! refuses, and any authorized role admits. `*` in a role list stands for any
//! role the caller holds.
//!
//! ## Example Rules
//!
//! ```yaml
//! - id: 0
//!   host: "*"
//!   path: "**"
//!   method: "*"
//!   authorized_roles: ["*"]
//!   forbidden_roles: ["black_user"]
//! - id: 1
//!   host: "api-{prod,sit}.domain.com"
//!   path: "/article/**"
//!   method: "{POST,DELETE}"
//!   authorized_roles: ["editor"]
//! ```

pub mod index;
pub mod patterns;
pub mod resolver;
pub mod types;

pub use index::WildcardIndex;
pub use patterns::{Pattern, check_syntax, has_wildcard_prefix, literal_prefix, match_pattern};
pub use resolver::resolve;
pub use types::{ANY_ROLE, Permission, PermissionState, Query, Resource, Rule, RuleSet};

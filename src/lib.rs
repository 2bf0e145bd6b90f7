//! rolegate
//!
//! Role-based access control for HTTP-shaped requests, driven by hot-reloaded
//! rule files.
//!
//! ## Features
//!
//! - **Wildcard resources** - host, path and method patterns with `*`, `**`,
//!   `?`, `[...]` classes and `{a,b}` alternation
//! - **Priority rules** - the matching rule with the highest ID decides
//! - **Hot reload** - JSON/YAML rule files are re-read on a schedule and swapped
//!   in atomically; a broken file never replaces working rules
//! - **axum middleware** for guarding routers
//!
//! ## Permission Model
//!
//! ```text
//! request → matching rules → highest ID → allow_anyone / forbidden / authorized
//! ```
//!
//! A request no rule matches is *neglected*: callers choose whether that
//! means allowed ([`PermissionState::is_loosely_granted`]) or denied
//! ([`PermissionState::is_granted`]).
//!
//! ## Example Configuration
//!
//! ```toml
//! [rules]
//! path = "/etc/rolegate/rules.yaml"
//! reload_interval_secs = 10       # negative disables reloading
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

pub mod access_control;
pub mod config;
pub mod controller;
pub mod error;
pub mod loader;
pub mod middleware;

// Re-export main types
pub use access_control::{Permission, PermissionState, Query, Resource, Rule, RuleSet};
pub use config::{EngineConfig, load_config};
pub use controller::{Controller, ControllerOption, ReloadSchedule};
pub use error::{AppError, Result};
pub use loader::RuleLoader;

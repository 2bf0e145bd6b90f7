//! Controller construction options

use crate::access_control::RuleSet;
use crate::error::LoaderError;
use crate::loader::{
    AdvancedRule, AdvancedRulesLoader, JsonFileLoader, RuleLoader, StaticLoader, YamlFileLoader,
};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Period used when none, or a sub-second one, is configured
pub const DEFAULT_RELOAD_PERIOD: Duration = Duration::from_secs(5);

/// Shortest period honored as configured
pub const MIN_RELOAD_PERIOD: Duration = Duration::from_secs(1);

/// How often the controller re-runs its loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadSchedule {
    /// Load once at construction only
    Disabled,
    /// Reload on a fixed period
    Every(Duration),
}

impl ReloadSchedule {
    /// Schedule from a signed number of seconds; negative disables reloading
    pub fn from_secs(secs: i64) -> Self {
        match u64::try_from(secs) {
            Ok(secs) => Self::Every(Duration::from_secs(secs)),
            Err(_) => Self::Disabled,
        }
    }

    /// Effective period, with sub-second periods raised to the default
    pub fn period(&self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(period) if *period < MIN_RELOAD_PERIOD => Some(DEFAULT_RELOAD_PERIOD),
            Self::Every(period) => Some(*period),
        }
    }
}

impl Default for ReloadSchedule {
    fn default() -> Self {
        Self::Every(DEFAULT_RELOAD_PERIOD)
    }
}

/// One step of controller configuration, applied in order
#[derive(Clone)]
pub enum ControllerOption {
    /// Use this loader, reloading on the given schedule
    Loader {
        loader: Arc<dyn RuleLoader>,
        schedule: ReloadSchedule,
    },
    /// Replace the schedule set by an earlier option
    Schedule(ReloadSchedule),
}

impl fmt::Debug for ControllerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loader { schedule, .. } => f
                .debug_struct("Loader")
                .field("schedule", schedule)
                .finish_non_exhaustive(),
            Self::Schedule(schedule) => f.debug_tuple("Schedule").field(schedule).finish(),
        }
    }
}

/// Load rules from a JSON file, failing now if it cannot be read or parsed
pub fn with_json(
    path: impl Into<PathBuf>,
    schedule: ReloadSchedule,
) -> Result<ControllerOption, LoaderError> {
    Ok(with_loader(JsonFileLoader::new(path)?, schedule))
}

/// Load rules from a YAML file, failing now if it cannot be read or parsed
pub fn with_yaml(
    path: impl Into<PathBuf>,
    schedule: ReloadSchedule,
) -> Result<ControllerOption, LoaderError> {
    Ok(with_loader(YamlFileLoader::new(path)?, schedule))
}

/// Serve a fixed rule set; periodic reloading is disabled
pub fn with_rules(rules: impl Into<RuleSet>) -> ControllerOption {
    with_loader(StaticLoader::new(rules), ReloadSchedule::Disabled)
}

/// Serve the expansion of rule templates; periodic reloading is disabled
pub fn with_advanced_rules(templates: Vec<AdvancedRule>) -> ControllerOption {
    with_loader(AdvancedRulesLoader::new(templates), ReloadSchedule::Disabled)
}

/// Use a custom loader
pub fn with_loader(loader: impl RuleLoader + 'static, schedule: ReloadSchedule) -> ControllerOption {
    ControllerOption::Loader {
        loader: Arc::new(loader),
        schedule,
    }
}

/// Override the reload schedule chosen by the loader option
pub fn with_reload_schedule(schedule: ReloadSchedule) -> ControllerOption {
    ControllerOption::Schedule(schedule)
}

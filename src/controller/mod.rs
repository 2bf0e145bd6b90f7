//! Policy controller
//!
//! The controller owns a loader and the live [`Snapshot`] built from it.
//! Queries read the current snapshot without locking; reloads build a new
//! snapshot on the side and swap it in atomically, so a failed reload leaves
//! the previous rules serving.
//!
//! ```no_run
//! use rolegate::controller::{Controller, ReloadSchedule, with_yaml};
//!
//! # async fn run() -> rolegate::Result<()> {
//! let controller = Controller::new([with_yaml("rules.yaml", ReloadSchedule::default())?])?;
//! let state = controller.query("api-prod.domain.com", "/article", "POST", &["editor"])?;
//! if state.is_granted() {
//!     // serve the request
//! }
//! # Ok(())
//! # }
//! ```

pub mod options;
pub mod snapshot;

pub use options::{
    ControllerOption, DEFAULT_RELOAD_PERIOD, MIN_RELOAD_PERIOD, ReloadSchedule, with_advanced_rules,
    with_json, with_loader, with_reload_schedule, with_rules, with_yaml,
};
pub use snapshot::Snapshot;

use crate::access_control::{PermissionState, Query};
use crate::error::{ControllerError, ControllerResult, QueryError, QueryResult};
use crate::loader::RuleLoader;
use arc_swap::ArcSwap;
use axum::http::{Request, header};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared between the controller and its reload task
struct Shared {
    loader: Arc<dyn RuleLoader>,
    live: ArcSwap<Snapshot>,
    /// Serializes reloads so versions increase one at a time
    reload_lock: Mutex<()>,
}

impl Shared {
    fn reload(&self) -> ControllerResult<Arc<Snapshot>> {
        let _guard = self.reload_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let rules = self.loader.load()?;
        rules.validate()?;

        let version = self.live.load().version() + 1;
        let snapshot = Arc::new(Snapshot::build(version, rules)?);
        self.live.store(Arc::clone(&snapshot));

        info!(version, rules = snapshot.rules().len(), "Rules reloaded");
        Ok(snapshot)
    }
}

/// Access controller answering permission queries against loaded rules
pub struct Controller {
    shared: Arc<Shared>,
    schedule: ReloadSchedule,
    cancel: CancellationToken,
}

impl Controller {
    /// Build a controller from options applied in order.
    ///
    /// Fails if no option configured a loader, or if the initial load does
    /// not produce a valid rule set. When periodic reloading is enabled this
    /// must be called from within a tokio runtime.
    pub fn new<I>(options: I) -> ControllerResult<Self>
    where
        I: IntoIterator<Item = ControllerOption>,
    {
        let mut loader = None;
        let mut schedule = ReloadSchedule::default();

        for option in options {
            match option {
                ControllerOption::Loader {
                    loader: configured,
                    schedule: configured_schedule,
                } => {
                    loader = Some(configured);
                    schedule = configured_schedule;
                }
                ControllerOption::Schedule(configured) => schedule = configured,
            }
        }

        let loader = loader.ok_or(ControllerError::UndefinedLoader)?;

        let rules = loader.load()?;
        rules.validate()?;
        let snapshot = Snapshot::build(1, rules)?;
        info!(version = 1, rules = snapshot.rules().len(), "Rules loaded");

        let controller = Self {
            shared: Arc::new(Shared {
                loader,
                live: ArcSwap::from_pointee(snapshot),
                reload_lock: Mutex::new(()),
            }),
            schedule,
            cancel: CancellationToken::new(),
        };

        match schedule.period() {
            Some(period) => controller.spawn_reloader(period)?,
            None => warn!("Periodic rule reloading is disabled"),
        }

        Ok(controller)
    }

    fn spawn_reloader(&self, period: Duration) -> ControllerResult<()> {
        let handle = Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;
        let shared = Arc::clone(&self.shared);
        let cancel = self.cancel.clone();

        handle.spawn(async move {
            info!(period_secs = period.as_secs(), "Starting periodic rule reload");

            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        debug!("Scheduled rule reload");
                        // Loaders may do blocking I/O
                        let shared = Arc::clone(&shared);
                        match tokio::task::spawn_blocking(move || shared.reload()).await {
                            Ok(Ok(_)) => {}
                            Ok(Err(e)) => {
                                error!(error = %e, "Scheduled rule reload failed, keeping previous rules");
                            }
                            Err(e) => {
                                error!(error = %e, "Scheduled rule reload task failed, keeping previous rules");
                            }
                        }
                    }
                }
            }

            debug!("Periodic rule reload stopped");
        });

        Ok(())
    }

    /// Decide whether a caller holding `roles` may access the request
    pub fn query<S: AsRef<str>>(
        &self,
        host: &str,
        path: &str,
        method: &str,
        roles: &[S],
    ) -> QueryResult<PermissionState> {
        let query = Query::new(host, path, method)?;
        Ok(self.query_with(&query, roles))
    }

    /// Decide an already-built query
    pub fn query_with<S: AsRef<str>>(&self, query: &Query, roles: &[S]) -> PermissionState {
        let snapshot = self.shared.live.load();
        let state = snapshot.decide(query, roles);
        debug!(
            host = %query.host,
            path = %query.path,
            method = %query.method,
            version = snapshot.version(),
            %state,
            "Permission decided"
        );
        state
    }

    /// Decide an HTTP request.
    ///
    /// The host comes from the `Host` header, falling back to the URI
    /// authority.
    pub fn query_request<B, S: AsRef<str>>(
        &self,
        request: &Request<B>,
        roles: &[S],
    ) -> QueryResult<PermissionState> {
        let host = request
            .headers()
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| request.uri().authority().map(|authority| authority.as_str()))
            .ok_or_else(|| QueryError::missing("host"))?;

        self.query(host, request.uri().path(), request.method().as_str(), roles)
    }

    /// Run the loader now and swap in the result.
    ///
    /// On failure the current rules stay in effect and the error is returned.
    pub fn reload(&self) -> ControllerResult<()> {
        self.shared.reload().map(|_| ())
    }

    /// Rules and index currently in effect
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.live.load_full()
    }

    pub fn schedule(&self) -> ReloadSchedule {
        self.schedule
    }

    /// Stop periodic reloading. Queries keep working on the current rules.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("version", &self.shared.live.load().version())
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

//! axum middleware
//!
//! Guards a router with a [`Controller`]. Roles are read from a [`Roles`]
//! request extension, which an authentication layer placed in front of this
//! one is expected to insert.
//!
//! ```no_run
//! use axum::{Router, middleware, routing::get};
//! use rolegate::controller::{Controller, with_rules};
//! use rolegate::middleware::{Authorizer, GrantMode, authorize};
//! use std::sync::Arc;
//!
//! # fn build() -> rolegate::Result<Router> {
//! let controller = Arc::new(Controller::new([with_rules(rolegate::RuleSet::default())])?);
//! let app = Router::new()
//!     .route("/", get(|| async { "ok" }))
//!     .layer(middleware::from_fn_with_state(
//!         Authorizer::new(controller, GrantMode::Strict),
//!         authorize,
//!     ));
//! # Ok(app)
//! # }
//! ```

use crate::access_control::PermissionState;
use crate::controller::Controller;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Roles held by the caller of the current request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roles(pub Vec<String>);

impl Roles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(roles.into_iter().map(Into::into).collect())
    }
}

/// Which permission states let a request through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrantMode {
    /// Only requests a rule explicitly grants
    #[default]
    Strict,
    /// Also requests no rule covers
    Loose,
}

impl GrantMode {
    pub fn admits(&self, state: PermissionState) -> bool {
        match self {
            GrantMode::Strict => state.is_granted(),
            GrantMode::Loose => state.is_loosely_granted(),
        }
    }
}

/// Middleware state
#[derive(Debug, Clone)]
pub struct Authorizer {
    pub controller: Arc<Controller>,
    pub mode: GrantMode,
}

impl Authorizer {
    pub fn new(controller: Arc<Controller>, mode: GrantMode) -> Self {
        Self { controller, mode }
    }
}

/// Reject requests the controller does not admit.
///
/// Denied requests get `403 Forbidden`; requests that cannot be evaluated
/// get `500 Internal Server Error`.
pub async fn authorize(
    State(authorizer): State<Authorizer>,
    request: Request,
    next: Next,
) -> Response {
    let roles = request
        .extensions()
        .get::<Roles>()
        .map(|roles| roles.0.as_slice())
        .unwrap_or_default();

    match authorizer.controller.query_request(&request, roles) {
        Ok(state) if authorizer.mode.admits(state) => next.run(request).await,
        Ok(state) => {
            debug!(path = %request.uri().path(), %state, "Request denied");
            (StatusCode::FORBIDDEN, state.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to evaluate request permission");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_modes() {
        assert!(GrantMode::Strict.admits(PermissionState::Granted));
        assert!(!GrantMode::Strict.admits(PermissionState::Neglected));
        assert!(GrantMode::Loose.admits(PermissionState::Neglected));
        assert!(!GrantMode::Loose.admits(PermissionState::Ungranted));
        assert!(!GrantMode::Loose.admits(PermissionState::Unknown));
    }
}

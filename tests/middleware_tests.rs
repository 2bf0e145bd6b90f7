//! axum middleware tests

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    middleware,
    routing::get,
};
use rolegate::access_control::{Permission, Resource, Rule};
use rolegate::controller::{Controller, with_rules};
use rolegate::middleware::{Authorizer, GrantMode, Roles, authorize};
use std::sync::Arc;
use tower::ServiceExt;

fn controller() -> Arc<Controller> {
    let rules = vec![
        Rule::new(
            0,
            Resource::new("domain.com", "/public/**", "GET"),
            Permission::anyone(),
        ),
        Rule::new(
            1,
            Resource::new("domain.com", "/admin/**", "*"),
            Permission::for_roles(["admin"]).forbidding(["suspended"]),
        ),
    ];
    Arc::new(Controller::new([with_rules(rules)]).unwrap())
}

fn app(mode: GrantMode) -> Router {
    Router::new()
        .route("/public/index", get(|| async { "public" }))
        .route("/admin/users", get(|| async { "admin" }))
        .route("/other", get(|| async { "other" }))
        .layer(middleware::from_fn_with_state(
            Authorizer::new(controller(), mode),
            authorize,
        ))
}

fn request(path: &str, roles: &[&str]) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(header::HOST, "domain.com")
        .extension(Roles::new(roles.iter().copied()))
        .body(Body::empty())
        .unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_allow_anyone_route_passes_without_roles() {
    let response = app(GrantMode::Strict)
        .oneshot(request("/public/index", &[]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "public");
}

#[tokio::test]
async fn test_authorized_role_passes() {
    let response = app(GrantMode::Strict)
        .oneshot(request("/admin/users", &["admin"]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "admin");
}

#[tokio::test]
async fn test_forbidden_role_is_rejected() {
    let response = app(GrantMode::Strict)
        .oneshot(request("/admin/users", &["admin", "suspended"]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Permission Ungranted");
}

#[tokio::test]
async fn test_missing_roles_extension_means_no_roles() {
    let request = Request::builder()
        .uri("/admin/users")
        .header(header::HOST, "domain.com")
        .body(Body::empty())
        .unwrap();

    let response = app(GrantMode::Strict).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_uncovered_route_depends_on_mode() {
    let response = app(GrantMode::Strict)
        .oneshot(request("/other", &["admin"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_text(response).await, "Permission Neglected");

    let response = app(GrantMode::Loose)
        .oneshot(request("/other", &["admin"]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_host_falls_back_to_uri_authority() {
    let request = Request::builder()
        .uri("http://domain.com/public/index")
        .body(Body::empty())
        .unwrap();

    let response = app(GrantMode::Strict).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_without_host_is_an_error() {
    let request = Request::builder()
        .uri("/public/index")
        .body(Body::empty())
        .unwrap();

    let response = app(GrantMode::Strict).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_query_request_reads_request_parts() {
    let controller = controller();
    let request = Request::builder()
        .method("DELETE")
        .uri("/admin/users?page=2")
        .header(header::HOST, "domain.com")
        .body(())
        .unwrap();

    let state = controller.query_request(&request, &["admin"]).unwrap();
    assert!(state.is_granted());

    let state = controller.query_request(&request, &["visitor"]).unwrap();
    assert!(!state.is_granted());
}

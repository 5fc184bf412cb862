//! Integration tests for the gateway router.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot`; the
//! gateway needs no external infrastructure, so there is no child process or
//! container orchestration here.

use axum::{
    body::Body,
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    Router,
};
use piscina::piscina::{
    policy::{AllowList, Role},
    router,
    state::{GatewayConfig, GatewayState},
};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let mut roles = HashMap::new();
    roles.insert("a@x.com".to_string(), Role::Admin);
    let allow_list = AllowList::new(roles);
    let config = GatewayConfig::new("http://localhost:3000".to_string());
    router(Arc::new(GatewayState::new(config, allow_list)))
}

fn get(path: &str, cookies: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(path);
    if let Some(cookies) = cookies {
        builder = builder.header(COOKIE, cookies);
    }
    builder.body(Body::empty()).expect("request")
}

#[tokio::test]
async fn protected_page_without_token_redirects_to_login() {
    let response = app().oneshot(get("/dashboard", None)).await.expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/login")
    );
}

#[tokio::test]
async fn authorized_identity_reaches_the_dashboard() {
    let cookies = "session-token=tok; session-email=a@x.com";
    let response = app()
        .oneshot(get("/dashboard/visits", Some(cookies)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unlisted_identity_is_sent_to_the_denial_page() {
    let cookies = "session-token=tok; session-email=b@x.com";
    let response = app()
        .oneshot(get("/dashboard", Some(cookies)))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/denied")
    );
}

#[tokio::test]
async fn unlisted_identity_is_denied_even_on_public_pages() {
    let cookies = "session-token=tok; session-email=b@x.com";
    let response = app().oneshot(get("/login", Some(cookies))).await.expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/denied")
    );
}

#[tokio::test]
async fn authorized_identity_skips_the_login_page() {
    let cookies = "session-token=tok; session-email=a@x.com";
    let response = app().oneshot(get("/login", Some(cookies))).await.expect("response");

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/dashboard")
    );
}

#[tokio::test]
async fn denial_page_never_redirects() {
    // Even an unauthorized cookie set must land, or denial would loop.
    let cookies = "session-token=tok; session-email=b@x.com";
    let response = app().oneshot(get("/denied", Some(cookies))).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unmatched_paths_fall_through_without_redirect() {
    let response = app()
        .oneshot(get("/static/logo.png", None))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn issue_sets_the_session_cookies() {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/session/issue")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"token": "tok", "email": "a@x.com"}"#))
        .expect("request");

    let response = app().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies: Vec<_> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert!(cookies.iter().any(|c| c.starts_with("session-token=tok")));
    assert!(cookies.iter().any(|c| c.starts_with("session-email=a@x.com")));
}

#[tokio::test]
async fn issue_without_a_token_is_rejected() {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/session/issue")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"token": ""}"#))
        .expect("request");

    let response = app().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn revoke_clears_the_session_cookies() {
    let request = Request::builder()
        .method("POST")
        .uri("/auth/session/revoke")
        .body(Body::empty())
        .expect("request");

    let response = app().oneshot(request).await.expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookies: Vec<_> = response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    assert_eq!(cookies.len(), 2);
    assert!(cookies.iter().all(|c| c.contains("Max-Age=0")));
}

#[tokio::test]
async fn health_is_reachable_without_cookies() {
    let response = app().oneshot(get("/health", None)).await.expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-App"));
}

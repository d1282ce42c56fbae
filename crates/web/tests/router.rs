//! Router smoke tests.
//!
//! These exercise the full layer stack without a database: the pool is lazy
//! and points nowhere, so only paths that never touch it are checked here.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::FixedOffset;
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use url::Url;

use foodievent_web::app;
use foodievent_web::config::WebConfig;
use foodievent_web::middleware::request_id::REQUEST_ID_HEADER;
use foodievent_web::state::AppState;

const UNREACHABLE_DB: &str = "postgres://foodievent@127.0.0.1:1/foodievent";

fn test_app() -> Router {
    let config = WebConfig {
        database_url: SecretString::from(UNREACHABLE_DB),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: Url::parse("http://localhost:3000").unwrap(),
        upload_dir: PathBuf::from("static/img"),
        max_upload_bytes: 1024 * 1024,
        status_refresh: None,
        utc_offset: FixedOffset::east_opt(10 * 3600).unwrap(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    };
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(250))
        .connect_lazy(UNREACHABLE_DB)
        .unwrap();

    app(AppState::new(config, pool))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = test_app().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    assert!(
        response
            .headers()
            .contains_key(header::CONTENT_SECURITY_POLICY)
    );
    assert_eq!(body_text(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_without_database() {
    let response = test_app().oneshot(get("/health/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "proxy-42")
        .body(Body::empty())
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(
        response.headers().get(REQUEST_ID_HEADER).unwrap(),
        "proxy-42"
    );
}

#[tokio::test]
async fn test_unknown_path_renders_not_found_page() {
    let response = test_app().oneshot(get("/no/such/page")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("404"));
    assert!(html.contains("FoodieVent"));
}

#[tokio::test]
async fn test_unknown_category_is_not_found() {
    let response = test_app().oneshot(get("/category/brunch")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_page_renders() {
    let response = test_app().oneshot(get("/auth/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"action="/auth/login""#));
    assert!(html.contains(r#"href="/category/food""#));
}

#[tokio::test]
async fn test_register_page_renders() {
    let response = test_app().oneshot(get("/auth/register")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains(r#"name="confirm""#));
}

#[tokio::test]
async fn test_member_pages_redirect_to_login() {
    for uri in ["/account/bookings", "/events/create", "/events/1/update"] {
        let response = test_app().oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{uri}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login",
            "{uri}"
        );
    }
}

#[tokio::test]
async fn test_purchase_requires_login() {
    let request = Request::builder()
        .method("POST")
        .uri("/orders/1/purchase")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("quantity=2"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/auth/login"
    );
}

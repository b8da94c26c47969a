//! Error pipeline: status selection, content negotiation and stack exposure.

use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower::ServiceExt;
use user_frontend::config::{AppConfig, Environment};
use user_frontend::http::error::{error_pipeline, AppError};
use user_frontend::http::FrontendServer;

mod common;

use common::{body_json, body_text, get as get_request, send, test_config, StubApi};

fn failing_app(environment: Environment) -> Router {
    Router::new()
        .route(
            "/teapot",
            get(|| async { AppError::with_status(StatusCode::IM_A_TEAPOT, "short and stout") }),
        )
        .route(
            "/boom",
            get(|| async { AppError::from(anyhow::anyhow!("disk on fire")) }),
        )
        .layer(from_fn_with_state(environment, error_pipeline))
}

#[tokio::test]
async fn unknown_path_is_404_naming_the_path() {
    let server = FrontendServer::new(test_config(), Arc::new(StubApi::default()));

    let response = send(&server, get_request("/no/such/page?x=1")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    let html = body_text(response).await;
    assert!(html.contains("Not Found - /no/such/page?x=1"));
}

#[tokio::test]
async fn api_clients_get_json_errors() {
    let server = FrontendServer::new(test_config(), Arc::new(StubApi::default()));

    let mut request = get_request("/missing");
    request
        .headers_mut()
        .insert("x-requested-with", "XMLHttpRequest".parse().unwrap());
    let response = send(&server, request).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Not Found - /missing");
    assert_eq!(body["status"], 404);
    assert!(body.get("stack").is_some());
}

#[tokio::test]
async fn production_never_exposes_the_stack() {
    let config = AppConfig {
        environment: Environment::Production,
        ..test_config()
    };
    let server = FrontendServer::new(config, Arc::new(StubApi::default()));

    let mut request = get_request("/missing");
    request
        .headers_mut()
        .insert(header::ACCEPT, "application/json".parse().unwrap());
    let body = body_json(send(&server, request).await).await;
    assert_eq!(body["status"], 404);
    assert!(body.get("stack").is_none());

    let html = body_text(send(&server, get_request("/missing")).await).await;
    assert!(!html.contains("<pre>"));
}

#[tokio::test]
async fn explicit_status_is_preserved() {
    let response = failing_app(Environment::Development)
        .oneshot(get_request("/teapot"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert!(body_text(response).await.contains("short and stout"));
}

#[tokio::test]
async fn unexpected_errors_are_500_with_generic_message() {
    let mut request = get_request("/boom");
    request
        .headers_mut()
        .insert(header::ACCEPT, "application/json".parse().unwrap());

    let response = failing_app(Environment::Production)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Internal Server Error");
    assert!(!body.to_string().contains("disk on fire"));
}

#[tokio::test]
async fn development_shows_the_cause() {
    let html = body_text(
        failing_app(Environment::Development)
            .oneshot(get_request("/boom"))
            .await
            .unwrap(),
    )
    .await;
    assert!(html.contains("disk on fire"));
}

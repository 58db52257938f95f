//! Integration tests for the refresh and identity endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serenity_api::{models::*, ApiServer, ApiServerConfig};
use serenity_auth::{AuthorityConfig, ExtraClaims, ManualClock, TokenAuthority};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "api-integration-secret-0123456789";
const START: i64 = 1_760_000_000;

/// Helper to create a router over an authority with a simulated clock
fn create_test_app(access_ttl: i64) -> (Router, Arc<TokenAuthority>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let authority = Arc::new(
        TokenAuthority::with_clock(
            AuthorityConfig::new(SECRET).with_access_ttl(access_ttl),
            clock.clone(),
        )
        .expect("Failed to build authority"),
    );

    let server = ApiServer::new(
        ApiServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            enable_cors: false,
        },
        authority.clone(),
    );

    (server.build_router(), authority, clock)
}

fn refresh_request(refresh_token: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/auth/refresh")
        .method("POST")
        .header("content-type", "application/json")
        .body(Body::from(
            serde_json::to_string(&json!({ "refresh_token": refresh_token })).unwrap(),
        ))
        .unwrap()
}

fn me_request(access_token: &str) -> Request<Body> {
    Request::builder()
        .uri("/api/auth/me")
        .header("Authorization", format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _, _) = create_test_app(3600);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = read_json(response).await;
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_refresh_returns_new_pair() {
    let (app, authority, _) = create_test_app(900);
    let pair = authority.issue_pair("u1", None).unwrap();

    let response = app.oneshot(refresh_request(&pair.refresh_token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let rotated: TokenPairResponse = read_json(response).await;

    assert_eq!(rotated.token_type, "Bearer");
    assert_eq!(rotated.expires_in, 900);
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    let claims = authority.validate(&rotated.access_token).unwrap();
    assert_eq!(claims.subject_id(), "u1");
}

#[tokio::test]
async fn test_refresh_with_access_token_rejected() {
    let (app, authority, _) = create_test_app(900);
    let pair = authority.issue_pair("u1", None).unwrap();

    let response = app.oneshot(refresh_request(&pair.access_token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code.as_deref(), Some("WRONG_TOKEN_TYPE"));
}

#[tokio::test]
async fn test_refresh_with_garbage_rejected() {
    let (app, _, _) = create_test_app(900);

    let response = app.oneshot(refresh_request("garbage")).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code.as_deref(), Some("MALFORMED_TOKEN"));
}

#[tokio::test]
async fn test_refresh_without_token_field_rejected() {
    let (app, _, _) = create_test_app(900);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/refresh")
                .method("POST")
                .header("content-type", "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code.as_deref(), Some("MISSING_TOKEN"));
}

#[tokio::test]
async fn test_refresh_with_unparseable_body_rejected() {
    let (app, _, _) = create_test_app(900);

    for (content_type, body) in [
        ("application/json", "not json"),
        ("text/plain", r#"{"refresh_token":"x"}"#),
        ("application/json", ""),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/refresh")
                    .method("POST")
                    .header("content-type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "body {:?}", body);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.code.as_deref(), Some("MISSING_TOKEN"));
        assert_eq!(error.error, "Missing bearer token");
    }
}

#[tokio::test]
async fn test_me_returns_identity() {
    let (app, authority, clock) = create_test_app(600);

    let mut extra = ExtraClaims::new();
    extra.insert("role".to_string(), "admin".into());
    extra.insert("team_id".to_string(), 12i64.into());
    let pair = authority.issue_pair("user_42", Some(&extra)).unwrap();

    clock.advance(100);

    let response = app.oneshot(me_request(&pair.access_token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let me: CurrentUserResponse = read_json(response).await;

    assert_eq!(me.subject_id, "user_42");
    assert_eq!(me.token_type, "access");
    assert_eq!(me.issued_at, START);
    assert_eq!(me.expires_at, START + 600);
    assert_eq!(me.remaining_seconds, 500);
    assert_eq!(me.claims["role"], "admin");
    assert_eq!(me.claims["team_id"], 12);
}

#[tokio::test]
async fn test_me_rejects_refresh_token() {
    let (app, authority, _) = create_test_app(600);
    let pair = authority.issue_pair("user_42", None).unwrap();

    let response = app.oneshot(me_request(&pair.refresh_token)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_then_refresh() {
    let (app, authority, clock) = create_test_app(2);
    let pair = authority.issue_pair("user_42", None).unwrap();

    let response = app
        .clone()
        .oneshot(me_request(&pair.access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    clock.advance(3);

    let response = app
        .clone()
        .oneshot(me_request(&pair.access_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.code.as_deref(), Some("TOKEN_EXPIRED"));

    let response = app
        .clone()
        .oneshot(refresh_request(&pair.refresh_token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated: TokenPairResponse = read_json(response).await;

    let response = app.oneshot(me_request(&rotated.access_token)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let me: CurrentUserResponse = read_json(response).await;
    assert_eq!(me.subject_id, "user_42");
}

#[tokio::test]
async fn test_openapi_document_served() {
    let (app, _, _) = create_test_app(600);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let doc: serde_json::Value = read_json(response).await;
    assert_eq!(doc["info"]["title"], "Serenity Auth API");
}

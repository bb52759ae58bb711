use super::common::*;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::auth::{auth_router, AuthError, CurrentUser, TokenIssuer, TokenKind};

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn extract(authorization: Option<&str>, tokens: &Arc<TokenIssuer>) -> Result<CurrentUser, AuthError> {
    let mut builder = Request::get("/v1/color/questions");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (mut parts, _) = builder.body(()).expect("request builds").into_parts();
    CurrentUser::from_request_parts(&mut parts, tokens).await
}

#[tokio::test]
async fn login_route_returns_token_pair() {
    let router = auth_router(Arc::new(memory_service()));
    let response = router
        .oneshot(post_json(
            "/v1/auth/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["token_type"], json!("bearer"));
    assert!(payload["access_token"].as_str().is_some());
    assert!(payload["refresh_token"].as_str().is_some());
}

#[tokio::test]
async fn login_route_maps_errors_to_statuses() {
    let router = auth_router(Arc::new(memory_service()));

    let missing = router
        .clone()
        .oneshot(post_json("/v1/auth/login", json!({ "email": EMAIL })))
        .await
        .expect("route executes");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let rejected = router
        .oneshot(post_json(
            "/v1/auth/login",
            json!({ "email": EMAIL, "password": "wrong" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(rejected.status(), StatusCode::UNAUTHORIZED);
    let payload = read_json_body(rejected).await;
    assert_eq!(payload["error"], json!("Invalid credentials"));
}

#[tokio::test]
async fn provider_outage_is_an_internal_error() {
    let service = crate::auth::AuthService::new(Arc::new(OfflineIdentity), issuer());
    let response = auth_router(Arc::new(service))
        .oneshot(post_json(
            "/v1/auth/login",
            json!({ "email": EMAIL, "password": PASSWORD }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn refresh_route_rejects_expired_or_invalid_tokens() {
    let router = auth_router(Arc::new(memory_service()));
    let response = router
        .oneshot(post_json(
            "/v1/auth/refresh",
            json!({ "refresh_token": "not.a.token" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_requires_an_access_token() {
    let tokens = issuer();
    let access = tokens
        .issue("user-7", Some(EMAIL), TokenKind::Access)
        .expect("token signs");
    let refresh = tokens
        .issue("user-7", Some(EMAIL), TokenKind::Refresh)
        .expect("token signs");

    let user = extract(Some(&format!("Bearer {access}")), &tokens)
        .await
        .expect("access token accepted");
    assert_eq!(user.id, "user-7");

    assert!(matches!(
        extract(None, &tokens).await,
        Err(AuthError::Unauthorized("Missing credentials"))
    ));
    assert!(matches!(
        extract(Some(&format!("Basic {access}")), &tokens).await,
        Err(AuthError::Unauthorized("Missing credentials"))
    ));
    assert!(matches!(
        extract(Some(&format!("Bearer {refresh}")), &tokens).await,
        Err(AuthError::Unauthorized("Invalid token type"))
    ));
    assert!(matches!(
        extract(Some("Bearer garbage"), &tokens).await,
        Err(AuthError::Unauthorized("Invalid token"))
    ));
}

#[tokio::test]
async fn malformed_login_bodies_are_json_bad_requests() {
    let router = auth_router(Arc::new(memory_service()));
    let request = Request::post("/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"email\": "))
        .expect("request builds");

    let response = router.oneshot(request).await.expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().is_some());
}

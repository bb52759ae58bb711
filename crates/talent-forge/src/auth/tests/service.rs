use super::common::*;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService, LoginRequest, RefreshRequest, TokenKind};

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: Some(email.to_string()),
        password: Some(password.to_string()),
    }
}

#[tokio::test]
async fn login_issues_access_and_refresh_tokens() {
    let service = memory_service();
    let pair = service
        .login(login_request(EMAIL, PASSWORD))
        .await
        .expect("login succeeds");

    assert_eq!(pair.token_type, "bearer");
    let tokens = service.tokens();
    let access = tokens.decode(&pair.access_token).expect("access verifies");
    let refresh = tokens.decode(&pair.refresh_token).expect("refresh verifies");
    assert_eq!(access.kind, TokenKind::Access);
    assert_eq!(refresh.kind, TokenKind::Refresh);
    assert_eq!(access.sub, refresh.sub);
    assert_eq!(access.email.as_deref(), Some(EMAIL));
    assert!(refresh.exp > access.exp);
}

#[tokio::test]
async fn login_requires_both_fields() {
    let service = memory_service();
    let request = LoginRequest {
        email: Some(EMAIL.to_string()),
        password: Some("  ".to_string()),
    };
    match service.login(request).await {
        Err(AuthError::BadRequest(message)) => {
            assert_eq!(message, "email and password are required")
        }
        other => panic!("expected bad request, got {other:?}"),
    }
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let service = memory_service();
    match service.login(login_request(EMAIL, "nope")).await {
        Err(AuthError::Unauthorized(message)) => assert_eq!(message, "Invalid credentials"),
        other => panic!("expected unauthorized, got {other:?}"),
    }
}

#[tokio::test]
async fn login_surfaces_provider_outages() {
    let service = AuthService::new(Arc::new(OfflineIdentity), issuer());
    assert!(matches!(
        service.login(login_request(EMAIL, PASSWORD)).await,
        Err(AuthError::Provider(_))
    ));
}

#[tokio::test]
async fn refresh_exchanges_refresh_tokens_only() {
    let service = memory_service();
    let pair = service
        .login(login_request(EMAIL, PASSWORD))
        .await
        .expect("login succeeds");

    let refreshed = service
        .refresh(RefreshRequest {
            refresh_token: Some(pair.refresh_token.clone()),
        })
        .await
        .expect("refresh succeeds");
    let claims = service
        .tokens()
        .decode(&refreshed.access_token)
        .expect("new access token verifies");
    assert_eq!(claims.kind, TokenKind::Access);

    match service
        .refresh(RefreshRequest {
            refresh_token: Some(pair.access_token),
        })
        .await
    {
        Err(AuthError::Unauthorized(message)) => assert_eq!(message, "Invalid token type"),
        other => panic!("expected token type rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn refresh_requires_a_token() {
    let service = memory_service();
    assert!(matches!(
        service.refresh(RefreshRequest::default()).await,
        Err(AuthError::BadRequest("refresh_token is required"))
    ));
    assert!(matches!(
        service
            .refresh(RefreshRequest {
                refresh_token: Some("garbage".to_string()),
            })
            .await,
        Err(AuthError::Unauthorized("Invalid token"))
    ));
}

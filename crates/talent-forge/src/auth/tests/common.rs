use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use chrono::Duration;
use serde_json::Value;

use crate::auth::{
    AuthService, Identity, IdentityError, IdentityProvider, MemoryIdentityProvider, TokenIssuer,
};

pub(super) const EMAIL: &str = "recrutadora@talentforge.dev";
pub(super) const PASSWORD: &str = "correct horse";

pub(super) fn issuer() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        "unit-test-secret",
        Duration::minutes(60),
        Duration::days(7),
    ))
}

pub(super) fn memory_service() -> AuthService<MemoryIdentityProvider> {
    let identity = MemoryIdentityProvider::new().with_account(EMAIL, PASSWORD);
    AuthService::new(Arc::new(identity), issuer())
}

/// Provider whose backend is always down.
pub(super) struct OfflineIdentity;

#[async_trait]
impl IdentityProvider for OfflineIdentity {
    async fn sign_in(&self, _email: &str, _password: &str) -> Result<Identity, IdentityError> {
        Err(IdentityError::Unavailable("connection refused".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

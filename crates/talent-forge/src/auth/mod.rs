//! Bearer-token authentication: password login through an identity provider, HS256
//! access/refresh tokens, and the [`CurrentUser`] extractor guarding protected routes.

pub mod extract;
pub mod identity;
pub mod router;
pub mod service;
pub mod tokens;

#[cfg(test)]
mod tests;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

pub use extract::CurrentUser;
pub use identity::{
    GoTrueIdentityProvider, Identity, IdentityError, IdentityProvider, MemoryIdentityProvider,
};
pub use router::auth_router;
pub use service::{AuthService, LoginRequest, RefreshRequest, RefreshedToken, TokenPair};
pub use tokens::{Claims, TokenIssuer, TokenKind};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("identity provider unavailable: {0}")]
    Provider(String),
    #[error("token signing failed: {0}")]
    Signing(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::BadRequest(message) => (StatusCode::BAD_REQUEST, *message),
            AuthError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, *message),
            AuthError::Provider(_) | AuthError::Signing(_) => {
                error!(error = %self, "authentication backend failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "authentication unavailable")
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

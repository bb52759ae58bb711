use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::tokens::{TokenIssuer, TokenKind};
use super::AuthError;

/// Caller identified by a valid access token in the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: String,
    pub email: Option<String>,
}

fn bearer(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<TokenIssuer>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer(parts).ok_or(AuthError::Unauthorized("Missing credentials"))?;
        let tokens = Arc::<TokenIssuer>::from_ref(state);

        let claims = tokens.decode(token)?;
        if claims.kind != TokenKind::Access {
            return Err(AuthError::Unauthorized("Invalid token type"));
        }

        Ok(CurrentUser {
            id: claims.sub,
            email: claims.email,
        })
    }
}

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::identity::{IdentityError, IdentityProvider};
use super::tokens::{TokenIssuer, TokenKind};
use super::AuthError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRequest {
    #[serde(default, alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub token_type: String,
}

const TOKEN_TYPE: &str = "bearer";

fn present(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Password login and refresh-token exchange.
pub struct AuthService<I> {
    identity: Arc<I>,
    tokens: Arc<TokenIssuer>,
}

impl<I> AuthService<I>
where
    I: IdentityProvider + 'static,
{
    pub fn new(identity: Arc<I>, tokens: Arc<TokenIssuer>) -> Self {
        Self { identity, tokens }
    }

    pub fn tokens(&self) -> Arc<TokenIssuer> {
        Arc::clone(&self.tokens)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<TokenPair, AuthError> {
        let (Some(email), Some(password)) = (present(request.email), present(request.password))
        else {
            return Err(AuthError::BadRequest("email and password are required"));
        };

        let identity = match self.identity.sign_in(email.trim(), &password).await {
            Ok(identity) => identity,
            Err(IdentityError::InvalidCredentials) => {
                warn!("login rejected");
                return Err(AuthError::Unauthorized("Invalid credentials"));
            }
            Err(IdentityError::Unavailable(message)) => return Err(AuthError::Provider(message)),
        };

        let email = identity.email.as_deref();
        let access_token = self
            .tokens
            .issue(&identity.id, email, TokenKind::Access)?;
        let refresh_token = self
            .tokens
            .issue(&identity.id, email, TokenKind::Refresh)?;
        info!(user_id = %identity.id, "login succeeded");

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Exchange a refresh token for a new access token. Access tokens are refused.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<RefreshedToken, AuthError> {
        let token = present(request.refresh_token)
            .ok_or(AuthError::BadRequest("refresh_token is required"))?;

        let claims = self.tokens.decode(token.trim())?;
        if claims.kind != TokenKind::Refresh {
            return Err(AuthError::Unauthorized("Invalid token type"));
        }

        let access_token =
            self.tokens
                .issue(&claims.sub, claims.email.as_deref(), TokenKind::Access)?;
        Ok(RefreshedToken {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }
}

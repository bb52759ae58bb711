use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::config::{AuthConfig, DatabaseConfig};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Password sign-in against an external user directory.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;
}

/// Hosted auth endpoint (`/auth/v1/token?grant_type=password`).
#[derive(Clone)]
pub struct GoTrueIdentityProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct SessionBody {
    user: Identity,
}

impl GoTrueIdentityProvider {
    pub fn new(config: &DatabaseConfig) -> Result<Self, IdentityError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
            api_key: config.service_role_key.clone(),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/auth/v1/token", self.base_url)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let response = self
            .client
            .post(self.token_url())
            .query(&[("grant_type", "password")])
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %message, "identity provider rejected sign-in");
            return Err(IdentityError::Unavailable(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        let body: SessionBody = response
            .json()
            .await
            .map_err(|err| IdentityError::Unavailable(err.to_string()))?;
        Ok(body.user)
    }
}

/// In-process accounts for development mode and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryIdentityProvider {
    accounts: HashMap<String, (String, Identity)>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the demo account from configuration, if one is set.
    pub fn from_config(config: &AuthConfig) -> Self {
        match &config.demo_account {
            Some(account) => Self::new().with_account(&account.email, &account.password),
            None => Self::new(),
        }
    }

    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        let identity = Identity {
            id: Uuid::new_v4().to_string(),
            email: Some(email.to_string()),
        };
        self.accounts
            .insert(email.to_lowercase(), (password.to_string(), identity));
        self
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        match self.accounts.get(&email.to_lowercase()) {
            Some((expected, identity)) if expected == password => Ok(identity.clone()),
            _ => Err(IdentityError::InvalidCredentials),
        }
    }
}

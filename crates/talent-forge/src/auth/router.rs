use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::identity::IdentityProvider;
use super::service::{AuthService, LoginRequest, RefreshRequest};
use crate::extract::JsonBody;

/// Router builder exposing login and token refresh.
pub fn auth_router<I>(service: Arc<AuthService<I>>) -> Router
where
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/v1/auth/login", post(login_handler::<I>))
        .route("/v1/auth/refresh", post(refresh_handler::<I>))
        .with_state(service)
}

pub(crate) async fn login_handler<I>(
    State(service): State<Arc<AuthService<I>>>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Response
where
    I: IdentityProvider + 'static,
{
    match service.login(request).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn refresh_handler<I>(
    State(service): State<Arc<AuthService<I>>>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Response
where
    I: IdentityProvider + 'static,
{
    match service.refresh(request).await {
        Ok(token) => (StatusCode::OK, Json(token)).into_response(),
        Err(err) => err.into_response(),
    }
}

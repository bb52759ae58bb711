use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use serde_json::json;
use std::sync::Arc;
use talent_forge::assessments::{assessment_router, AssessmentService};
use talent_forge::auth::{auth_router, AuthService, IdentityProvider, TokenIssuer};
use talent_forge::store::Store;

pub(crate) const SERVICE_NAME: &str = "talent-forge-api";

pub(crate) fn with_api_routes<S, I>(
    assessments: Arc<AssessmentService<S>>,
    auth: Arc<AuthService<I>>,
    tokens: Arc<TokenIssuer>,
) -> Router
where
    S: Store + 'static,
    I: IdentityProvider + 'static,
{
    assessment_router(assessments, tokens)
        .merge(auth_router(auth))
        .route("/", get(root))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use talent_forge::auth::MemoryIdentityProvider;
    use talent_forge::config::{AuthConfig, DemoAccount};
    use talent_forge::store::MemoryStore;
    use tower::ServiceExt;

    const EMAIL: &str = "demo@talentforge.dev";
    const PASSWORD: &str = "demo-password";

    fn app(ready: bool) -> Router {
        let auth = AuthConfig {
            jwt_secret: "routes-test-secret".to_string(),
            access_token_minutes: 60,
            refresh_token_days: 7,
            demo_account: Some(DemoAccount {
                email: EMAIL.to_string(),
                password: PASSWORD.to_string(),
            }),
        };
        let tokens = Arc::new(TokenIssuer::from_config(&auth));
        let identity = MemoryIdentityProvider::from_config(&auth);
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        if ready {
            state.readiness.store(true, Ordering::Release);
        }

        with_api_routes(
            Arc::new(AssessmentService::new(Arc::new(MemoryStore::new()))),
            Arc::new(AuthService::new(Arc::new(identity), tokens.clone())),
            tokens,
        )
        .layer(Extension(state))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).expect("request builds")
    }

    #[tokio::test]
    async fn root_and_health_report_service_status() {
        let response = app(true).oneshot(get_request("/")).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = body_json(response).await;
        assert_eq!(payload["service"], json!(SERVICE_NAME));
        assert_eq!(payload["version"], json!(env!("CARGO_PKG_VERSION")));

        let response = app(true)
            .oneshot(get_request("/health"))
            .await
            .expect("route executes");
        assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        let response = app(false)
            .oneshot(get_request("/ready"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = app(true)
            .oneshot(get_request("/ready"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn metrics_render_as_prometheus_text() {
        let response = app(true)
            .oneshot(get_request("/metrics"))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
    }

    #[tokio::test]
    async fn login_token_unlocks_protected_routes() {
        let router = app(true);
        let login = Request::post("/v1/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "email": EMAIL, "password": PASSWORD }).to_string(),
            ))
            .expect("request builds");
        let response = router.clone().oneshot(login).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        let tokens = body_json(response).await;
        let access = tokens["access_token"].as_str().expect("access token");

        let questions = Request::get("/v1/color/questions")
            .header(header::AUTHORIZATION, format!("Bearer {access}"))
            .body(Body::empty())
            .expect("request builds");
        let response = router.oneshot(questions).await.expect("route executes");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({ "items": [] }));
    }
}

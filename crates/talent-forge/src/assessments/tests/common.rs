use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{json, Value};

use crate::assessments::{assessment_router, AssessmentKind, AssessmentService};
use crate::auth::{TokenIssuer, TokenKind};
use crate::store::{to_row, Filter, MemoryStore, Query, Row, Store, StoreError};

pub(super) const CANDIDATE: &str = "candidate-42";

fn row(value: Value) -> Row {
    to_row(&value).expect("object row")
}

/// Store seeded with question and descriptor catalogues.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = MemoryStore::new();
    store
        .seed(
            "color_questions",
            vec![
                row(json!({ "id": "cq-2", "question_number": 2, "active": true })),
                row(json!({ "id": "cq-1", "question_number": 1, "active": true })),
                row(json!({ "id": "cq-9", "question_number": 9, "active": false })),
            ],
        )
        .expect("seed color questions");
    store
        .seed(
            "disc_questions",
            vec![row(json!({ "id": "dq-1", "question_number": 1, "active": true }))],
        )
        .expect("seed disc questions");
    store
        .seed(
            "pi_situational_questions",
            vec![row(json!({ "id": "sq-1", "question_number": 1, "active": true }))],
        )
        .expect("seed situational questions");
    store
        .seed(
            "pi_descriptors",
            vec![
                row(json!({ "id": "d-ousado", "axis": "direcao", "position": 1, "active": true })),
                row(json!({ "id": "d-sociavel", "axis": "energia_social", "position": 2, "active": true })),
                row(json!({ "id": "d-calmo", "axis": "ritmo", "position": 3, "active": true })),
                row(json!({ "id": "d-preciso", "axis": "estrutura", "position": 4, "active": true })),
            ],
        )
        .expect("seed descriptors");
    Arc::new(store)
}

pub(super) fn build_service() -> (AssessmentService<MemoryStore>, Arc<MemoryStore>) {
    let store = seeded_store();
    (AssessmentService::new(store.clone()), store)
}

pub(super) async fn stored_row(store: &MemoryStore, table: &str, id: &str) -> Row {
    store
        .select(table, &Query::new().filter(Filter::eq("id", id)))
        .await
        .expect("select succeeds")
        .into_iter()
        .next()
        .expect("row present")
}

pub(super) fn kinds() -> [AssessmentKind; 2] {
    [AssessmentKind::Color, AssessmentKind::Disc]
}

/// Store whose backend is unreachable.
pub(super) struct UnavailableStore;

fn unavailable<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait]
impl Store for UnavailableStore {
    async fn insert(&self, _table: &str, _record: Row) -> Result<Row, StoreError> {
        unavailable()
    }

    async fn upsert(
        &self,
        _table: &str,
        _record: Row,
        _conflict_keys: &[&str],
    ) -> Result<Row, StoreError> {
        unavailable()
    }

    async fn select(&self, _table: &str, _query: &Query) -> Result<Vec<Row>, StoreError> {
        unavailable()
    }

    async fn update(
        &self,
        _table: &str,
        _patch: Row,
        _filters: &[Filter],
    ) -> Result<Vec<Row>, StoreError> {
        unavailable()
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> Result<Vec<Row>, StoreError> {
        unavailable()
    }
}

const SECRET: &str = "assessment-test-secret";

pub(super) fn tokens() -> Arc<TokenIssuer> {
    Arc::new(TokenIssuer::new(
        SECRET,
        Duration::minutes(60),
        Duration::days(7),
    ))
}

pub(super) fn router_with_store<S: Store + 'static>(store: Arc<S>, tokens: Arc<TokenIssuer>) -> Router {
    assessment_router(Arc::new(AssessmentService::new(store)), tokens)
}

pub(super) fn bearer(tokens: &TokenIssuer, kind: TokenKind) -> String {
    let token = tokens
        .issue("recruiter-1", Some("recruiter@talentforge.dev"), kind)
        .expect("token signs");
    format!("Bearer {token}")
}

/// Bearer header for a hosted session token: audience and role claims, no `type`.
pub(super) fn session_bearer() -> String {
    let claims = json!({
        "sub": "recruiter-2",
        "email": "recruiter@talentforge.dev",
        "aud": "authenticated",
        "role": "authenticated",
        "exp": Utc::now().timestamp() + 600
    });
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token signs");
    format!("Bearer {token}")
}

pub(super) fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = auth {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

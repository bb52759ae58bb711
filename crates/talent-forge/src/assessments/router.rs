use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::domain::{
    AssessmentId, AssessmentKind, CreateAssessmentRequest, DescriptorChange,
    SubmitDescriptorRequest, SubmitResponseRequest, SubmitSituationalRequest,
};
use super::service::{AssessmentService, AssessmentServiceError};
use crate::auth::{CurrentUser, TokenIssuer};
use crate::extract::JsonBody;
use crate::store::Store;

/// Shared state for assessment routes: the service plus the verifier used by [`CurrentUser`].
pub struct AssessmentState<S> {
    pub service: Arc<AssessmentService<S>>,
    pub tokens: Arc<TokenIssuer>,
}

impl<S> Clone for AssessmentState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            tokens: Arc::clone(&self.tokens),
        }
    }
}

impl<S> FromRef<AssessmentState<S>> for Arc<TokenIssuer> {
    fn from_ref(state: &AssessmentState<S>) -> Self {
        Arc::clone(&state.tokens)
    }
}

/// Router builder for the authenticated `/v1/{kind}` surface and the public
/// `/color-assessments` and `/pi-assessments` aliases used by the web client.
pub fn assessment_router<S>(
    service: Arc<AssessmentService<S>>,
    tokens: Arc<TokenIssuer>,
) -> Router
where
    S: Store + 'static,
{
    let state = AssessmentState { service, tokens };

    Router::new()
        .route("/v1/:kind/questions", get(questions_handler::<S>))
        .route("/v1/:kind/assessments", post(create_handler::<S>))
        .route(
            "/v1/:kind/assessments/:assessment_id/responses",
            post(response_handler::<S>),
        )
        .route(
            "/v1/:kind/assessments/:assessment_id/complete",
            post(complete_handler::<S>),
        )
        .route(
            "/v1/:kind/assessments/:assessment_id/scores",
            get(scores_handler::<S>),
        )
        .route("/color-assessments", post(public_color_create::<S>))
        .route(
            "/color-assessments/questions",
            get(public_color_questions::<S>),
        )
        .route("/color-assessments/latest", get(public_color_latest::<S>))
        .route(
            "/color-assessments/candidate/:candidate_user_id/latest",
            get(public_color_latest_for_candidate::<S>),
        )
        .route(
            "/color-assessments/:assessment_id/responses",
            post(public_color_response::<S>),
        )
        .route(
            "/color-assessments/:assessment_id/complete",
            post(public_color_complete::<S>),
        )
        .route("/pi-assessments", post(public_profile_create::<S>))
        .route(
            "/pi-assessments/questions",
            get(public_profile_questions::<S>),
        )
        .route(
            "/pi-assessments/descriptors",
            get(public_profile_descriptors::<S>),
        )
        .route("/pi-assessments/latest", get(public_profile_latest::<S>))
        .route(
            "/pi-assessments/candidate/:candidate_user_id/latest",
            get(public_profile_latest_for_candidate::<S>),
        )
        .route(
            "/pi-assessments/:assessment_id/responses/situational",
            post(public_situational_response::<S>),
        )
        .route(
            "/pi-assessments/:assessment_id/responses/descriptor",
            post(public_descriptor_response::<S>),
        )
        .route(
            "/pi-assessments/:assessment_id/complete",
            post(public_profile_complete::<S>),
        )
        .with_state(state)
}

fn error_response(err: AssessmentServiceError) -> Response {
    let (status, message) = match &err {
        AssessmentServiceError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        AssessmentServiceError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        AssessmentServiceError::Scoring(scoring) => {
            (StatusCode::UNPROCESSABLE_ENTITY, scoring.to_string())
        }
        AssessmentServiceError::Store(store) => {
            error!(error = %store, "assessment store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to reach the assessment store".to_string(),
            )
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}

fn data<T: Serialize>(status: StatusCode, value: T) -> Response {
    (status, Json(json!({ "data": value }))).into_response()
}

fn items<T: Serialize>(value: T) -> Response {
    (StatusCode::OK, Json(json!({ "items": value }))).into_response()
}

pub(crate) async fn questions_handler<S>(
    State(state): State<AssessmentState<S>>,
    _user: CurrentUser,
    Path(kind): Path<AssessmentKind>,
) -> Response
where
    S: Store + 'static,
{
    match state.service.list_questions(kind).await {
        Ok(questions) => items(questions),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<S>(
    State(state): State<AssessmentState<S>>,
    _user: CurrentUser,
    Path(kind): Path<AssessmentKind>,
    JsonBody(request): JsonBody<CreateAssessmentRequest>,
) -> Response
where
    S: Store + 'static,
{
    match state.service.create(kind, request).await {
        Ok(assessment) => data(StatusCode::CREATED, assessment.view(kind)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn response_handler<S>(
    State(state): State<AssessmentState<S>>,
    _user: CurrentUser,
    Path((kind, assessment_id)): Path<(AssessmentKind, String)>,
    JsonBody(request): JsonBody<SubmitResponseRequest>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.submit_response(kind, &id, request).await {
        Ok(response) => data(StatusCode::CREATED, response.view(kind)),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn complete_handler<S>(
    State(state): State<AssessmentState<S>>,
    _user: CurrentUser,
    Path((kind, assessment_id)): Path<(AssessmentKind, String)>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.finalize(kind, &id).await {
        Ok(projection) => data(StatusCode::OK, projection),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn scores_handler<S>(
    State(state): State<AssessmentState<S>>,
    _user: CurrentUser,
    Path((kind, assessment_id)): Path<(AssessmentKind, String)>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.scores(kind, &id).await {
        Ok(projection) => (StatusCode::OK, Json(projection)).into_response(),
        Err(err) => error_response(err),
    }
}

async fn public_color_create<S>(
    State(state): State<AssessmentState<S>>,
    JsonBody(request): JsonBody<CreateAssessmentRequest>,
) -> Response
where
    S: Store + 'static,
{
    let kind = AssessmentKind::Color;
    match state.service.create(kind, request).await {
        Ok(assessment) => data(StatusCode::CREATED, assessment.view(kind)),
        Err(err) => error_response(err),
    }
}

async fn public_color_questions<S>(State(state): State<AssessmentState<S>>) -> Response
where
    S: Store + 'static,
{
    match state.service.list_questions(AssessmentKind::Color).await {
        Ok(questions) => items(questions),
        Err(err) => error_response(err),
    }
}

async fn public_color_response<S>(
    State(state): State<AssessmentState<S>>,
    Path(assessment_id): Path<String>,
    JsonBody(request): JsonBody<SubmitResponseRequest>,
) -> Response
where
    S: Store + 'static,
{
    let kind = AssessmentKind::Color;
    let id = AssessmentId(assessment_id);
    match state.service.submit_response(kind, &id, request).await {
        Ok(response) => data(StatusCode::CREATED, response.view(kind)),
        Err(err) => error_response(err),
    }
}

async fn public_color_complete<S>(
    State(state): State<AssessmentState<S>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.finalize(AssessmentKind::Color, &id).await {
        Ok(projection) => data(StatusCode::OK, projection),
        Err(err) => error_response(err),
    }
}

async fn public_color_latest<S>(State(state): State<AssessmentState<S>>) -> Response
where
    S: Store + 'static,
{
    let kind = AssessmentKind::Color;
    match state.service.latest(kind).await {
        Ok(latest) => data(
            StatusCode::OK,
            latest.as_ref().map(|assessment| assessment.view(kind)),
        ),
        Err(err) => error_response(err),
    }
}

async fn public_color_latest_for_candidate<S>(
    State(state): State<AssessmentState<S>>,
    Path(candidate_user_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    let kind = AssessmentKind::Color;
    match state
        .service
        .latest_for_candidate(kind, &candidate_user_id)
        .await
    {
        Ok(latest) => data(
            StatusCode::OK,
            latest.as_ref().map(|assessment| assessment.view(kind)),
        ),
        Err(err) => error_response(err),
    }
}

async fn public_profile_create<S>(
    State(state): State<AssessmentState<S>>,
    JsonBody(request): JsonBody<CreateAssessmentRequest>,
) -> Response
where
    S: Store + 'static,
{
    match state.service.create_profile(request).await {
        Ok(assessment) => data(StatusCode::CREATED, assessment),
        Err(err) => error_response(err),
    }
}

async fn public_profile_questions<S>(State(state): State<AssessmentState<S>>) -> Response
where
    S: Store + 'static,
{
    match state.service.list_profile_questions().await {
        Ok(questions) => items(questions),
        Err(err) => error_response(err),
    }
}

async fn public_profile_descriptors<S>(State(state): State<AssessmentState<S>>) -> Response
where
    S: Store + 'static,
{
    match state.service.list_descriptors().await {
        Ok(descriptors) => items(descriptors),
        Err(err) => error_response(err),
    }
}

async fn public_situational_response<S>(
    State(state): State<AssessmentState<S>>,
    Path(assessment_id): Path<String>,
    JsonBody(request): JsonBody<SubmitSituationalRequest>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.submit_situational(&id, request).await {
        Ok(response) => data(StatusCode::CREATED, response),
        Err(err) => error_response(err),
    }
}

async fn public_descriptor_response<S>(
    State(state): State<AssessmentState<S>>,
    Path(assessment_id): Path<String>,
    JsonBody(request): JsonBody<SubmitDescriptorRequest>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.submit_descriptor(&id, request).await {
        Ok(DescriptorChange::Stored(response)) => data(StatusCode::OK, response),
        Ok(DescriptorChange::Removed) => {
            (StatusCode::OK, Json(json!({ "removed": true }))).into_response()
        }
        Err(err) => error_response(err),
    }
}

async fn public_profile_complete<S>(
    State(state): State<AssessmentState<S>>,
    Path(assessment_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    let id = AssessmentId(assessment_id);
    match state.service.finalize_profile(&id).await {
        Ok(projection) => data(StatusCode::OK, projection),
        Err(err) => error_response(err),
    }
}

async fn public_profile_latest<S>(State(state): State<AssessmentState<S>>) -> Response
where
    S: Store + 'static,
{
    match state.service.latest_profile().await {
        Ok(latest) => data(StatusCode::OK, latest),
        Err(err) => error_response(err),
    }
}

async fn public_profile_latest_for_candidate<S>(
    State(state): State<AssessmentState<S>>,
    Path(candidate_user_id): Path<String>,
) -> Response
where
    S: Store + 'static,
{
    match state
        .service
        .latest_profile_for_candidate(&candidate_user_id)
        .await
    {
        Ok(latest) => data(StatusCode::OK, latest),
        Err(err) => error_response(err),
    }
}

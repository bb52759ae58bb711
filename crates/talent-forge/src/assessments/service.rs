use std::collections::HashMap;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::domain::{
    Assessment, AssessmentId, AssessmentKind, AssessmentStatus, CreateAssessmentRequest,
    Descriptor, DescriptorChange, DescriptorResponse, ProfileAssessment, ProfileProjection,
    ResponseRecord, ScoreProjection, SituationalResponse, SubmitDescriptorRequest,
    SubmitResponseRequest, SubmitSituationalRequest,
};
use super::profile::{score_profile, ProfileAxis, ProfileBlock};
use super::scoring::{score_labels, ScoringError};
use crate::store::{from_row, to_row, Filter, Order, Query, Row, Store, StoreError};

pub(crate) const PROFILE_ASSESSMENTS: &str = "pi_assessments";
pub(crate) const PROFILE_QUESTIONS: &str = "pi_situational_questions";
pub(crate) const PROFILE_DESCRIPTORS: &str = "pi_descriptors";
pub(crate) const SITUATIONAL_RESPONSES: &str = "pi_situational_responses";
pub(crate) const DESCRIPTOR_RESPONSES: &str = "pi_descriptor_responses";

const DESCRIPTOR_CONFLICT_KEYS: [&str; 3] = ["assessment_id", "descriptor_id", "block"];

/// Assessment lifecycle over an injected store: creation, answers, and finalization.
pub struct AssessmentService<S> {
    store: Arc<S>,
}

fn required(value: Option<String>, message: &str) -> Result<String, AssessmentServiceError> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AssessmentServiceError::BadRequest(message.to_string()))
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(from_row).collect()
}

impl<S> AssessmentService<S>
where
    S: Store + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn catalogue(
        &self,
        table: &str,
        order_column: &str,
    ) -> Result<Vec<Row>, AssessmentServiceError> {
        let query = Query::new()
            .filter(Filter::eq("active", true))
            .order(Order::asc(order_column));
        Ok(self.store.select(table, &query).await?)
    }

    async fn find<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &AssessmentId,
    ) -> Result<T, AssessmentServiceError> {
        let query = Query::new().filter(Filter::eq("id", id.0.clone())).limit(1);
        let row = self
            .store
            .select(table, &query)
            .await?
            .into_iter()
            .next()
            .ok_or(AssessmentServiceError::NotFound)?;
        Ok(from_row(row)?)
    }

    async fn newest<T: DeserializeOwned>(
        &self,
        table: &str,
        candidate_user_id: Option<&str>,
    ) -> Result<Option<T>, AssessmentServiceError> {
        let mut query = Query::new().order(Order::desc("created_at")).limit(1);
        if let Some(candidate) = candidate_user_id {
            query = query.filter(Filter::eq("candidate_user_id", candidate));
        }
        let row = self.store.select(table, &query).await?.into_iter().next();
        Ok(row.map(from_row::<T>).transpose()?)
    }

    async fn open(
        &self,
        table: &str,
        request: CreateAssessmentRequest,
    ) -> Result<Row, AssessmentServiceError> {
        let candidate = required(request.candidate_user_id, "candidate_user_id is required")?;
        let record = to_row(&json!({
            "candidate_user_id": candidate,
            "status": AssessmentStatus::Draft.label(),
        }))?;
        let stored = self.store.insert(table, record).await?;
        info!(table, candidate_user_id = %candidate, "assessment opened");
        Ok(stored)
    }

    async fn complete(
        &self,
        table: &str,
        id: &AssessmentId,
        mut patch: Row,
    ) -> Result<Row, AssessmentServiceError> {
        patch.insert(
            "status".to_string(),
            Value::from(AssessmentStatus::Completed.label()),
        );
        patch.insert("completed_at".to_string(), Value::from(timestamp()));

        self.store
            .update(table, patch, &[Filter::eq("id", id.0.clone())])
            .await?
            .into_iter()
            .next()
            .ok_or(AssessmentServiceError::NotFound)
    }

    /// Active questions for a questionnaire, in presentation order.
    pub async fn list_questions(
        &self,
        kind: AssessmentKind,
    ) -> Result<Vec<Row>, AssessmentServiceError> {
        self.catalogue(kind.questions_table(), "question_number").await
    }

    /// Open a draft assessment for a candidate. Any client-supplied status is ignored.
    pub async fn create(
        &self,
        kind: AssessmentKind,
        request: CreateAssessmentRequest,
    ) -> Result<Assessment, AssessmentServiceError> {
        let stored = self.open(kind.assessments_table(), request).await?;
        Ok(from_row(stored)?)
    }

    pub async fn get(
        &self,
        kind: AssessmentKind,
        id: &AssessmentId,
    ) -> Result<Assessment, AssessmentServiceError> {
        self.find(kind.assessments_table(), id).await
    }

    /// Record one answer against an existing assessment.
    pub async fn submit_response(
        &self,
        kind: AssessmentKind,
        id: &AssessmentId,
        mut request: SubmitResponseRequest,
    ) -> Result<ResponseRecord, AssessmentServiceError> {
        let label = request.label_for(kind).map_err(|field| {
            AssessmentServiceError::BadRequest(format!(
                "{field} is not accepted for {} assessments",
                kind.slug()
            ))
        })?;
        let message = format!("{} and question_id are required", kind.label_column());
        let label = required(label, &message)?;
        let question_id = required(request.question_id, &message)?;
        self.get(kind, id).await?;

        let mut record = Row::new();
        record.insert("assessment_id".to_string(), Value::from(id.0.clone()));
        record.insert("question_id".to_string(), Value::from(question_id));
        record.insert(kind.label_column().to_string(), Value::from(label));

        let stored = self.store.insert(kind.responses_table(), record).await?;
        debug!(kind = kind.slug(), assessment_id = %id, "response stored");
        Ok(from_row(stored)?)
    }

    /// Score every stored answer and mark the assessment completed.
    ///
    /// Re-finalizing recomputes and overwrites the previous result. Scoring failures leave
    /// the assessment untouched.
    pub async fn finalize(
        &self,
        kind: AssessmentKind,
        id: &AssessmentId,
    ) -> Result<ScoreProjection, AssessmentServiceError> {
        self.get(kind, id).await?;

        let query = Query::new()
            .filter(Filter::eq("assessment_id", id.0.clone()))
            .order(Order::asc("created_at"));
        let responses: Vec<ResponseRecord> =
            decode_rows(self.store.select(kind.responses_table(), &query).await?)?;
        let outcome = score_labels(responses.iter().map(|response| response.label.as_deref()))?;

        let mut patch = to_row(&json!({ "scores": outcome.scores() }))?;
        patch.insert(
            kind.primary_column().to_string(),
            Value::from(outcome.primary.clone()),
        );
        patch.insert(
            kind.secondary_column().to_string(),
            outcome.secondary.clone().map_or(Value::Null, Value::from),
        );

        let completed = self.complete(kind.assessments_table(), id, patch).await?;
        let updated: Assessment = from_row(completed)?;
        info!(
            kind = kind.slug(),
            assessment_id = %id,
            responses = responses.len(),
            primary = %outcome.primary,
            "assessment finalized"
        );
        Ok(updated.projection(kind))
    }

    pub async fn scores(
        &self,
        kind: AssessmentKind,
        id: &AssessmentId,
    ) -> Result<ScoreProjection, AssessmentServiceError> {
        Ok(self.get(kind, id).await?.projection(kind))
    }

    /// Most recently created assessment across all candidates.
    pub async fn latest(
        &self,
        kind: AssessmentKind,
    ) -> Result<Option<Assessment>, AssessmentServiceError> {
        self.newest(kind.assessments_table(), None).await
    }

    pub async fn latest_for_candidate(
        &self,
        kind: AssessmentKind,
        candidate_user_id: &str,
    ) -> Result<Option<Assessment>, AssessmentServiceError> {
        self.newest(kind.assessments_table(), Some(candidate_user_id)).await
    }

    pub async fn create_profile(
        &self,
        request: CreateAssessmentRequest,
    ) -> Result<ProfileAssessment, AssessmentServiceError> {
        let stored = self.open(PROFILE_ASSESSMENTS, request).await?;
        Ok(from_row(stored)?)
    }

    pub async fn get_profile(
        &self,
        id: &AssessmentId,
    ) -> Result<ProfileAssessment, AssessmentServiceError> {
        self.find(PROFILE_ASSESSMENTS, id).await
    }

    pub async fn list_profile_questions(&self) -> Result<Vec<Row>, AssessmentServiceError> {
        self.catalogue(PROFILE_QUESTIONS, "question_number").await
    }

    pub async fn list_descriptors(&self) -> Result<Vec<Row>, AssessmentServiceError> {
        self.catalogue(PROFILE_DESCRIPTORS, "position").await
    }

    pub async fn submit_situational(
        &self,
        id: &AssessmentId,
        request: SubmitSituationalRequest,
    ) -> Result<SituationalResponse, AssessmentServiceError> {
        const MESSAGE: &str = "question_id, selected_axis and block are required";
        let question_id = required(request.question_id, MESSAGE)?;
        let axis = required(request.selected_axis, MESSAGE)?;
        let block = required(request.block, MESSAGE)?;

        let axis = ProfileAxis::parse(&axis).ok_or_else(|| {
            AssessmentServiceError::BadRequest(format!("unknown axis '{axis}'"))
        })?;
        let block = ProfileBlock::parse(&block).ok_or_else(|| {
            AssessmentServiceError::BadRequest(format!("unknown block '{block}'"))
        })?;
        self.get_profile(id).await?;

        let record = to_row(&json!({
            "assessment_id": id.0,
            "question_id": question_id,
            "selected_axis": axis.as_str(),
            "block": block.as_str(),
        }))?;
        let stored = self.store.insert(SITUATIONAL_RESPONSES, record).await?;
        debug!(assessment_id = %id, axis = axis.as_str(), "situational response stored");
        Ok(from_row(stored)?)
    }

    /// Select (upsert per block) or de-select (delete) a descriptor.
    pub async fn submit_descriptor(
        &self,
        id: &AssessmentId,
        request: SubmitDescriptorRequest,
    ) -> Result<DescriptorChange, AssessmentServiceError> {
        const MESSAGE: &str = "descriptor_id and block are required";
        let descriptor_id = required(request.descriptor_id, MESSAGE)?;
        let block = required(request.block, MESSAGE)?;
        let block = ProfileBlock::parse(&block).ok_or_else(|| {
            AssessmentServiceError::BadRequest(format!("unknown block '{block}'"))
        })?;
        self.get_profile(id).await?;

        if request.selected == Some(false) {
            let filters = [
                Filter::eq("assessment_id", id.0.clone()),
                Filter::eq("descriptor_id", descriptor_id.clone()),
                Filter::eq("block", block.as_str()),
            ];
            let removed = self.store.delete(DESCRIPTOR_RESPONSES, &filters).await?;
            debug!(assessment_id = %id, %descriptor_id, removed = removed.len(), "descriptor cleared");
            return Ok(DescriptorChange::Removed);
        }

        let record = to_row(&json!({
            "assessment_id": id.0,
            "descriptor_id": descriptor_id,
            "block": block.as_str(),
        }))?;
        let stored = self
            .store
            .upsert(DESCRIPTOR_RESPONSES, record, &DESCRIPTOR_CONFLICT_KEYS)
            .await?;
        Ok(DescriptorChange::Stored(from_row(stored)?))
    }

    /// Tally descriptor and situational answers per axis and block, then complete.
    pub async fn finalize_profile(
        &self,
        id: &AssessmentId,
    ) -> Result<ProfileProjection, AssessmentServiceError> {
        self.get_profile(id).await?;

        let by_assessment = Query::new()
            .filter(Filter::eq("assessment_id", id.0.clone()))
            .order(Order::asc("created_at"));
        let descriptor_answers: Vec<DescriptorResponse> = decode_rows(
            self.store
                .select(DESCRIPTOR_RESPONSES, &by_assessment)
                .await?,
        )?;
        let situational_answers: Vec<SituationalResponse> = decode_rows(
            self.store
                .select(SITUATIONAL_RESPONSES, &by_assessment)
                .await?,
        )?;

        let axes: HashMap<String, Option<String>> = if descriptor_answers.is_empty() {
            HashMap::new()
        } else {
            let catalogue: Vec<Descriptor> = decode_rows(
                self.store
                    .select(PROFILE_DESCRIPTORS, &Query::new())
                    .await?,
            )?;
            catalogue
                .into_iter()
                .map(|descriptor| (descriptor.id, descriptor.axis))
                .collect()
        };

        let entries = descriptor_answers
            .into_iter()
            .map(|answer| {
                let axis = axes.get(&answer.descriptor_id).cloned().flatten();
                (answer.block, axis)
            })
            .chain(
                situational_answers
                    .into_iter()
                    .map(|answer| (answer.block, answer.selected_axis)),
            );
        let outcome = score_profile(entries)?;

        let patch = to_row(&outcome)?;
        let updated: ProfileAssessment =
            from_row(self.complete(PROFILE_ASSESSMENTS, id, patch).await?)?;
        info!(assessment_id = %id, "profile assessment finalized");
        Ok(updated.projection())
    }

    pub async fn latest_profile(&self) -> Result<Option<ProfileAssessment>, AssessmentServiceError> {
        self.newest(PROFILE_ASSESSMENTS, None).await
    }

    pub async fn latest_profile_for_candidate(
        &self,
        candidate_user_id: &str,
    ) -> Result<Option<ProfileAssessment>, AssessmentServiceError> {
        self.newest(PROFILE_ASSESSMENTS, Some(candidate_user_id)).await
    }
}

/// Error raised by the assessment service.
#[derive(Debug, thiserror::Error)]
pub enum AssessmentServiceError {
    #[error("{0}")]
    BadRequest(String),
    #[error("assessment not found")]
    NotFound,
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

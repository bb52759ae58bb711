use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::profile::AxisScores;

/// Identifier wrapper for stored assessments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssessmentId(pub String);

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Questionnaires scored by tallying a single selected label per response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentKind {
    Color,
    Disc,
}

impl AssessmentKind {
    pub const fn slug(self) -> &'static str {
        match self {
            AssessmentKind::Color => "color",
            AssessmentKind::Disc => "disc",
        }
    }

    pub const fn assessments_table(self) -> &'static str {
        match self {
            AssessmentKind::Color => "color_assessments",
            AssessmentKind::Disc => "disc_assessments",
        }
    }

    pub const fn responses_table(self) -> &'static str {
        match self {
            AssessmentKind::Color => "color_responses",
            AssessmentKind::Disc => "disc_responses",
        }
    }

    pub const fn questions_table(self) -> &'static str {
        match self {
            AssessmentKind::Color => "color_questions",
            AssessmentKind::Disc => "disc_questions",
        }
    }

    pub const fn label_column(self) -> &'static str {
        match self {
            AssessmentKind::Color => "selected_color",
            AssessmentKind::Disc => "selected_trait",
        }
    }

    pub const fn primary_column(self) -> &'static str {
        match self {
            AssessmentKind::Color => "primary_color",
            AssessmentKind::Disc => "primary_trait",
        }
    }

    pub const fn secondary_column(self) -> &'static str {
        match self {
            AssessmentKind::Color => "secondary_color",
            AssessmentKind::Disc => "secondary_trait",
        }
    }
}

/// Lifecycle of an assessment. Rows written by older clients as `in_progress` read as drafts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    #[serde(alias = "in_progress")]
    Draft,
    Completed,
}

impl AssessmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            AssessmentStatus::Draft => "draft",
            AssessmentStatus::Completed => "completed",
        }
    }
}

/// Stored tally-style assessment, read from either questionnaire's table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub candidate_user_id: String,
    pub status: AssessmentStatus,
    #[serde(default)]
    pub scores: Option<BTreeMap<String, u32>>,
    #[serde(default, alias = "primary_color", alias = "primary_trait")]
    pub primary: Option<String>,
    #[serde(default, alias = "secondary_color", alias = "secondary_trait")]
    pub secondary: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl Assessment {
    pub fn projection(&self, kind: AssessmentKind) -> ScoreProjection {
        ScoreProjection {
            kind,
            scores: self.scores.clone(),
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
            status: self.status,
        }
    }

    pub fn view(&self, kind: AssessmentKind) -> AssessmentView<'_> {
        AssessmentView {
            kind,
            assessment: self,
        }
    }
}

/// Wire representation of an assessment using the questionnaire's column names.
#[derive(Debug, Clone, Copy)]
pub struct AssessmentView<'a> {
    kind: AssessmentKind,
    assessment: &'a Assessment,
}

impl Serialize for AssessmentView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let assessment = self.assessment;
        let mut map = serializer.serialize_map(Some(8))?;
        map.serialize_entry("id", &assessment.id)?;
        map.serialize_entry("candidate_user_id", &assessment.candidate_user_id)?;
        map.serialize_entry("status", &assessment.status)?;
        map.serialize_entry("scores", &assessment.scores)?;
        map.serialize_entry(self.kind.primary_column(), &assessment.primary)?;
        map.serialize_entry(self.kind.secondary_column(), &assessment.secondary)?;
        map.serialize_entry("created_at", &assessment.created_at)?;
        map.serialize_entry("completed_at", &assessment.completed_at)?;
        map.end()
    }
}

/// Score columns exposed after (or before) finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreProjection {
    pub kind: AssessmentKind,
    pub scores: Option<BTreeMap<String, u32>>,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub status: AssessmentStatus,
}

impl Serialize for ScoreProjection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("scores", &self.scores)?;
        map.serialize_entry(self.kind.primary_column(), &self.primary)?;
        map.serialize_entry(self.kind.secondary_column(), &self.secondary)?;
        map.serialize_entry("status", &self.status)?;
        map.end()
    }
}

/// One stored answer. The label column differs per questionnaire.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResponseRecord {
    pub id: String,
    pub assessment_id: AssessmentId,
    pub question_id: String,
    #[serde(default, alias = "selected_color", alias = "selected_trait")]
    pub label: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ResponseRecord {
    pub fn view(&self, kind: AssessmentKind) -> ResponseView<'_> {
        ResponseView {
            kind,
            response: self,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseView<'a> {
    kind: AssessmentKind,
    response: &'a ResponseRecord,
}

impl Serialize for ResponseView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let response = self.response;
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("id", &response.id)?;
        map.serialize_entry("assessment_id", &response.assessment_id)?;
        map.serialize_entry("question_id", &response.question_id)?;
        map.serialize_entry(self.kind.label_column(), &response.label)?;
        map.serialize_entry("created_at", &response.created_at)?;
        map.end()
    }
}

/// Body accepted when opening an assessment. Accepts the web client's camelCase too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAssessmentRequest {
    #[serde(default, alias = "candidateUserId")]
    pub candidate_user_id: Option<String>,
}

/// Body accepted when answering one question of a tally-style questionnaire.
///
/// Only the label field of the questionnaire being answered is valid; see [`Self::label_for`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponseRequest {
    #[serde(default, alias = "questionId")]
    pub question_id: Option<String>,
    #[serde(default, alias = "selectedColor")]
    pub selected_color: Option<String>,
    #[serde(default, alias = "selectedTrait")]
    pub selected_trait: Option<String>,
}

impl SubmitResponseRequest {
    pub fn new(kind: AssessmentKind, question_id: &str, label: &str) -> Self {
        let mut request = Self {
            question_id: Some(question_id.to_string()),
            ..Self::default()
        };
        match kind {
            AssessmentKind::Color => request.selected_color = Some(label.to_string()),
            AssessmentKind::Disc => request.selected_trait = Some(label.to_string()),
        }
        request
    }

    /// Split out the label for `kind`, or the name of the other questionnaire's field
    /// when the body carries it.
    pub fn label_for(&mut self, kind: AssessmentKind) -> Result<Option<String>, &'static str> {
        let (own, foreign, foreign_name) = match kind {
            AssessmentKind::Color => (
                self.selected_color.take(),
                &self.selected_trait,
                AssessmentKind::Disc.label_column(),
            ),
            AssessmentKind::Disc => (
                self.selected_trait.take(),
                &self.selected_color,
                AssessmentKind::Color.label_column(),
            ),
        };
        if foreign.is_some() {
            return Err(foreign_name);
        }
        Ok(own)
    }
}

/// Stored behavioral-profile assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileAssessment {
    pub id: AssessmentId,
    pub candidate_user_id: String,
    pub status: AssessmentStatus,
    #[serde(default)]
    pub scores_natural: Option<AxisScores>,
    #[serde(default)]
    pub scores_adapted: Option<AxisScores>,
    #[serde(default)]
    pub gaps: Option<AxisScores>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
}

impl ProfileAssessment {
    pub fn projection(&self) -> ProfileProjection {
        ProfileProjection {
            scores_natural: self.scores_natural.clone(),
            scores_adapted: self.scores_adapted.clone(),
            gaps: self.gaps.clone(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileProjection {
    pub scores_natural: Option<AxisScores>,
    pub scores_adapted: Option<AxisScores>,
    pub gaps: Option<AxisScores>,
    pub status: AssessmentStatus,
}

/// Situational answer: the axis picked for a question within one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationalResponse {
    pub id: String,
    pub assessment_id: AssessmentId,
    pub question_id: String,
    #[serde(default)]
    pub selected_axis: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Descriptor answer: at most one row per (assessment, descriptor, block).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorResponse {
    pub id: String,
    pub assessment_id: AssessmentId,
    pub descriptor_id: String,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Catalogue entry tying a descriptor to the axis it counts towards.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Descriptor {
    pub id: String,
    #[serde(default)]
    pub axis: Option<String>,
}

/// Axis and block stay raw here so unknown values surface as request errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitSituationalRequest {
    #[serde(default, alias = "questionId")]
    pub question_id: Option<String>,
    #[serde(default, alias = "selectedAxis")]
    pub selected_axis: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitDescriptorRequest {
    #[serde(default, alias = "descriptorId")]
    pub descriptor_id: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub selected: Option<bool>,
}

/// Result of a descriptor submission: stored, or removed when de-selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorChange {
    Stored(DescriptorResponse),
    Removed,
}

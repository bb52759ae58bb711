//! Color, DISC and behavioral-profile questionnaires: answer intake, tally scoring, and the
//! draft → completed lifecycle.

pub mod domain;
pub mod profile;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Assessment, AssessmentId, AssessmentKind, AssessmentStatus, AssessmentView,
    CreateAssessmentRequest, Descriptor, DescriptorChange, DescriptorResponse, ProfileAssessment,
    ProfileProjection, ResponseRecord, ScoreProjection, SituationalResponse,
    SubmitDescriptorRequest, SubmitResponseRequest, SubmitSituationalRequest,
};
pub use profile::{score_profile, AxisScores, ProfileAxis, ProfileBlock, ProfileOutcome};
pub use router::{assessment_router, AssessmentState};
pub use scoring::{score_labels, LabelCount, ScoreOutcome, ScoringError};
pub use service::{AssessmentService, AssessmentServiceError};

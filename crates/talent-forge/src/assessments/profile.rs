use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::scoring::ScoringError;

/// Per-axis counts keyed by the axis wire name.
pub type AxisScores = BTreeMap<String, u32>;

/// Behavioral drive measured by the profile questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProfileAxis {
    #[serde(rename = "direcao")]
    Direction,
    #[serde(rename = "energia_social")]
    SocialEnergy,
    #[serde(rename = "ritmo")]
    Pace,
    #[serde(rename = "estrutura")]
    Structure,
}

impl ProfileAxis {
    pub const ALL: [ProfileAxis; 4] = [
        ProfileAxis::Direction,
        ProfileAxis::SocialEnergy,
        ProfileAxis::Pace,
        ProfileAxis::Structure,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ProfileAxis::Direction => "direcao",
            ProfileAxis::SocialEnergy => "energia_social",
            ProfileAxis::Pace => "ritmo",
            ProfileAxis::Structure => "estrutura",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL.into_iter().find(|axis| axis.as_str() == value)
    }
}

/// Which self-image a response describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileBlock {
    #[serde(rename = "natural")]
    Natural,
    #[serde(rename = "adaptado")]
    Adapted,
}

impl ProfileBlock {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProfileBlock::Natural => "natural",
            ProfileBlock::Adapted => "adaptado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "natural" => Some(Self::Natural),
            "adaptado" => Some(Self::Adapted),
            _ => None,
        }
    }
}

/// Natural and adapted axis counts plus their absolute differences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileOutcome {
    pub scores_natural: AxisScores,
    pub scores_adapted: AxisScores,
    pub gaps: AxisScores,
}

fn zeroed() -> AxisScores {
    ProfileAxis::ALL
        .iter()
        .map(|axis| (axis.as_str().to_string(), 0))
        .collect()
}

/// Tally `(block, axis)` pairs into natural/adapted scores.
///
/// Entries with an unknown block or axis are skipped. Every axis appears in every map.
pub fn score_profile<I>(entries: I) -> Result<ProfileOutcome, ScoringError>
where
    I: IntoIterator<Item = (Option<String>, Option<String>)>,
{
    let mut natural = zeroed();
    let mut adapted = zeroed();
    let mut seen = 0usize;
    let mut counted = 0usize;

    for (block, axis) in entries {
        seen += 1;
        let block = block.as_deref().and_then(ProfileBlock::parse);
        let axis = axis.as_deref().and_then(ProfileAxis::parse);
        let (Some(block), Some(axis)) = (block, axis) else {
            continue;
        };

        let target = match block {
            ProfileBlock::Natural => &mut natural,
            ProfileBlock::Adapted => &mut adapted,
        };
        *target.entry(axis.as_str().to_string()).or_insert(0) += 1;
        counted += 1;
    }

    if seen == 0 {
        return Err(ScoringError::NoResponses);
    }
    if counted == 0 {
        return Err(ScoringError::InvalidResponses);
    }

    let gaps = ProfileAxis::ALL
        .iter()
        .map(|axis| {
            let key = axis.as_str();
            let natural = natural.get(key).copied().unwrap_or_default();
            let adapted = adapted.get(key).copied().unwrap_or_default();
            (key.to_string(), natural.abs_diff(adapted))
        })
        .collect();

    Ok(ProfileOutcome {
        scores_natural: natural,
        scores_adapted: adapted,
        gaps,
    })
}

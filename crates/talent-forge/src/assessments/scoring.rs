use std::collections::BTreeMap;

use serde::Serialize;

/// Number of responses that selected one label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCount {
    pub label: String,
    pub count: u32,
}

/// Tally over one assessment's responses, ranked by descending count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreOutcome {
    /// Counts in ranking order. Equal counts keep first-seen order.
    pub ranking: Vec<LabelCount>,
    pub primary: String,
    pub secondary: Option<String>,
}

impl ScoreOutcome {
    pub fn scores(&self) -> BTreeMap<String, u32> {
        self.ranking
            .iter()
            .map(|entry| (entry.label.clone(), entry.count))
            .collect()
    }

    pub fn counted(&self) -> u32 {
        self.ranking.iter().map(|entry| entry.count).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("no responses found for this assessment")]
    NoResponses,
    #[error("responses for this assessment carry no usable label")]
    InvalidResponses,
}

/// Count selected labels and pick the two most frequent.
///
/// Blank or missing labels are skipped. Ties rank by the order in which each label first
/// appears in `labels`, so callers should pass responses in storage order.
pub fn score_labels<I, S>(labels: I) -> Result<ScoreOutcome, ScoringError>
where
    I: IntoIterator<Item = Option<S>>,
    S: AsRef<str>,
{
    let mut seen = 0usize;
    let mut tallies: Vec<LabelCount> = Vec::new();

    for label in labels {
        seen += 1;
        let Some(label) = label else { continue };
        let label = label.as_ref().trim();
        if label.is_empty() {
            continue;
        }

        match tallies.iter_mut().find(|entry| entry.label == label) {
            Some(entry) => entry.count += 1,
            None => tallies.push(LabelCount {
                label: label.to_string(),
                count: 1,
            }),
        }
    }

    if seen == 0 {
        return Err(ScoringError::NoResponses);
    }

    // stable: equal counts stay in first-seen order
    tallies.sort_by(|a, b| b.count.cmp(&a.count));

    let mut ranked = tallies.iter();
    let primary = ranked
        .next()
        .map(|entry| entry.label.clone())
        .ok_or(ScoringError::InvalidResponses)?;
    let secondary = ranked.next().map(|entry| entry.label.clone());

    Ok(ScoreOutcome {
        ranking: tallies,
        primary,
        secondary,
    })
}

use clap::Args;
use serde::Serialize;
use talent_forge::assessments::{score_labels, LabelCount, ScoreOutcome};
use talent_forge::error::AppError;

#[derive(Args, Debug, Default)]
pub(crate) struct ScoreArgs {
    /// Selected labels in answer order, for example `red red blue`
    #[arg(required = true)]
    pub(crate) labels: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreReport {
    pub(crate) responses: usize,
    pub(crate) scores: std::collections::BTreeMap<String, u32>,
    pub(crate) ranking: Vec<LabelCount>,
    pub(crate) primary: String,
    pub(crate) secondary: Option<String>,
}

impl ScoreReport {
    fn new(responses: usize, outcome: ScoreOutcome) -> Self {
        Self {
            responses,
            scores: outcome.scores(),
            ranking: outcome.ranking,
            primary: outcome.primary,
            secondary: outcome.secondary,
        }
    }
}

pub(crate) fn build_report(args: &ScoreArgs) -> Result<ScoreReport, AppError> {
    let outcome = score_labels(args.labels.iter().map(|label| Some(label.as_str())))?;
    Ok(ScoreReport::new(args.labels.len(), outcome))
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let report = build_report(&args)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

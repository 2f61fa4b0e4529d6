use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use survey_engine::EngineConfig;
use survey_spec::AnswerInput;

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// JSON snapshot holding surveys, questions and responses; rewritten on success
    #[arg(long, value_name = "PATH")]
    pub store: PathBuf,
    #[arg(long, value_name = "SURVEY_ID")]
    pub survey: String,
    /// JSON array of `{"question_id": ..., "value": ...}` entries
    #[arg(long, value_name = "PATH")]
    pub answers: PathBuf,
    #[arg(long, value_name = "ID")]
    pub respondent: Option<String>,
}

pub fn run(args: SubmitArgs, config: EngineConfig) -> Result<()> {
    let raw = fs::read_to_string(&args.answers)
        .with_context(|| format!("failed to read {}", args.answers.display()))?;
    let answers: Vec<AnswerInput> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a list of answers", args.answers.display()))?;

    let engine = super::open_engine(&args.store, config)?;
    let response = super::block_on(engine.submit_response(
        &args.survey,
        args.respondent.clone(),
        answers,
    ))??;
    engine
        .store()
        .snapshot()
        .write(&args.store)
        .with_context(|| format!("failed to save store {}", args.store.display()))?;
    info!(response_id = %response.id, survey_id = %args.survey, "response saved");
    super::print_json(&response)
}

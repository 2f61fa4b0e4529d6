use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use survey_engine::{EngineConfig, SurveyEngine, SurveyError};
use survey_spec::SurveyStats;
use survey_store::MemoryStore;

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, value_name = "PATH")]
    pub store: PathBuf,
    #[arg(long, value_name = "SURVEY_ID")]
    pub survey: String,
    /// Refuse unless this user owns the survey
    #[arg(long, value_name = "USER_ID")]
    pub owner: Option<String>,
}

pub fn run(args: StatsArgs, config: EngineConfig) -> Result<()> {
    let engine = super::open_engine(&args.store, config)?;
    let stats = super::block_on(owned_stats(&engine, &args))??;
    super::print_json(&stats)
}

async fn owned_stats(
    engine: &SurveyEngine<MemoryStore>,
    args: &StatsArgs,
) -> Result<SurveyStats, SurveyError> {
    if let Some(owner) = &args.owner {
        engine.authorize_owner(&args.survey, owner).await?;
    }
    engine.compute_stats(&args.survey).await
}

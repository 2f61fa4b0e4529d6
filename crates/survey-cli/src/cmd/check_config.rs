use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use survey_spec::{QuestionConfig, QuestionKind, parse_config};

#[derive(Args, Debug, Clone)]
pub struct CheckConfigArgs {
    /// Question kind tag; legacy aliases such as `rating` are accepted
    #[arg(long, value_name = "KIND")]
    pub kind: String,
    /// Configuration as inline JSON, or @path to a JSON file
    #[arg(id = "raw_config", value_name = "CONFIG", default_value = "{}")]
    pub config: String,
}

#[derive(Debug, Serialize)]
struct Checked {
    kind: QuestionKind,
    config: QuestionConfig,
}

pub fn run(args: CheckConfigArgs) -> Result<()> {
    let kind: QuestionKind = args.kind.parse()?;
    let raw = super::read_json_arg(&args.config)?;
    let config = parse_config(kind, &raw).with_context(|| format!("invalid {kind} configuration"))?;
    super::print_json(&Checked { kind, config })
}

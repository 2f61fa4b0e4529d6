use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use survey_spec::{AnswerShape, QuestionKind, config_schema, descriptors};

#[derive(Args, Debug, Clone, Default)]
pub struct KindsArgs {
    /// Include the JSON Schema of each kind's configuration
    #[arg(long)]
    pub schema: bool,
}

#[derive(Debug, Serialize)]
struct KindSummary {
    kind: QuestionKind,
    label: &'static str,
    answer_shape: AnswerShape,
    defaults: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<schemars::Schema>,
}

pub fn run(args: KindsArgs) -> Result<()> {
    let kinds: Vec<KindSummary> = descriptors()
        .map(|descriptor| KindSummary {
            kind: descriptor.kind,
            label: descriptor.label,
            answer_shape: descriptor.answer_shape,
            defaults: descriptor.default_config(),
            schema: args.schema.then(|| config_schema(descriptor.kind)),
        })
        .collect();
    super::print_json(&kinds)
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::registry::parse_config;
use crate::spec::config::{ConfigError, QuestionConfig};
use crate::spec::kind::QuestionKind;

pub type SurveyId = String;
pub type QuestionId = String;
pub type ResponseId = String;

/// Soft-delete marker. Deleted questions leave the live set but keep their row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    #[default]
    #[serde(alias = "ACTIVE")]
    Active,
    #[serde(alias = "DELETED")]
    Deleted,
}

/// A question owned by exactly one survey. The kind is implied by the
/// configuration variant and cannot change after construction.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "QuestionRecord")]
pub struct Question {
    pub id: QuestionId,
    pub survey_id: SurveyId,
    pub title: String,
    pub required: bool,
    pub order: u32,
    pub status: QuestionStatus,
    config: QuestionConfig,
}

impl Question {
    pub fn new(
        id: impl Into<QuestionId>,
        survey_id: impl Into<SurveyId>,
        title: impl Into<String>,
        required: bool,
        order: u32,
        config: QuestionConfig,
    ) -> Self {
        Self {
            id: id.into(),
            survey_id: survey_id.into(),
            title: title.into(),
            required,
            order,
            status: QuestionStatus::Active,
            config,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        self.config.kind()
    }

    pub fn config(&self) -> &QuestionConfig {
        &self.config
    }

    /// Swaps in a new configuration of the same kind.
    pub fn set_config(&mut self, config: QuestionConfig) -> Result<(), ConfigError> {
        if config.kind() != self.kind() {
            return Err(ConfigError::new("kind", "question kind is immutable"));
        }
        self.config = config;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestionStatus::Active
    }
}

/// Persisted form of a question: an open, kind-tagged configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub survey_id: SurveyId,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    pub order: u32,
    #[serde(default)]
    pub status: QuestionStatus,
    pub kind: QuestionKind,
    #[serde(default)]
    pub config: Value,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = ConfigError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let config = parse_config(record.kind, &record.config)?;
        Ok(Self {
            id: record.id,
            survey_id: record.survey_id,
            title: record.title,
            required: record.required,
            order: record.order,
            status: record.status,
            config,
        })
    }
}

#[derive(Serialize)]
struct QuestionRecordRef<'a> {
    id: &'a str,
    survey_id: &'a str,
    title: &'a str,
    required: bool,
    order: u32,
    status: QuestionStatus,
    kind: QuestionKind,
    config: &'a QuestionConfig,
}

impl Serialize for Question {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        QuestionRecordRef {
            id: &self.id,
            survey_id: &self.survey_id,
            title: &self.title,
            required: self.required,
            order: self.order,
            status: self.status,
            kind: self.kind(),
            config: &self.config,
        }
        .serialize(serializer)
    }
}

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Closed set of question kinds. Each kind owns exactly one configuration
/// shape and one answer shape; see [`crate::registry`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Text,
    Textarea,
    Email,
    Number,
    #[serde(alias = "rating")]
    RatingStar,
    RatingScale,
    #[serde(alias = "mcq_single", alias = "single-choice")]
    SingleChoice,
    Dropdown,
    #[serde(alias = "mcq_multi", alias = "multi-choice")]
    MultipleChoice,
    #[serde(alias = "yes_no")]
    Boolean,
    Date,
    OrderRank,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 12] = [
        QuestionKind::Text,
        QuestionKind::Textarea,
        QuestionKind::Email,
        QuestionKind::Number,
        QuestionKind::RatingStar,
        QuestionKind::RatingScale,
        QuestionKind::SingleChoice,
        QuestionKind::Dropdown,
        QuestionKind::MultipleChoice,
        QuestionKind::Boolean,
        QuestionKind::Date,
        QuestionKind::OrderRank,
    ];

    /// Wire tag used in persisted questions.
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Textarea => "textarea",
            QuestionKind::Email => "email",
            QuestionKind::Number => "number",
            QuestionKind::RatingStar => "rating_star",
            QuestionKind::RatingScale => "rating_scale",
            QuestionKind::SingleChoice => "single_choice",
            QuestionKind::Dropdown => "dropdown",
            QuestionKind::MultipleChoice => "multiple_choice",
            QuestionKind::Boolean => "boolean",
            QuestionKind::Date => "date",
            QuestionKind::OrderRank => "order_rank",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown question kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for QuestionKind {
    type Err = UnknownKind;

    // Goes through serde so legacy aliases resolve the same way as in stored payloads.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(raw.trim().to_string()))
            .map_err(|_| UnknownKind(raw.to_string()))
    }
}

/// Dynamic shape an answer must have for a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnswerShape {
    Text,
    Number,
    Boolean,
    List,
    OrderedList,
}

impl AnswerShape {
    pub fn describe(self) -> &'static str {
        match self {
            AnswerShape::Text => "text",
            AnswerShape::Number => "a number",
            AnswerShape::Boolean => "true or false",
            AnswerShape::List => "a list of selections",
            AnswerShape::OrderedList => "an ordered list",
        }
    }
}

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::spec::config::ConfigError;
use crate::spec::question::{QuestionId, ResponseId, SurveyId};
use crate::validate::Rejection;

/// Typed answer payload. Built once from JSON at the submission boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    /// Converts a raw JSON value. Null, blank strings and empty lists are
    /// "no answer" and come back as `Ok(None)`.
    pub fn from_json(value: &Value) -> Result<Option<Self>, Rejection> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(flag) => Ok(Some(AnswerValue::Bool(*flag))),
            Value::Number(number) => number
                .as_f64()
                .map(|number| Some(AnswerValue::Number(number)))
                .ok_or(Rejection::UnsupportedValue),
            Value::String(text) if text.trim().is_empty() => Ok(None),
            Value::String(text) => Ok(Some(AnswerValue::Text(text.clone()))),
            Value::Array(items) if items.is_empty() => Ok(None),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_owned)
                        .ok_or(Rejection::UnsupportedValue)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(|list| Some(AnswerValue::List(list))),
            Value::Object(_) => Err(Rejection::UnsupportedValue),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnswerValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// String form used as a statistics bucket key.
    pub fn bucket_key(&self) -> String {
        match self {
            AnswerValue::Bool(flag) => flag.to_string(),
            AnswerValue::Number(number) => number.to_string(),
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::List(items) => items.join(", "),
        }
    }
}

/// Raw answer as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerInput {
    pub question_id: QuestionId,
    #[serde(default)]
    pub value: Value,
}

impl AnswerInput {
    pub fn new(question_id: impl Into<QuestionId>, value: Value) -> Self {
        Self {
            question_id: question_id.into(),
            value,
        }
    }
}

/// Accepted answer. Immutable once stored with its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub survey_id: SurveyId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<String>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl Response {
    pub fn answer_for(&self, question_id: &str) -> Option<&AnswerValue> {
        self.answers
            .iter()
            .find(|answer| answer.question_id == question_id)
            .map(|answer| &answer.value)
    }
}

/// Validation error metadata reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            question_id: None,
            path: None,
            message: message.into(),
            code: None,
        }
    }

    /// Wraps a rejected answer, keeping its question and submission slot.
    pub fn rejected(question_id: &str, path: Option<String>, rejection: &Rejection) -> Self {
        Self {
            question_id: Some(question_id.to_string()),
            path,
            message: rejection.to_string(),
            code: Some(rejection.code().to_string()),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.question_id, &self.path) {
            (Some(question_id), _) => write!(f, "question {question_id}: {}", self.message),
            (None, Some(path)) => write!(f, "{path}: {}", self.message),
            (None, None) => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        Self {
            question_id: None,
            path: Some(err.field.clone()),
            message: err.to_string(),
            code: Some("invalid_config".into()),
        }
    }
}

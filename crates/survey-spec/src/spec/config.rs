use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::date::IsoDate;
use crate::spec::kind::QuestionKind;

/// Widest `[min, max]` span a rating question may declare.
pub const MAX_RATING_SPAN: i64 = 1000;

/// First violated configuration rule, scoped to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ConfigError {
    pub field: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A selectable option: either a bare label or a value/label pair.
/// The value is matched against answers, the label is displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ChoiceOption {
    Label(String),
    Pair { value: String, label: String },
}

impl ChoiceOption {
    pub fn value(&self) -> &str {
        match self {
            ChoiceOption::Label(label) => label,
            ChoiceOption::Pair { value, .. } => value,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ChoiceOption::Label(label) => label,
            ChoiceOption::Pair { label, .. } => label,
        }
    }
}

/// Short text, long text and email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "minLength")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "maxLength")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NumberConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

/// End-of-scale captions for rating questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ScaleLabels {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
}

/// Star and scale ratings. Bounds are inclusive integers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RatingConfig {
    pub min: i64,
    pub max: i64,
    pub step: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<ScaleLabels>,
}

/// Single choice and dropdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChoiceConfig {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default, alias = "allowOther")]
    pub allow_other: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct MultiChoiceConfig {
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "minSelections")]
    pub min_selections: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "maxSelections")]
    pub max_selections: Option<usize>,
    #[serde(default, alias = "allowOther")]
    pub allow_other: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct BooleanConfig {
    #[serde(alias = "trueLabel")]
    pub true_label: String,
    #[serde(alias = "falseLabel")]
    pub false_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "minDate")]
    pub min_date: Option<IsoDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "maxDate")]
    pub max_date: Option<IsoDate>,
    pub format: String,
}

/// Ranked list ("drag to order").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RankConfig {
    #[serde(default)]
    pub items: Vec<ChoiceOption>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "maxRankable")]
    pub max_rankable: Option<usize>,
}

/// Normalized, kind-tagged configuration. The variant is the question's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum QuestionConfig {
    Text(TextConfig),
    Textarea(TextConfig),
    Email(TextConfig),
    Number(NumberConfig),
    RatingStar(RatingConfig),
    RatingScale(RatingConfig),
    SingleChoice(ChoiceConfig),
    Dropdown(ChoiceConfig),
    MultipleChoice(MultiChoiceConfig),
    Boolean(BooleanConfig),
    Date(DateConfig),
    OrderRank(RankConfig),
}

impl QuestionConfig {
    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionConfig::Text(_) => QuestionKind::Text,
            QuestionConfig::Textarea(_) => QuestionKind::Textarea,
            QuestionConfig::Email(_) => QuestionKind::Email,
            QuestionConfig::Number(_) => QuestionKind::Number,
            QuestionConfig::RatingStar(_) => QuestionKind::RatingStar,
            QuestionConfig::RatingScale(_) => QuestionKind::RatingScale,
            QuestionConfig::SingleChoice(_) => QuestionKind::SingleChoice,
            QuestionConfig::Dropdown(_) => QuestionKind::Dropdown,
            QuestionConfig::MultipleChoice(_) => QuestionKind::MultipleChoice,
            QuestionConfig::Boolean(_) => QuestionKind::Boolean,
            QuestionConfig::Date(_) => QuestionKind::Date,
            QuestionConfig::OrderRank(_) => QuestionKind::OrderRank,
        }
    }

    /// Configured option set for choice-bearing kinds.
    pub fn options(&self) -> Option<&[ChoiceOption]> {
        match self {
            QuestionConfig::SingleChoice(config) | QuestionConfig::Dropdown(config) => {
                Some(&config.options)
            }
            QuestionConfig::MultipleChoice(config) => Some(&config.options),
            QuestionConfig::OrderRank(config) => Some(&config.items),
            _ => None,
        }
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        match self {
            QuestionConfig::Text(config)
            | QuestionConfig::Textarea(config)
            | QuestionConfig::Email(config) => config.check(),
            QuestionConfig::Number(config) => config.check(),
            QuestionConfig::RatingStar(config) | QuestionConfig::RatingScale(config) => {
                config.check()
            }
            QuestionConfig::SingleChoice(config) | QuestionConfig::Dropdown(config) => {
                config.check()
            }
            QuestionConfig::MultipleChoice(config) => config.check(),
            QuestionConfig::Boolean(config) => config.check(),
            QuestionConfig::Date(config) => config.check(),
            QuestionConfig::OrderRank(config) => config.check(),
        }
    }
}

// Serialized without a tag: the kind travels next to the config, not inside it.
impl Serialize for QuestionConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QuestionConfig::Text(config)
            | QuestionConfig::Textarea(config)
            | QuestionConfig::Email(config) => config.serialize(serializer),
            QuestionConfig::Number(config) => config.serialize(serializer),
            QuestionConfig::RatingStar(config) | QuestionConfig::RatingScale(config) => {
                config.serialize(serializer)
            }
            QuestionConfig::SingleChoice(config) | QuestionConfig::Dropdown(config) => {
                config.serialize(serializer)
            }
            QuestionConfig::MultipleChoice(config) => config.serialize(serializer),
            QuestionConfig::Boolean(config) => config.serialize(serializer),
            QuestionConfig::Date(config) => config.serialize(serializer),
            QuestionConfig::OrderRank(config) => config.serialize(serializer),
        }
    }
}

trait ConfigRules {
    fn check(&self) -> Result<(), ConfigError>;
}

impl ConfigRules for TextConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.max_length == Some(0) {
            return Err(ConfigError::new("max_length", "must be positive"));
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min > max
        {
            return Err(ConfigError::new("min_length", "must not exceed max_length"));
        }
        Ok(())
    }
}

impl ConfigRules for NumberConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min, self.max)
            && min > max
        {
            return Err(ConfigError::new("min", "must not exceed max"));
        }
        if let Some(step) = self.step
            && step <= 0.0
        {
            return Err(ConfigError::new("step", "must be positive"));
        }
        Ok(())
    }
}

impl ConfigRules for RatingConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::new("min", "must not exceed max"));
        }
        if self.step <= 0 {
            return Err(ConfigError::new("step", "must be positive"));
        }
        if self
            .max
            .checked_sub(self.min)
            .is_none_or(|span| span > MAX_RATING_SPAN)
        {
            return Err(ConfigError::new(
                "max",
                format!("rating range may span at most {MAX_RATING_SPAN} values"),
            ));
        }
        Ok(())
    }
}

impl ConfigRules for ChoiceConfig {
    fn check(&self) -> Result<(), ConfigError> {
        check_options("options", &self.options)
    }
}

impl ConfigRules for MultiChoiceConfig {
    fn check(&self) -> Result<(), ConfigError> {
        check_options("options", &self.options)?;
        if self.max_selections == Some(0) {
            return Err(ConfigError::new("max_selections", "must be positive"));
        }
        if let (Some(min), Some(max)) = (self.min_selections, self.max_selections)
            && min > max
        {
            return Err(ConfigError::new("min_selections", "must not exceed max_selections"));
        }
        Ok(())
    }
}

impl ConfigRules for BooleanConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.true_label.trim().is_empty() {
            return Err(ConfigError::new("true_label", "cannot be empty"));
        }
        if self.false_label.trim().is_empty() {
            return Err(ConfigError::new("false_label", "cannot be empty"));
        }
        Ok(())
    }
}

impl ConfigRules for DateConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date)
            && min > max
        {
            return Err(ConfigError::new("min_date", "must not be after max_date"));
        }
        Ok(())
    }
}

impl ConfigRules for RankConfig {
    fn check(&self) -> Result<(), ConfigError> {
        check_options("items", &self.items)?;
        match self.max_rankable {
            Some(0) => Err(ConfigError::new("max_rankable", "must be positive")),
            Some(max) if max > self.items.len() => Err(ConfigError::new(
                "max_rankable",
                format!("cannot exceed the {} configured items", self.items.len()),
            )),
            _ => Ok(()),
        }
    }
}

fn check_options(field: &str, options: &[ChoiceOption]) -> Result<(), ConfigError> {
    if options.len() < 2 {
        return Err(ConfigError::new(field, format!("must contain at least 2 {field}")));
    }

    let mut seen = HashSet::new();
    for (idx, option) in options.iter().enumerate() {
        match option {
            ChoiceOption::Label(label) if label.trim().is_empty() => {
                return Err(ConfigError::new(format!("{field}[{idx}]"), "cannot be empty"));
            }
            ChoiceOption::Pair { value, .. } if value.trim().is_empty() => {
                return Err(ConfigError::new(format!("{field}[{idx}].value"), "cannot be empty"));
            }
            ChoiceOption::Pair { label, .. } if label.trim().is_empty() => {
                return Err(ConfigError::new(format!("{field}[{idx}].label"), "cannot be empty"));
            }
            _ => {}
        }
        if !seen.insert(option.value()) {
            return Err(ConfigError::new(
                format!("{field}[{idx}]"),
                format!("duplicate value '{}'", option.value()),
            ));
        }
    }
    Ok(())
}

//! Static table of question kinds.
//!
//! Every kind has one descriptor (label, answer shape, defaults) and one arm in
//! [`parse_config`] and [`config_schema`]. The matches are exhaustive, so a new
//! kind does not compile until all of them are filled in.

use schemars::{Schema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::spec::config::{
    BooleanConfig, ChoiceConfig, ConfigError, DateConfig, MultiChoiceConfig, NumberConfig,
    QuestionConfig, RankConfig, RatingConfig, TextConfig,
};
use crate::spec::kind::{AnswerShape, QuestionKind};

#[derive(Debug)]
pub struct KindDescriptor {
    pub kind: QuestionKind,
    pub label: &'static str,
    pub answer_shape: AnswerShape,
    defaults: fn() -> Value,
}

impl KindDescriptor {
    /// Defaults overlaid before a raw configuration is decoded.
    pub fn default_config(&self) -> Value {
        (self.defaults)()
    }
}

static TEXT: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Text,
    label: "Short Text",
    answer_shape: AnswerShape::Text,
    defaults: empty_defaults,
};

static TEXTAREA: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Textarea,
    label: "Long Text",
    answer_shape: AnswerShape::Text,
    defaults: textarea_defaults,
};

static EMAIL: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Email,
    label: "Email",
    answer_shape: AnswerShape::Text,
    defaults: empty_defaults,
};

static NUMBER: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Number,
    label: "Number",
    answer_shape: AnswerShape::Number,
    defaults: empty_defaults,
};

static RATING_STAR: KindDescriptor = KindDescriptor {
    kind: QuestionKind::RatingStar,
    label: "Star Rating",
    answer_shape: AnswerShape::Number,
    defaults: rating_star_defaults,
};

static RATING_SCALE: KindDescriptor = KindDescriptor {
    kind: QuestionKind::RatingScale,
    label: "Scale Rating",
    answer_shape: AnswerShape::Number,
    defaults: rating_scale_defaults,
};

static SINGLE_CHOICE: KindDescriptor = KindDescriptor {
    kind: QuestionKind::SingleChoice,
    label: "Single Choice",
    answer_shape: AnswerShape::Text,
    defaults: choice_defaults,
};

static DROPDOWN: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Dropdown,
    label: "Dropdown",
    answer_shape: AnswerShape::Text,
    defaults: choice_defaults,
};

static MULTIPLE_CHOICE: KindDescriptor = KindDescriptor {
    kind: QuestionKind::MultipleChoice,
    label: "Multiple Choice",
    answer_shape: AnswerShape::List,
    defaults: choice_defaults,
};

static BOOLEAN: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Boolean,
    label: "Yes/No",
    answer_shape: AnswerShape::Boolean,
    defaults: boolean_defaults,
};

static DATE: KindDescriptor = KindDescriptor {
    kind: QuestionKind::Date,
    label: "Date",
    answer_shape: AnswerShape::Text,
    defaults: date_defaults,
};

static ORDER_RANK: KindDescriptor = KindDescriptor {
    kind: QuestionKind::OrderRank,
    label: "Ranking",
    answer_shape: AnswerShape::OrderedList,
    defaults: empty_defaults,
};

pub fn descriptor(kind: QuestionKind) -> &'static KindDescriptor {
    match kind {
        QuestionKind::Text => &TEXT,
        QuestionKind::Textarea => &TEXTAREA,
        QuestionKind::Email => &EMAIL,
        QuestionKind::Number => &NUMBER,
        QuestionKind::RatingStar => &RATING_STAR,
        QuestionKind::RatingScale => &RATING_SCALE,
        QuestionKind::SingleChoice => &SINGLE_CHOICE,
        QuestionKind::Dropdown => &DROPDOWN,
        QuestionKind::MultipleChoice => &MULTIPLE_CHOICE,
        QuestionKind::Boolean => &BOOLEAN,
        QuestionKind::Date => &DATE,
        QuestionKind::OrderRank => &ORDER_RANK,
    }
}

pub fn descriptors() -> impl Iterator<Item = &'static KindDescriptor> {
    QuestionKind::ALL.into_iter().map(descriptor)
}

/// Validates a raw configuration for `kind` and returns it normalized, with
/// the kind's defaults filled in. Nothing is returned on failure.
pub fn parse_config(kind: QuestionKind, raw: &Value) -> Result<QuestionConfig, ConfigError> {
    let merged = overlay(descriptor(kind).default_config(), raw)?;
    let config = match kind {
        QuestionKind::Text => QuestionConfig::Text(decode(merged)?),
        QuestionKind::Textarea => QuestionConfig::Textarea(decode(merged)?),
        QuestionKind::Email => QuestionConfig::Email(decode(merged)?),
        QuestionKind::Number => QuestionConfig::Number(decode(merged)?),
        QuestionKind::RatingStar => QuestionConfig::RatingStar(decode(merged)?),
        QuestionKind::RatingScale => QuestionConfig::RatingScale(decode(merged)?),
        QuestionKind::SingleChoice => QuestionConfig::SingleChoice(decode(merged)?),
        QuestionKind::Dropdown => QuestionConfig::Dropdown(decode(merged)?),
        QuestionKind::MultipleChoice => QuestionConfig::MultipleChoice(decode(merged)?),
        QuestionKind::Boolean => QuestionConfig::Boolean(decode(merged)?),
        QuestionKind::Date => QuestionConfig::Date(decode(merged)?),
        QuestionKind::OrderRank => QuestionConfig::OrderRank(decode(merged)?),
    };
    config.check()?;
    Ok(config)
}

/// JSON Schema of the configuration object accepted for `kind`.
pub fn config_schema(kind: QuestionKind) -> Schema {
    match kind {
        QuestionKind::Text | QuestionKind::Textarea | QuestionKind::Email => {
            schema_for!(TextConfig)
        }
        QuestionKind::Number => schema_for!(NumberConfig),
        QuestionKind::RatingStar | QuestionKind::RatingScale => schema_for!(RatingConfig),
        QuestionKind::SingleChoice | QuestionKind::Dropdown => schema_for!(ChoiceConfig),
        QuestionKind::MultipleChoice => schema_for!(MultiChoiceConfig),
        QuestionKind::Boolean => schema_for!(BooleanConfig),
        QuestionKind::Date => schema_for!(DateConfig),
        QuestionKind::OrderRank => schema_for!(RankConfig),
    }
}

// Null entries in `raw` keep the default.
fn overlay(defaults: Value, raw: &Value) -> Result<Value, ConfigError> {
    let mut merged = match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    match raw {
        Value::Null => {}
        Value::Object(fields) => {
            for (key, value) in fields {
                if !value.is_null() {
                    merged.insert(canonical_key(key), value.clone());
                }
            }
        }
        _ => return Err(ConfigError::new("config", "must be an object")),
    }
    Ok(Value::Object(merged))
}

/// Snake-case form of a configuration key, so camelCase payloads
/// (`allowOther`) land on the same field as the defaults (`allow_other`).
pub fn canonical_key(key: &str) -> String {
    let mut canonical = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !canonical.is_empty() {
                canonical.push('_');
            }
            canonical.push(ch.to_ascii_lowercase());
        } else {
            canonical.push(ch);
        }
    }
    canonical
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|err| ConfigError::new("config", err.to_string()))
}

fn empty_defaults() -> Value {
    json!({})
}

fn textarea_defaults() -> Value {
    json!({ "max_length": 2000 })
}

fn rating_star_defaults() -> Value {
    json!({ "min": 1, "max": 5, "step": 1 })
}

fn rating_scale_defaults() -> Value {
    json!({
        "min": 0,
        "max": 10,
        "step": 1,
        "labels": { "min": "Not Likely", "max": "Very Likely" }
    })
}

fn choice_defaults() -> Value {
    json!({ "allow_other": false })
}

fn boolean_defaults() -> Value {
    json!({ "true_label": "Yes", "false_label": "No" })
}

fn date_defaults() -> Value {
    json!({ "format": "YYYY-MM-DD" })
}

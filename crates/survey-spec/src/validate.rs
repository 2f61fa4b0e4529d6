use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::answers::{Answer, AnswerInput, AnswerValue, ValidationError};
use crate::date::IsoDate;
use crate::registry::descriptor;
use crate::spec::config::{
    BooleanConfig, ChoiceConfig, ChoiceOption, DateConfig, MultiChoiceConfig, NumberConfig,
    QuestionConfig, RankConfig, RatingConfig, TextConfig,
};
use crate::spec::question::Question;

static EMAIL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    )
    .ok()
});

fn is_email(text: &str) -> bool {
    EMAIL.as_ref().is_some_and(|regex| regex.is_match(text))
}

/// Why a single answer was not accepted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("this question is required")]
    Required,
    #[error("answer must be {expected}")]
    WrongShape { expected: &'static str },
    #[error("unsupported answer value")]
    UnsupportedValue,
    #[error("answer must be at least {min} characters")]
    TooShort { min: usize },
    #[error("answer must be at most {max} characters")]
    TooLong { max: usize },
    #[error("answer must be a valid email address")]
    InvalidEmail,
    #[error("value must be at least {min}")]
    BelowMinimum { min: f64 },
    #[error("value must be at most {max}")]
    AboveMaximum { max: f64 },
    #[error("rating must be a whole number")]
    NotWholeNumber,
    #[error("value must be in steps of {step} from {min}")]
    OffStep { step: i64, min: i64 },
    #[error("invalid option selected: {0}")]
    InvalidOption(String),
    #[error("please select at least {0} options")]
    TooFewSelections(usize),
    #[error("please select at most {0} options")]
    TooManySelections(usize),
    #[error("option selected more than once: {0}")]
    DuplicateSelection(String),
    #[error("duplicate item in ranking: {0}")]
    DuplicateRankItem(String),
    #[error("invalid item in ranking: {0}")]
    InvalidRankItem(String),
    #[error("rank at most {0} items")]
    TooManyRanked(usize),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("date must be on or after {0}")]
    DateTooEarly(IsoDate),
    #[error("date must be on or before {0}")]
    DateTooLate(IsoDate),
    #[error("question answered more than once")]
    DuplicateAnswer,
    #[error("question {0} is not part of this survey")]
    UnknownQuestion(String),
}

impl Rejection {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::Required => "required",
            Rejection::WrongShape { .. } => "type_mismatch",
            Rejection::UnsupportedValue => "unsupported_value",
            Rejection::TooShort { .. } => "min_length",
            Rejection::TooLong { .. } => "max_length",
            Rejection::InvalidEmail => "invalid_email",
            Rejection::BelowMinimum { .. } => "min",
            Rejection::AboveMaximum { .. } => "max",
            Rejection::NotWholeNumber => "not_integer",
            Rejection::OffStep { .. } => "step",
            Rejection::InvalidOption(_) => "invalid_option",
            Rejection::TooFewSelections(_) => "min_selections",
            Rejection::TooManySelections(_) => "max_selections",
            Rejection::DuplicateSelection(_) => "duplicate_selection",
            Rejection::DuplicateRankItem(_) => "duplicate_rank_item",
            Rejection::InvalidRankItem(_) => "invalid_rank_item",
            Rejection::TooManyRanked(_) => "max_rankable",
            Rejection::InvalidDate(_) => "invalid_date",
            Rejection::DateTooEarly(_) => "min_date",
            Rejection::DateTooLate(_) => "max_date",
            Rejection::DuplicateAnswer => "duplicate_answer",
            Rejection::UnknownQuestion(_) => "unknown_question",
        }
    }
}

/// Converts and checks one raw answer. `Ok(None)` means the question was
/// left blank, which only optional questions allow.
pub fn validate_answer(
    question: &Question,
    raw: &Value,
) -> Result<Option<AnswerValue>, Rejection> {
    let value = AnswerValue::from_json(raw)?;
    check_value(question, value.as_ref())?;
    Ok(value)
}

pub fn check_value(question: &Question, value: Option<&AnswerValue>) -> Result<(), Rejection> {
    let Some(value) = value else {
        return if question.required {
            Err(Rejection::Required)
        } else {
            Ok(())
        };
    };

    let shape = descriptor(question.kind()).answer_shape.describe();
    let wrong_shape = || Rejection::WrongShape { expected: shape };

    match question.config() {
        QuestionConfig::Text(config) | QuestionConfig::Textarea(config) => {
            check_text(config, value.as_text().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::Email(config) => {
            let text = value.as_text().ok_or_else(wrong_shape)?;
            if !is_email(text.trim()) {
                return Err(Rejection::InvalidEmail);
            }
            check_text(config, text)
        }
        QuestionConfig::Number(config) => {
            check_number(config, value.as_number().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::RatingStar(config) | QuestionConfig::RatingScale(config) => {
            check_rating(config, value.as_number().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::SingleChoice(config) | QuestionConfig::Dropdown(config) => {
            check_choice(config, value.as_text().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::MultipleChoice(config) => {
            check_multi(config, value.as_list().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::Boolean(config) => check_boolean(config, value).ok_or_else(wrong_shape),
        QuestionConfig::Date(config) => {
            check_date(config, value.as_text().ok_or_else(wrong_shape)?)
        }
        QuestionConfig::OrderRank(config) => {
            check_rank(config, value.as_list().ok_or_else(wrong_shape)?)
        }
    }
}

/// Validates a whole submission against the survey's live questions.
///
/// Answers are checked in submitted order, then required questions are
/// checked in display order. The first failure rejects the response and
/// nothing is returned; on success the non-blank answers come back in
/// submitted order.
pub fn validate_response(
    questions: &[Question],
    answers: &[AnswerInput],
) -> Result<Vec<Answer>, ValidationError> {
    let live: HashMap<&str, &Question> = questions
        .iter()
        .filter(|question| question.is_active())
        .map(|question| (question.id.as_str(), question))
        .collect();

    let mut seen = HashSet::new();
    let mut accepted = Vec::with_capacity(answers.len());
    for (idx, input) in answers.iter().enumerate() {
        let path = Some(format!("/answers/{idx}"));
        let reject = |rejection: Rejection| {
            ValidationError::rejected(&input.question_id, path.clone(), &rejection)
        };

        let Some(question) = live.get(input.question_id.as_str()) else {
            return Err(reject(Rejection::UnknownQuestion(input.question_id.clone())));
        };
        if !seen.insert(input.question_id.as_str()) {
            return Err(reject(Rejection::DuplicateAnswer));
        }
        if let Some(value) = validate_answer(question, &input.value).map_err(reject)? {
            accepted.push(Answer {
                question_id: input.question_id.clone(),
                value,
            });
        }
    }

    let mut required: Vec<&Question> = live
        .values()
        .copied()
        .filter(|question| question.required)
        .collect();
    required.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    if let Some(missing) = required
        .into_iter()
        .find(|question| !seen.contains(question.id.as_str()))
    {
        return Err(ValidationError::rejected(&missing.id, None, &Rejection::Required));
    }

    Ok(accepted)
}

fn check_text(config: &TextConfig, text: &str) -> Result<(), Rejection> {
    let length = text.chars().count();
    if let Some(min) = config.min_length
        && length < min
    {
        return Err(Rejection::TooShort { min });
    }
    if let Some(max) = config.max_length
        && length > max
    {
        return Err(Rejection::TooLong { max });
    }
    Ok(())
}

fn check_number(config: &NumberConfig, number: f64) -> Result<(), Rejection> {
    check_bounds(number, config.min, config.max)
}

fn check_bounds(number: f64, min: Option<f64>, max: Option<f64>) -> Result<(), Rejection> {
    if let Some(min) = min
        && number < min
    {
        return Err(Rejection::BelowMinimum { min });
    }
    if let Some(max) = max
        && number > max
    {
        return Err(Rejection::AboveMaximum { max });
    }
    Ok(())
}

fn check_rating(config: &RatingConfig, number: f64) -> Result<(), Rejection> {
    if number.fract() != 0.0 {
        return Err(Rejection::NotWholeNumber);
    }
    check_bounds(number, Some(config.min as f64), Some(config.max as f64))?;
    // In range, so the cast is exact.
    let offset = number as i64 - config.min;
    if offset % config.step != 0 {
        return Err(Rejection::OffStep {
            step: config.step,
            min: config.min,
        });
    }
    Ok(())
}

fn is_option(options: &[ChoiceOption], value: &str) -> bool {
    options.iter().any(|option| option.value() == value)
}

fn check_choice(config: &ChoiceConfig, selected: &str) -> Result<(), Rejection> {
    if config.allow_other || is_option(&config.options, selected) {
        Ok(())
    } else {
        Err(Rejection::InvalidOption(selected.to_string()))
    }
}

fn check_multi(config: &MultiChoiceConfig, selected: &[String]) -> Result<(), Rejection> {
    let mut seen = HashSet::new();
    for item in selected {
        if !config.allow_other && !is_option(&config.options, item) {
            return Err(Rejection::InvalidOption(item.clone()));
        }
        if !seen.insert(item.as_str()) {
            return Err(Rejection::DuplicateSelection(item.clone()));
        }
    }
    if let Some(min) = config.min_selections
        && selected.len() < min
    {
        return Err(Rejection::TooFewSelections(min));
    }
    if let Some(max) = config.max_selections
        && selected.len() > max
    {
        return Err(Rejection::TooManySelections(max));
    }
    Ok(())
}

// Labels are display text only; the answer itself must be a JSON boolean.
fn check_boolean(_config: &BooleanConfig, value: &AnswerValue) -> Option<()> {
    value.as_bool().map(|_| ())
}

fn check_date(config: &DateConfig, raw: &str) -> Result<(), Rejection> {
    let date = IsoDate::parse_lenient(raw.trim())
        .ok_or_else(|| Rejection::InvalidDate(raw.to_string()))?;
    if let Some(min) = config.min_date
        && date < min
    {
        return Err(Rejection::DateTooEarly(min));
    }
    if let Some(max) = config.max_date
        && date > max
    {
        return Err(Rejection::DateTooLate(max));
    }
    Ok(())
}

fn check_rank(config: &RankConfig, ranking: &[String]) -> Result<(), Rejection> {
    let mut seen = HashSet::new();
    for item in ranking {
        if !seen.insert(item.as_str()) {
            return Err(Rejection::DuplicateRankItem(item.clone()));
        }
        if !is_option(&config.items, item) {
            return Err(Rejection::InvalidRankItem(item.clone()));
        }
    }
    if let Some(max) = config.max_rankable
        && ranking.len() > max
    {
        return Err(Rejection::TooManyRanked(max));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_pattern_accepts_common_addresses() {
        assert!(is_email("jane.doe+news@example.co.uk"));
        assert!(!is_email("jane@"));
        assert!(!is_email("jane@example"));
        assert!(!is_email("two words@example.com"));
    }

    #[test]
    fn bound_messages_print_whole_numbers_plainly() {
        assert_eq!(
            Rejection::BelowMinimum { min: 18.0 }.to_string(),
            "value must be at least 18"
        );
        assert_eq!(
            Rejection::AboveMaximum { max: 2.5 }.to_string(),
            "value must be at most 2.5"
        );
    }

    #[test]
    fn rating_step_is_counted_from_min() {
        let config = RatingConfig {
            min: 1,
            max: 9,
            step: 2,
            labels: None,
        };
        assert_eq!(check_rating(&config, 5.0), Ok(()));
        assert_eq!(
            check_rating(&config, 4.0),
            Err(Rejection::OffStep { step: 2, min: 1 })
        );
        assert_eq!(check_rating(&config, 4.5), Err(Rejection::NotWholeNumber));
    }
}

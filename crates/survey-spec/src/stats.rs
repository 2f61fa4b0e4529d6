//! Per-question statistics for survey owners.
//!
//! Aggregation is read-only over whatever responses the caller loaded; it does
//! not need to see a point-in-time snapshot.

use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerValue, Response};
use crate::date::IsoDate;
use crate::spec::config::{ChoiceOption, QuestionConfig, RatingConfig};
use crate::spec::kind::QuestionKind;
use crate::spec::question::{Question, QuestionId, SurveyId};

pub const DEFAULT_RECENT_SAMPLE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsOptions {
    /// How many free-text answers to keep, newest first.
    pub recent_sample: usize,
}

impl Default for StatsOptions {
    fn default() -> Self {
        Self {
            recent_sample: DEFAULT_RECENT_SAMPLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Bucket {
    pub value: String,
    pub label: String,
    pub count: usize,
    /// Share of this question's answers, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatsSummary {
    Distribution {
        buckets: Vec<Bucket>,
    },
    Rating {
        buckets: Vec<Bucket>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mean: Option<f64>,
    },
    /// How often each item was ranked first.
    TopRanked {
        buckets: Vec<Bucket>,
    },
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mean: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    Sample {
        recent: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionStats {
    pub question_id: QuestionId,
    pub title: String,
    pub kind: QuestionKind,
    pub answer_count: usize,
    pub summary: StatsSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyStats {
    pub survey_id: SurveyId,
    pub total_responses: usize,
    pub questions: Vec<QuestionStats>,
}

/// Summarizes `responses` for every active question, in display order.
pub fn aggregate(
    survey_id: &str,
    questions: &[Question],
    responses: &[Response],
    options: StatsOptions,
) -> SurveyStats {
    let mut chronological: Vec<&Response> = responses
        .iter()
        .filter(|response| response.survey_id == survey_id)
        .collect();
    // Stable, so equal timestamps keep submission order.
    chronological.sort_by_key(|response| response.submitted_at);

    let mut active: Vec<&Question> = questions
        .iter()
        .filter(|question| question.is_active())
        .collect();
    active.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));

    let questions = active
        .into_iter()
        .map(|question| {
            let answers: Vec<&AnswerValue> = chronological
                .iter()
                .filter_map(|response| response.answer_for(&question.id))
                .collect();
            QuestionStats {
                question_id: question.id.clone(),
                title: question.title.clone(),
                kind: question.kind(),
                answer_count: answers.len(),
                summary: summarize(question.config(), &answers, options),
            }
        })
        .collect();

    SurveyStats {
        survey_id: survey_id.to_string(),
        total_responses: chronological.len(),
        questions,
    }
}

fn summarize(
    config: &QuestionConfig,
    answers: &[&AnswerValue],
    options: StatsOptions,
) -> StatsSummary {
    let answered = answers.len();
    match config {
        QuestionConfig::Text(_) | QuestionConfig::Textarea(_) | QuestionConfig::Email(_) => {
            StatsSummary::Sample {
                recent: recent_texts(answers, options.recent_sample),
            }
        }
        QuestionConfig::Number(_) => numeric(answers),
        QuestionConfig::RatingStar(config) | QuestionConfig::RatingScale(config) => {
            rating(config, answers)
        }
        QuestionConfig::SingleChoice(config) | QuestionConfig::Dropdown(config) => {
            let mut tally = Tally::seeded(&config.options);
            for answer in answers {
                tally.add(&answer.bucket_key());
            }
            StatsSummary::Distribution {
                buckets: tally.finish(answered),
            }
        }
        QuestionConfig::MultipleChoice(config) => {
            let mut tally = Tally::seeded(&config.options);
            for answer in answers {
                match answer.as_list() {
                    Some(items) => items.iter().for_each(|item| tally.add(item)),
                    None => tally.add(&answer.bucket_key()),
                }
            }
            StatsSummary::Distribution {
                buckets: tally.finish(answered),
            }
        }
        QuestionConfig::Boolean(config) => {
            let mut tally = Tally::default();
            tally.seed("true", &config.true_label);
            tally.seed("false", &config.false_label);
            for answer in answers {
                tally.add(&answer.bucket_key());
            }
            StatsSummary::Distribution {
                buckets: tally.finish(answered),
            }
        }
        QuestionConfig::Date(_) => dates(answers),
        QuestionConfig::OrderRank(config) => {
            let mut tally = Tally::seeded(&config.items);
            for answer in answers {
                let first = match answer.as_list() {
                    Some(items) => items.first().cloned(),
                    None => Some(answer.bucket_key()),
                };
                if let Some(first) = first {
                    tally.add(&first);
                }
            }
            StatsSummary::TopRanked {
                buckets: tally.finish(answered),
            }
        }
    }
}

fn recent_texts(answers: &[&AnswerValue], limit: usize) -> Vec<String> {
    answers
        .iter()
        .rev()
        .filter_map(|answer| answer.as_text())
        .filter(|text| !text.trim().is_empty())
        .take(limit)
        .map(str::to_owned)
        .collect()
}

fn numeric(answers: &[&AnswerValue]) -> StatsSummary {
    let numbers: Vec<f64> = answers
        .iter()
        .filter_map(|answer| answer.as_number())
        .collect();
    StatsSummary::Numeric {
        mean: mean(&numbers),
        min: numbers.iter().copied().reduce(f64::min),
        max: numbers.iter().copied().reduce(f64::max),
    }
}

fn rating(config: &RatingConfig, answers: &[&AnswerValue]) -> StatsSummary {
    let numbers: Vec<f64> = answers
        .iter()
        .filter_map(|answer| answer.as_number())
        .collect();
    let mut counts: BTreeMap<i64, usize> = (config.min..=config.max).map(|v| (v, 0)).collect();
    for number in &numbers {
        if number.fract() == 0.0
            && let Some(count) = counts.get_mut(&(*number as i64))
        {
            *count += 1;
        }
    }

    let labels = config.labels.as_ref();
    let answered = answers.len();
    let buckets = counts
        .into_iter()
        .map(|(value, count)| {
            let caption = match labels {
                Some(labels) if value == config.min => labels.min.clone(),
                Some(labels) if value == config.max => labels.max.clone(),
                _ => None,
            };
            Bucket {
                value: value.to_string(),
                label: caption.unwrap_or_else(|| value.to_string()),
                count,
                percentage: percentage(count, answered),
            }
        })
        .collect();

    StatsSummary::Rating {
        buckets,
        mean: mean(&numbers),
    }
}

fn dates(answers: &[&AnswerValue]) -> StatsSummary {
    let mut counts: BTreeMap<IsoDate, usize> = BTreeMap::new();
    for answer in answers {
        if let Some(date) = answer.as_text().and_then(IsoDate::parse_lenient) {
            *counts.entry(date).or_default() += 1;
        }
    }
    let answered = answers.len();
    let buckets = counts
        .into_iter()
        .map(|(date, count)| Bucket {
            value: date.to_string(),
            label: date.to_string(),
            count,
            percentage: percentage(count, answered),
        })
        .collect();
    StatsSummary::Distribution { buckets }
}

/// Buckets in insertion order: configured values first, then unseen
/// observed values as they appear.
#[derive(Default)]
struct Tally {
    buckets: Vec<(String, String, usize)>,
    index: HashMap<String, usize>,
}

impl Tally {
    fn seeded(options: &[ChoiceOption]) -> Self {
        let mut tally = Self::default();
        for option in options {
            tally.seed(option.value(), option.label());
        }
        tally
    }

    fn seed(&mut self, value: &str, label: &str) {
        if !self.index.contains_key(value) {
            self.index.insert(value.to_string(), self.buckets.len());
            self.buckets.push((value.to_string(), label.to_string(), 0));
        }
    }

    fn add(&mut self, value: &str) {
        self.seed(value, value);
        if let Some(&slot) = self.index.get(value) {
            self.buckets[slot].2 += 1;
        }
    }

    fn finish(self, answered: usize) -> Vec<Bucket> {
        self.buckets
            .into_iter()
            .map(|(value, label, count)| Bucket {
                value,
                label,
                count,
                percentage: percentage(count, answered),
            })
            .collect()
    }
}

fn percentage(count: usize, answered: usize) -> f64 {
    if answered == 0 {
        0.0
    } else {
        round1(count as f64 / answered as f64 * 100.0)
    }
}

fn mean(numbers: &[f64]) -> Option<f64> {
    if numbers.is_empty() {
        return None;
    }
    Some(round1(numbers.iter().sum::<f64>() / numbers.len() as f64))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round1(13.0 / 3.0), 4.3);
        assert_eq!(percentage(1, 3), 33.3);
        assert_eq!(percentage(2, 3), 66.7);
        assert_eq!(percentage(0, 0), 0.0);
    }

    #[test]
    fn tally_keeps_configured_order_then_first_seen() {
        let mut tally = Tally::seeded(&[
            ChoiceOption::Label("Red".into()),
            ChoiceOption::Pair {
                value: "g".into(),
                label: "Green".into(),
            },
        ]);
        tally.add("Blue");
        tally.add("g");
        tally.add("Blue");
        let buckets = tally.finish(3);
        let summary: Vec<_> = buckets
            .iter()
            .map(|bucket| (bucket.value.as_str(), bucket.label.as_str(), bucket.count))
            .collect();
        assert_eq!(
            summary,
            vec![("Red", "Red", 0), ("g", "Green", 1), ("Blue", "Blue", 2)]
        );
    }

    #[test]
    fn empty_mean_is_absent() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[5.0, 5.0, 3.0]), Some(4.3));
    }
}

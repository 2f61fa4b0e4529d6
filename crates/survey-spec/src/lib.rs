#![allow(missing_docs)]

pub mod answers;
pub mod date;
pub mod registry;
pub mod spec;
pub mod stats;
pub mod validate;

pub use answers::{Answer, AnswerInput, AnswerValue, Response, ValidationError};
pub use date::IsoDate;
pub use registry::{
    KindDescriptor, canonical_key, config_schema, descriptor, descriptors, parse_config,
};
pub use spec::{
    AnswerShape, BooleanConfig, ChoiceConfig, ChoiceOption, ConfigError, DateConfig,
    MultiChoiceConfig, NumberConfig, Question, QuestionConfig, QuestionId, QuestionKind,
    QuestionRecord, QuestionStatus, RankConfig, RatingConfig, ResponseId, ScaleLabels, Survey,
    SurveyId, SurveyStatus, TextConfig, UnknownKind,
};
pub use stats::{
    Bucket, DEFAULT_RECENT_SAMPLE, QuestionStats, StatsOptions, StatsSummary, SurveyStats,
    aggregate,
};
pub use validate::{Rejection, check_value, validate_answer, validate_response};

pub mod config;
pub mod kind;
pub mod question;
pub mod survey;

pub use config::{
    BooleanConfig, ChoiceConfig, ChoiceOption, ConfigError, DateConfig, MAX_RATING_SPAN,
    MultiChoiceConfig, NumberConfig, QuestionConfig, RankConfig, RatingConfig, ScaleLabels,
    TextConfig,
};
pub use kind::{AnswerShape, QuestionKind, UnknownKind};
pub use question::{Question, QuestionId, QuestionRecord, QuestionStatus, ResponseId, SurveyId};
pub use survey::{Survey, SurveyStatus};

//! Storage seam for the survey engine.
//!
//! The engine only talks to [`SurveyStore`]. Every mutation of a survey's
//! question set is a compare-and-swap on that survey's version counter, so two
//! writers that planned against the same snapshot cannot both land.

use async_trait::async_trait;
use thiserror::Error;

use survey_spec::{Question, QuestionId, Response, Survey, SurveyStatus};

mod memory;
mod snapshot;

pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SurveySnapshot};

/// All questions of one survey (deleted ones included) at a given version.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionSet {
    pub version: u64,
    pub questions: Vec<Question>,
}

impl QuestionSet {
    pub fn active(&self) -> impl Iterator<Item = &Question> {
        self.questions
            .iter()
            .filter(|question| question.is_active())
    }

    pub fn get(&self, question_id: &str) -> Option<&Question> {
        self.questions
            .iter()
            .find(|question| question.id == question_id)
    }
}

/// Atomic write against one survey's question set.
#[derive(Debug, Clone, Default)]
pub struct CommitRequest {
    /// Version the writes were planned against.
    pub expected_version: u64,
    /// Questions to insert or replace, matched by id.
    pub writes: Vec<Question>,
    /// Questions that must still have no responses when the commit lands.
    pub unanswered: Vec<QuestionId>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error("question set changed (expected version {expected}, found {actual})")]
    VersionConflict { expected: u64, actual: u64 },
    #[error("question '{question_id}' already has responses")]
    Answered { question_id: QuestionId },
    #[error("{entity} '{id}' already exists")]
    Duplicate { entity: &'static str, id: String },
    #[error("inconsistent data: {0}")]
    Inconsistent(String),
    #[error("snapshot io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

#[async_trait]
pub trait SurveyStore: Send + Sync + 'static {
    async fn insert_survey(&self, survey: Survey) -> Result<(), StoreError>;

    async fn survey(&self, survey_id: &str) -> Result<Survey, StoreError>;

    /// Bumps the question-set version, so writes planned under the old
    /// status fail their commit.
    async fn set_survey_status(
        &self,
        survey_id: &str,
        status: SurveyStatus,
    ) -> Result<(), StoreError>;

    async fn question_set(&self, survey_id: &str) -> Result<QuestionSet, StoreError>;

    async fn question(&self, question_id: &str) -> Result<Question, StoreError>;

    /// Applies `request` only if the survey is still at `expected_version`
    /// and every `unanswered` question has no responses. Returns the new
    /// version.
    async fn commit_questions(
        &self,
        survey_id: &str,
        request: CommitRequest,
    ) -> Result<u64, StoreError>;

    async fn answer_count(&self, question_id: &str) -> Result<usize, StoreError>;

    /// Stores a response validated against `expected_version` of the survey's
    /// question set. Does not change the version.
    async fn insert_response(
        &self,
        response: Response,
        expected_version: u64,
    ) -> Result<(), StoreError>;

    async fn responses(&self, survey_id: &str) -> Result<Vec<Response>, StoreError>;
}

use thiserror::Error;

use survey_spec::{ConfigError, ValidationError};
use survey_store::StoreError;

/// Failures surfaced to callers of the engine.
#[derive(Debug, Error)]
pub enum SurveyError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not authorized: {0}")]
    Authorization(String),
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },
    #[error(transparent)]
    Store(StoreError),
}

impl SurveyError {
    pub fn conflict(message: impl Into<String>) -> Self {
        SurveyError::Conflict(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SurveyError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Short name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            SurveyError::Validation(_) => "validation",
            SurveyError::Conflict(_) => "conflict",
            SurveyError::Authorization(_) => "authorization",
            SurveyError::NotFound { .. } => "not_found",
            SurveyError::Store(_) => "store",
        }
    }

    pub(crate) fn is_version_conflict(&self) -> bool {
        matches!(self, SurveyError::Store(StoreError::VersionConflict { .. }))
    }
}

impl From<ConfigError> for SurveyError {
    fn from(err: ConfigError) -> Self {
        SurveyError::Validation(err.into())
    }
}

impl From<StoreError> for SurveyError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => SurveyError::NotFound { entity, id },
            other => SurveyError::Store(other),
        }
    }
}

use std::future::Future;
use std::sync::Arc;

use tracing::warn;

use survey_spec::{Question, Survey};
use survey_store::{QuestionSet, SurveyStore};

use crate::config::EngineConfig;
use crate::error::SurveyError;
use crate::order::{Shift, Slot};

mod questions;
mod responses;

pub use questions::{NewQuestion, QuestionPatch};

/// Entry point for question and response operations on top of a store.
///
/// Callers (HTTP handlers, the CLI) are expected to have authenticated the
/// requester already; [`SurveyEngine::authorize_owner`] is the ownership
/// check point they call before owner-only operations.
pub struct SurveyEngine<S> {
    store: Arc<S>,
    config: EngineConfig,
}

impl<S> Clone for SurveyEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
        }
    }
}

impl<S: SurveyStore> SurveyEngine<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the survey if `requester` owns it.
    pub async fn authorize_owner(
        &self,
        survey_id: &str,
        requester: &str,
    ) -> Result<Survey, SurveyError> {
        let survey = self.live_survey(survey_id).await?;
        if !survey.is_owned_by(requester) {
            return Err(SurveyError::Authorization(format!(
                "user '{requester}' does not own survey '{survey_id}'"
            )));
        }
        Ok(survey)
    }

    /// Active questions in display order.
    pub async fn active_questions(&self, survey_id: &str) -> Result<Vec<Question>, SurveyError> {
        self.live_survey(survey_id).await?;
        let set = self.store.question_set(survey_id).await?;
        Ok(sorted_active(&set))
    }

    /// Survey that exists and is not soft-deleted.
    async fn live_survey(&self, survey_id: &str) -> Result<Survey, SurveyError> {
        let survey = self.store.survey(survey_id).await?;
        if survey.status.is_deleted() {
            return Err(SurveyError::not_found("survey", survey_id));
        }
        Ok(survey)
    }

    /// Survey whose question set may change shape (insert, move, delete).
    async fn structurally_editable(&self, survey_id: &str) -> Result<Survey, SurveyError> {
        let survey = self.store.survey(survey_id).await?;
        if !survey.status.allows_structural_edits() {
            return Err(SurveyError::conflict(format!(
                "survey '{survey_id}' is {} and its questions cannot be rearranged",
                survey.status
            )));
        }
        Ok(survey)
    }

    /// Runs `attempt` until it stops losing commit races, at most
    /// `max_commit_attempts` times.
    async fn with_retry<T, F, Fut>(
        &self,
        operation: &'static str,
        mut attempt: F,
    ) -> Result<T, SurveyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SurveyError>>,
    {
        let attempts = self.config.max_commit_attempts.max(1);
        for round in 1..=attempts {
            match attempt().await {
                Err(err) if err.is_version_conflict() => {
                    warn!(operation, round, attempts, error = %err, "lost commit race");
                }
                other => return other,
            }
        }
        Err(SurveyError::conflict(format!(
            "{operation} kept losing to concurrent edits after {attempts} attempts"
        )))
    }
}

fn sorted_active(set: &QuestionSet) -> Vec<Question> {
    let mut active: Vec<Question> = set.active().cloned().collect();
    active.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    active
}

fn slots(set: &QuestionSet) -> Vec<Slot> {
    set.active().map(Slot::of).collect()
}

/// Copies of the shifted questions carrying their new order.
fn shifted(set: &QuestionSet, shifts: &[Shift]) -> Result<Vec<Question>, SurveyError> {
    shifts
        .iter()
        .map(|shift| {
            let mut question = set
                .get(&shift.id)
                .cloned()
                .ok_or_else(|| SurveyError::not_found("question", shift.id.clone()))?;
            question.order = shift.to;
            Ok(question)
        })
        .collect()
}

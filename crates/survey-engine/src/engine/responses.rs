use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use survey_spec::{AnswerInput, Response, StatsOptions, SurveyStats, aggregate, validate_response};
use survey_store::SurveyStore;

use super::SurveyEngine;
use crate::error::SurveyError;

impl<S: SurveyStore> SurveyEngine<S> {
    /// Validates `answers` against the survey's active questions and stores
    /// them as one response.
    ///
    /// The response is committed against the question-set version it was
    /// validated with; a question edit landing in between forces a fresh
    /// validation.
    #[instrument(skip(self, answers), fields(answers = answers.len()))]
    pub async fn submit_response(
        &self,
        survey_id: &str,
        respondent_id: Option<String>,
        answers: Vec<AnswerInput>,
    ) -> Result<Response, SurveyError> {
        let respondent_id = respondent_id.as_deref();
        let answers = answers.as_slice();
        self.with_retry("submit_response", move || {
            self.try_submit(survey_id, respondent_id, answers)
        })
        .await
    }

    /// Per-question statistics for every active question, in display order.
    #[instrument(skip(self))]
    pub async fn compute_stats(&self, survey_id: &str) -> Result<SurveyStats, SurveyError> {
        self.live_survey(survey_id).await?;
        let set = self.store.question_set(survey_id).await?;
        let responses = self.store.responses(survey_id).await?;
        debug!(responses = responses.len(), "aggregating");
        Ok(aggregate(
            survey_id,
            &set.questions,
            &responses,
            StatsOptions {
                recent_sample: self.config.recent_answer_sample,
            },
        ))
    }

    async fn try_submit(
        &self,
        survey_id: &str,
        respondent_id: Option<&str>,
        answers: &[AnswerInput],
    ) -> Result<Response, SurveyError> {
        let survey = self.live_survey(survey_id).await?;
        if !survey.status.accepts_responses() {
            return Err(SurveyError::conflict(format!(
                "survey '{survey_id}' is {} and is not accepting responses",
                survey.status
            )));
        }
        let set = self.store.question_set(survey_id).await?;
        let answers = validate_response(&set.questions, answers)?;

        let response = Response {
            id: Uuid::new_v4().to_string(),
            survey_id: survey_id.to_string(),
            respondent_id: respondent_id.map(str::to_string),
            answers,
            submitted_at: OffsetDateTime::now_utc(),
        };
        self.store
            .insert_response(response.clone(), set.version)
            .await?;
        debug!(response_id = %response.id, "response accepted");
        Ok(response)
    }
}

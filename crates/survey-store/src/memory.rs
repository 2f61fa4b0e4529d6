use std::collections::HashSet;

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use survey_spec::{Question, QuestionId, Response, Survey, SurveyId, SurveyStatus};

use crate::snapshot::{Snapshot, SurveySnapshot};
use crate::{CommitRequest, QuestionSet, StoreError, SurveyStore};

#[derive(Debug, Clone)]
struct SurveyEntry {
    survey: Survey,
    version: u64,
    questions: Vec<Question>,
    responses: Vec<Response>,
}

impl SurveyEntry {
    fn is_answered(&self, question_id: &str) -> bool {
        self.responses
            .iter()
            .any(|response| response.answer_for(question_id).is_some())
    }
}

/// In-process store. Each survey lives in one map entry, so a commit holds
/// that entry's lock for its check-and-write and other surveys never contend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    surveys: DashMap<SurveyId, SurveyEntry>,
    question_index: DashMap<QuestionId, SurveyId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let store = Self::new();
        for entry in snapshot.surveys {
            let survey_id = entry.survey.id.clone();
            if store.surveys.contains_key(&survey_id) {
                return Err(StoreError::Duplicate {
                    entity: "survey",
                    id: survey_id,
                });
            }
            for question in &entry.questions {
                if question.survey_id != survey_id {
                    return Err(StoreError::Inconsistent(format!(
                        "question '{}' is listed under survey '{survey_id}' but belongs to '{}'",
                        question.id, question.survey_id
                    )));
                }
                if store
                    .question_index
                    .insert(question.id.clone(), survey_id.clone())
                    .is_some()
                {
                    return Err(StoreError::Duplicate {
                        entity: "question",
                        id: question.id.clone(),
                    });
                }
            }
            store.surveys.insert(
                survey_id,
                SurveyEntry {
                    survey: entry.survey,
                    version: entry.version,
                    questions: entry.questions,
                    responses: entry.responses,
                },
            );
        }
        Ok(store)
    }

    /// Copies the current contents, ordered by survey id.
    pub fn snapshot(&self) -> Snapshot {
        let mut surveys: Vec<SurveySnapshot> = self
            .surveys
            .iter()
            .map(|entry| SurveySnapshot {
                survey: entry.survey.clone(),
                version: entry.version,
                questions: entry.questions.clone(),
                responses: entry.responses.clone(),
            })
            .collect();
        surveys.sort_by(|a, b| a.survey.id.cmp(&b.survey.id));
        Snapshot { surveys }
    }

    fn owner_of(&self, question_id: &str) -> Result<SurveyId, StoreError> {
        self.question_index
            .get(question_id)
            .map(|owner| owner.value().clone())
            .ok_or_else(|| StoreError::not_found("question", question_id))
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn insert_survey(&self, survey: Survey) -> Result<(), StoreError> {
        match self.surveys.entry(survey.id.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate {
                entity: "survey",
                id: survey.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(SurveyEntry {
                    survey,
                    version: 0,
                    questions: Vec::new(),
                    responses: Vec::new(),
                });
                Ok(())
            }
        }
    }

    async fn survey(&self, survey_id: &str) -> Result<Survey, StoreError> {
        self.surveys
            .get(survey_id)
            .map(|entry| entry.survey.clone())
            .ok_or_else(|| StoreError::not_found("survey", survey_id))
    }

    async fn set_survey_status(
        &self,
        survey_id: &str,
        status: SurveyStatus,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .surveys
            .get_mut(survey_id)
            .ok_or_else(|| StoreError::not_found("survey", survey_id))?;
        entry.survey.status = status;
        entry.version += 1;
        debug!(survey_id, %status, version = entry.version, "survey status changed");
        Ok(())
    }

    async fn question_set(&self, survey_id: &str) -> Result<QuestionSet, StoreError> {
        self.surveys
            .get(survey_id)
            .map(|entry| QuestionSet {
                version: entry.version,
                questions: entry.questions.clone(),
            })
            .ok_or_else(|| StoreError::not_found("survey", survey_id))
    }

    async fn question(&self, question_id: &str) -> Result<Question, StoreError> {
        let survey_id = self.owner_of(question_id)?;
        self.surveys
            .get(&survey_id)
            .and_then(|entry| {
                entry
                    .questions
                    .iter()
                    .find(|question| question.id == question_id)
                    .cloned()
            })
            .ok_or_else(|| StoreError::not_found("question", question_id))
    }

    async fn commit_questions(
        &self,
        survey_id: &str,
        request: CommitRequest,
    ) -> Result<u64, StoreError> {
        let mut entry = self
            .surveys
            .get_mut(survey_id)
            .ok_or_else(|| StoreError::not_found("survey", survey_id))?;

        if entry.version != request.expected_version {
            return Err(StoreError::VersionConflict {
                expected: request.expected_version,
                actual: entry.version,
            });
        }
        if let Some(question_id) = request
            .unanswered
            .iter()
            .find(|question_id| entry.is_answered(question_id))
        {
            return Err(StoreError::Answered {
                question_id: question_id.clone(),
            });
        }

        let mut written = HashSet::new();
        for question in &request.writes {
            if question.survey_id != survey_id {
                return Err(StoreError::Inconsistent(format!(
                    "question '{}' belongs to survey '{}'",
                    question.id, question.survey_id
                )));
            }
            if !written.insert(question.id.as_str()) {
                return Err(StoreError::Duplicate {
                    entity: "question",
                    id: question.id.clone(),
                });
            }
            if let Some(owner) = self.question_index.get(&question.id)
                && owner.value() != survey_id
            {
                return Err(StoreError::Duplicate {
                    entity: "question",
                    id: question.id.clone(),
                });
            }
        }

        let count = request.writes.len();
        for question in request.writes {
            self.question_index
                .insert(question.id.clone(), survey_id.to_string());
            match entry
                .questions
                .iter()
                .position(|existing| existing.id == question.id)
            {
                Some(slot) => entry.questions[slot] = question,
                None => entry.questions.push(question),
            }
        }
        entry.version += 1;
        let version = entry.version;
        debug!(survey_id, version, writes = count, "question set committed");
        Ok(version)
    }

    async fn answer_count(&self, question_id: &str) -> Result<usize, StoreError> {
        let survey_id = self.owner_of(question_id)?;
        let entry = self
            .surveys
            .get(&survey_id)
            .ok_or_else(|| StoreError::not_found("survey", survey_id.clone()))?;
        Ok(entry
            .responses
            .iter()
            .filter(|response| response.answer_for(question_id).is_some())
            .count())
    }

    async fn insert_response(
        &self,
        response: Response,
        expected_version: u64,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .surveys
            .get_mut(&response.survey_id)
            .ok_or_else(|| StoreError::not_found("survey", response.survey_id.clone()))?;
        if entry.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
                actual: entry.version,
            });
        }
        if entry
            .responses
            .iter()
            .any(|stored| stored.id == response.id)
        {
            return Err(StoreError::Duplicate {
                entity: "response",
                id: response.id,
            });
        }
        debug!(
            survey_id = %response.survey_id,
            response_id = %response.id,
            answers = response.answers.len(),
            "response stored"
        );
        entry.responses.push(response);
        Ok(())
    }

    async fn responses(&self, survey_id: &str) -> Result<Vec<Response>, StoreError> {
        self.surveys
            .get(survey_id)
            .map(|entry| entry.responses.clone())
            .ok_or_else(|| StoreError::not_found("survey", survey_id))
    }
}

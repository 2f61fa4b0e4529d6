use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument};
use uuid::Uuid;

use survey_spec::{
    ConfigError, Question, QuestionConfig, QuestionKind, QuestionStatus, SurveyId,
    ValidationError, canonical_key, parse_config,
};
use survey_store::{CommitRequest, StoreError, SurveyStore};

use super::{SurveyEngine, shifted, slots, sorted_active};
use crate::error::SurveyError;
use crate::order::{OrderError, Shift, next_slot, plan_insert, plan_move, plan_normalize};

/// Fields for a question to be created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub survey_id: SurveyId,
    pub kind: QuestionKind,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    /// Target position. Appends after the last active question when absent.
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub config: Value,
}

/// Partial update. Absent fields are left alone; a field equal to the stored
/// value does not count as a change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub order: Option<i64>,
    /// Top-level keys merged onto the stored configuration.
    #[serde(default)]
    pub config: Option<Value>,
    /// Accepted only when it names the current kind.
    #[serde(default)]
    pub kind: Option<QuestionKind>,
}

impl QuestionPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// What an update changes besides the title. Any of these is refused once
/// the question has responses.
#[derive(Debug, Default)]
struct GuardedChanges {
    config: bool,
    required: bool,
    order: bool,
}

impl GuardedChanges {
    fn any(&self) -> bool {
        self.config || self.required || self.order
    }

    fn refusal(&self) -> SurveyError {
        let field = if self.config {
            "config"
        } else if self.required {
            "required"
        } else {
            "order"
        };
        SurveyError::conflict(format!("cannot update {field} after responses exist"))
    }
}

fn clean_title(title: &str) -> Result<String, SurveyError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new("title cannot be empty")
            .with_path("title")
            .with_code("invalid_title")
            .into());
    }
    Ok(trimmed.to_string())
}

fn order_error(err: OrderError) -> SurveyError {
    match err {
        OrderError::UnknownQuestion(id) => SurveyError::not_found("question", id),
        out_of_range => ValidationError::new(out_of_range.to_string())
            .with_path("order")
            .with_code("order_out_of_range")
            .into(),
    }
}

/// Shallow merge of `patch` onto the stored configuration. Null keys keep the
/// stored value.
fn merge_config(current: &Value, patch: &Value) -> Result<Value, ConfigError> {
    let Value::Object(fields) = patch else {
        if patch.is_null() {
            return Ok(current.clone());
        }
        return Err(ConfigError::new("config", "must be an object"));
    };
    let mut merged = match current {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    for (key, value) in fields {
        if !value.is_null() {
            merged.insert(canonical_key(key), value.clone());
        }
    }
    Ok(Value::Object(merged))
}

impl<S: SurveyStore> SurveyEngine<S> {
    /// Validates and inserts a question, shifting the questions at or after
    /// its position. The shift and the insert land in one commit.
    #[instrument(skip(self, new), fields(survey_id = %new.survey_id, kind = %new.kind))]
    pub async fn create_question(&self, new: NewQuestion) -> Result<Question, SurveyError> {
        let title = clean_title(&new.title)?;
        if let Some(order) = new.order
            && order < 0
        {
            return Err(ValidationError::new("order must be a non-negative integer")
                .with_path("order")
                .with_code("invalid_order")
                .into());
        }
        let config = parse_config(new.kind, &new.config)?;

        let new = &new;
        let title = &title;
        let config = &config;
        self.with_retry(
            "create_question",
            move || self.try_create(new, title, config),
        )
        .await
    }

    /// Applies a partial update.
    ///
    /// The kind never changes. Once a question has responses only its title
    /// may change; that check is repeated inside the commit so a response
    /// arriving mid-update cannot slip past it.
    #[instrument(skip(self, patch))]
    pub async fn update_question(
        &self,
        question_id: &str,
        patch: QuestionPatch,
    ) -> Result<Question, SurveyError> {
        let patch = &patch;
        self.with_retry(
            "update_question",
            move || self.try_update(question_id, patch),
        )
        .await
    }

    /// Moves a question to `target`, shifting the questions in between.
    pub async fn move_question(
        &self,
        question_id: &str,
        target: i64,
    ) -> Result<Question, SurveyError> {
        self.update_question(
            question_id,
            QuestionPatch {
                order: Some(target),
                ..QuestionPatch::default()
            },
        )
        .await
    }

    /// Soft-deletes a question. Remaining orders keep their gap until
    /// [`SurveyEngine::normalize_order`] runs.
    #[instrument(skip(self))]
    pub async fn delete_question(&self, question_id: &str) -> Result<(), SurveyError> {
        self.with_retry("delete_question", move || self.try_delete(question_id))
            .await
    }

    /// Renumbers active questions to a contiguous range from the order base.
    #[instrument(skip(self))]
    pub async fn normalize_order(&self, survey_id: &str) -> Result<Vec<Question>, SurveyError> {
        self.with_retry("normalize_order", move || self.try_normalize(survey_id))
            .await
    }

    async fn try_create(
        &self,
        new: &NewQuestion,
        title: &str,
        config: &QuestionConfig,
    ) -> Result<Question, SurveyError> {
        self.structurally_editable(&new.survey_id).await?;
        let set = self.store.question_set(&new.survey_id).await?;
        let current = slots(&set);
        let base = self.config.order_base;
        let requested = new
            .order
            .unwrap_or_else(|| i64::from(next_slot(&current, base)));
        let (position, shifts) = plan_insert(&current, base, requested).map_err(order_error)?;
        debug!(position, shifted = shifts.len(), "planned insert");

        let question = Question::new(
            Uuid::new_v4().to_string(),
            new.survey_id.clone(),
            title,
            new.required,
            position,
            config.clone(),
        );
        let mut writes = shifted(&set, &shifts)?;
        writes.push(question.clone());
        self.store
            .commit_questions(
                &new.survey_id,
                CommitRequest {
                    expected_version: set.version,
                    writes,
                    unanswered: Vec::new(),
                },
            )
            .await?;
        Ok(question)
    }

    async fn try_update(
        &self,
        question_id: &str,
        patch: &QuestionPatch,
    ) -> Result<Question, SurveyError> {
        let stored = self.store.question(question_id).await?;
        if !stored.is_active() {
            return Err(SurveyError::not_found("question", question_id));
        }
        let survey_id = stored.survey_id.clone();
        let survey = self.store.survey(&survey_id).await?;
        if survey.status.is_deleted() {
            return Err(SurveyError::conflict(format!("survey '{survey_id}' is deleted")));
        }
        if let Some(kind) = patch.kind
            && kind != stored.kind()
        {
            return Err(SurveyError::conflict("question kind is immutable"));
        }

        let set = self.store.question_set(&survey_id).await?;
        let mut updated = set
            .get(question_id)
            .filter(|question| question.is_active())
            .cloned()
            .ok_or_else(|| SurveyError::not_found("question", question_id))?;

        let mut title_changed = false;
        if let Some(title) = &patch.title {
            let title = clean_title(title)?;
            title_changed = title != updated.title;
            updated.title = title;
        }

        let mut guarded = GuardedChanges::default();
        if let Some(raw) = &patch.config {
            let current = serde_json::to_value(updated.config())
                .map_err(|err| ConfigError::new("config", err.to_string()))?;
            let config = parse_config(updated.kind(), &merge_config(&current, raw)?)?;
            guarded.config = &config != updated.config();
            updated.set_config(config)?;
        }
        if let Some(required) = patch.required {
            guarded.required = required != updated.required;
            updated.required = required;
        }

        let mut writes = Vec::new();
        if let Some(target) = patch.order
            && target != i64::from(updated.order)
        {
            // Moves stay open after publishing; only answered questions are pinned.
            let shifts = plan_move(&slots(&set), self.config.order_base, question_id, target)
                .map_err(order_error)?;
            debug!(target, shifted = shifts.len(), "planned move");
            let (own, others): (Vec<Shift>, Vec<Shift>) = shifts
                .into_iter()
                .partition(|shift| shift.id == question_id);
            if let Some(shift) = own.first() {
                updated.order = shift.to;
            }
            writes = shifted(&set, &others)?;
            guarded.order = true;
        }

        if !title_changed && !guarded.any() {
            return Ok(updated);
        }
        if guarded.any() && self.store.answer_count(question_id).await? > 0 {
            return Err(guarded.refusal());
        }

        writes.push(updated.clone());
        let unanswered = if guarded.any() {
            vec![question_id.to_string()]
        } else {
            Vec::new()
        };
        let committed = self
            .store
            .commit_questions(
                &survey_id,
                CommitRequest {
                    expected_version: set.version,
                    writes,
                    unanswered,
                },
            )
            .await;
        match committed {
            Ok(_) => Ok(updated),
            Err(StoreError::Answered { .. }) => Err(guarded.refusal()),
            Err(err) => Err(err.into()),
        }
    }

    async fn try_delete(&self, question_id: &str) -> Result<(), SurveyError> {
        let stored = self.store.question(question_id).await?;
        self.structurally_editable(&stored.survey_id).await?;
        let set = self.store.question_set(&stored.survey_id).await?;
        let mut deleted = set
            .get(question_id)
            .filter(|question| question.is_active())
            .cloned()
            .ok_or_else(|| SurveyError::not_found("question", question_id))?;
        deleted.status = QuestionStatus::Deleted;
        self.store
            .commit_questions(
                &stored.survey_id,
                CommitRequest {
                    expected_version: set.version,
                    writes: vec![deleted],
                    unanswered: Vec::new(),
                },
            )
            .await?;
        Ok(())
    }

    async fn try_normalize(&self, survey_id: &str) -> Result<Vec<Question>, SurveyError> {
        self.structurally_editable(survey_id).await?;
        let set = self.store.question_set(survey_id).await?;
        let shifts = plan_normalize(&slots(&set), self.config.order_base);
        if shifts.is_empty() {
            return Ok(sorted_active(&set));
        }
        debug!(shifted = shifts.len(), "planned normalize");
        let writes = shifted(&set, &shifts)?;
        self.store
            .commit_questions(
                survey_id,
                CommitRequest {
                    expected_version: set.version,
                    writes,
                    unanswered: Vec::new(),
                },
            )
            .await?;
        let set = self.store.question_set(survey_id).await?;
        Ok(sorted_active(&set))
    }
}

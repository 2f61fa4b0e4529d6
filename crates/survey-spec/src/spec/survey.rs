use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::question::SurveyId;

/// Lifecycle state. Transitions happen outside this crate; the state only
/// gates which operations are legal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStatus {
    #[default]
    #[serde(alias = "DRAFT", alias = "UNPUBLISHED")]
    Draft,
    #[serde(alias = "PUBLISHED")]
    Published,
    #[serde(alias = "CLOSED")]
    Closed,
    #[serde(alias = "DELETED")]
    Deleted,
}

impl SurveyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SurveyStatus::Draft => "draft",
            SurveyStatus::Published => "published",
            SurveyStatus::Closed => "closed",
            SurveyStatus::Deleted => "deleted",
        }
    }

    /// Insert, move, delete and re-number questions.
    pub fn allows_structural_edits(self) -> bool {
        self == SurveyStatus::Draft
    }

    pub fn accepts_responses(self) -> bool {
        self == SurveyStatus::Published
    }

    pub fn is_deleted(self) -> bool {
        self == SurveyStatus::Deleted
    }
}

impl fmt::Display for SurveyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Survey {
    pub id: SurveyId,
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub status: SurveyStatus,
}

impl Survey {
    pub fn new(
        id: impl Into<SurveyId>,
        owner_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            status: SurveyStatus::Draft,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

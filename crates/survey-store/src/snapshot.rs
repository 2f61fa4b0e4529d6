use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use survey_spec::{Question, Response, Survey};

use crate::StoreError;

/// Serializable copy of a store, used to persist [`crate::MemoryStore`]
/// between CLI runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub surveys: Vec<SurveySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveySnapshot {
    pub survey: Survey,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub responses: Vec<Response>,
}

impl Snapshot {
    pub fn from_json_str(raw: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn read(path: &Path) -> Result<Self, StoreError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_pretty(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), StoreError> {
        fs::write(path, self.to_json_pretty()?)?;
        Ok(())
    }
}

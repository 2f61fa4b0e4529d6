use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;
pub const MAX_COMMIT_ATTEMPTS_LIMIT: u32 = 5;

/// Engine settings, usually read from `engine.toml`.
///
/// ```toml
/// order_base = 1
/// max_commit_attempts = 3
/// recent_answer_sample = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// First order index of a survey: 0 or 1.
    pub order_base: u32,
    /// Optimistic commit attempts before a write race is reported as a conflict.
    pub max_commit_attempts: u32,
    pub recent_answer_sample: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            order_base: 0,
            max_commit_attempts: DEFAULT_MAX_COMMIT_ATTEMPTS,
            recent_answer_sample: survey_spec::DEFAULT_RECENT_SAMPLE,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("{field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, EngineConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, EngineConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| EngineConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        if self.order_base > 1 {
            return Err(EngineConfigError::Invalid {
                field: "order_base",
                message: "must be 0 or 1".into(),
            });
        }
        if !(1..=MAX_COMMIT_ATTEMPTS_LIMIT).contains(&self.max_commit_attempts) {
            return Err(EngineConfigError::Invalid {
                field: "max_commit_attempts",
                message: format!("must be between 1 and {MAX_COMMIT_ATTEMPTS_LIMIT}"),
            });
        }
        if self.recent_answer_sample == 0 {
            return Err(EngineConfigError::Invalid {
                field: "recent_answer_sample",
                message: "must be positive".into(),
            });
        }
        Ok(())
    }
}

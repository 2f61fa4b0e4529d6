#![allow(missing_docs)]

//! Question lifecycle and response handling for surveys.
//!
//! [`SurveyEngine`] sits on a [`survey_store::SurveyStore`] and keeps each
//! survey's question orders contiguous under concurrent edits.

pub mod config;
mod engine;
pub mod error;
pub mod order;

pub use config::{EngineConfig, EngineConfigError};
pub use engine::{NewQuestion, QuestionPatch, SurveyEngine};
pub use error::SurveyError;

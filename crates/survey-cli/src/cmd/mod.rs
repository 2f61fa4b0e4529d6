pub mod check_config;
pub mod kinds;
pub mod stats;
pub mod submit;

use std::fs;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use survey_engine::{EngineConfig, SurveyEngine};
use survey_store::{MemoryStore, Snapshot};

pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::from_path(path)?),
        None => Ok(EngineConfig::default()),
    }
}

/// Inline JSON, or `@path` to read it from a file.
pub(crate) fn read_json_arg(raw: &str) -> Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?,
        None => raw.to_string(),
    };
    serde_json::from_str(&text).context("argument is not valid JSON")
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn open_engine(
    store_path: &Path,
    config: EngineConfig,
) -> Result<SurveyEngine<MemoryStore>> {
    let snapshot = Snapshot::read(store_path)
        .with_context(|| format!("failed to load store {}", store_path.display()))?;
    let store = MemoryStore::from_snapshot(snapshot)?;
    Ok(SurveyEngine::new(Arc::new(store), config))
}

pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    Ok(runtime.block_on(future))
}

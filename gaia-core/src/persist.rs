//! Playthrough persistence.
//!
//! A playthrough saves as one JSON document: the bible it was played
//! against plus the whole progression store. On load the bible is
//! re-validated and the store gets a fresh generation, so a dialogue call
//! that was in flight when the save was written can never apply to the
//! restored state.

use crate::progress::ProgressionStore;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storyforge::GameBible;
use thiserror::Error;
use tokio::fs;

/// Errors from reading or writing a saved playthrough.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Serializable snapshot of one playthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPlaythrough {
    pub bible: GameBible,
    pub progress: ProgressionStore,
}

/// Write a playthrough snapshot to `path` as pretty-printed JSON.
pub async fn write(path: impl AsRef<Path>, saved: &SavedPlaythrough) -> Result<(), PersistError> {
    let content = serde_json::to_string_pretty(saved)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Read a playthrough snapshot back from `path`.
pub async fn read(path: impl AsRef<Path>) -> Result<SavedPlaythrough, PersistError> {
    let content = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

//! Snapshot-and-atomic-rename JSON persistence for a node's state.
//!
//! State lives at `$FELUND_STATE_DIR/state.json` if the variable is set,
//! else under the platform data directory. Every save prunes first, so the
//! file on disk never grows past the same bounds enforced on every insert.

use displaydoc::Display;
use felund_store::{NodeConfig, NodeState, SharedState};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Display, Error)]
pub enum PersistError {
    /// failed to read state file {path}: {source}
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// failed to write state file {path}: {source}
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// state file {path} does not match the current schema: {reason}
    SchemaMismatch { path: PathBuf, reason: String },
}

/// Directory the state file lives in, honoring `FELUND_STATE_DIR` if set.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("FELUND_STATE_DIR") {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("felund")
}

fn state_path(dir: &Path) -> PathBuf {
    dir.join("state.json")
}

/// Load state from disk, or build a fresh default if no file exists yet.
pub fn load(dir: &Path) -> Result<SharedState, PersistError> {
    let path = state_path(dir);
    if !path.exists() {
        return Ok(SharedState::new(NodeConfig::new("0.0.0.0", 9999)));
    }

    let raw = std::fs::read_to_string(&path).map_err(|source| PersistError::Read {
        path: path.clone(),
        source,
    })?;
    let state: NodeState = serde_json::from_str(&raw).map_err(|e| PersistError::SchemaMismatch {
        path: path.clone(),
        reason: format!("{e}. Delete or reset {} to start fresh.", path.display()),
    })?;

    let shared = SharedState::from_state(state);
    shared.prune_all_circles();
    Ok(shared)
}

/// Prune and atomically write state to disk, creating the directory if needed.
pub fn save(dir: &Path, state: &SharedState) -> Result<(), PersistError> {
    state.prune_all_circles();
    std::fs::create_dir_all(dir).map_err(|source| PersistError::Write {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = state_path(dir);
    let tmp = path.with_extension("tmp");
    let snapshot = state.snapshot();
    let data = serde_json::to_string_pretty(&snapshot).expect("node state always serializes");

    std::fs::write(&tmp, &data).map_err(|source| PersistError::Write {
        path: tmp.clone(),
        source,
    })?;
    std::fs::rename(&tmp, &path).map_err(|source| PersistError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let state = SharedState::new(NodeConfig::new("127.0.0.1", 9999));
        let circle_id = state.create_circle(&"ab".repeat(32), Some("friends".to_string()));
        state
            .send_message(&circle_id.to_string(), "general", "hi", false)
            .unwrap();

        save(dir.path(), &state).unwrap();
        let reloaded = load(dir.path()).unwrap();

        assert!(reloaded.has_circle(&circle_id.to_string()));
        assert_eq!(reloaded.all_messages(&circle_id.to_string()).len(), 1);
    }

    #[test]
    fn missing_file_yields_a_fresh_default_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = load(dir.path()).unwrap();
        assert!(state.list_circle_ids().is_empty());
    }

    #[test]
    fn corrupt_schema_is_reported_with_the_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("state.json"), "{\"not\":\"a node state\"}").unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, PersistError::SchemaMismatch { .. }));
    }
}

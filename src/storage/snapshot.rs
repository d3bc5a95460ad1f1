//! Snapshot Persistence
//!
//! Reads and writes the reduced session projection under the application
//! directory. Two documents are kept: the session snapshot, and a dedicated
//! API key file written only when the key is syntactically valid so a good
//! key survives a cleared or corrupted snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use promptchain_core::ChatMessage;

use crate::models::session::{validate_api_key, Session, Stage, StageStatus, Theme};
use crate::utils::error::AppResult;
use crate::utils::paths::{ensure_dir, ensure_promptchain_dir};

/// Session snapshot file name (Key A)
pub const STATE_FILE: &str = "chain-state-v1.json";

/// Dedicated API key file name (Key B)
pub const API_KEY_FILE: &str = "openrouter-api-key";

/// Reduced projection of a stage: volatile fields (live status, error) are
/// excluded. A `status` field is still tolerated on read so a legacy or
/// hand-edited document cannot resurrect an in-flight state.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedStage {
    id: String,
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    response: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
    #[serde(default)]
    model: String,
    #[serde(default, skip_serializing)]
    status: StageStatus,
}

/// Reduced projection of the session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSnapshot {
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    template_id: String,
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    session_title: String,
    #[serde(default)]
    stages: Vec<PersistedStage>,
}

impl PersistedSnapshot {
    fn from_session(session: &Session) -> Self {
        Self {
            // The snapshot only ever stores a syntactically valid key
            api_key: if validate_api_key(&session.api_key) {
                session.api_key.clone()
            } else {
                String::new()
            },
            model: session.model.clone(),
            template_id: session.template_id.clone(),
            theme: session.theme,
            session_title: session.session_title.clone(),
            stages: session
                .stages
                .iter()
                .map(|s| PersistedStage {
                    id: s.id.clone(),
                    prompt: s.prompt.clone(),
                    response: s.response.clone(),
                    history: s.history.clone(),
                    model: s.model.clone(),
                    status: StageStatus::Idle,
                })
                .collect(),
        }
    }

    fn into_session(self) -> Session {
        let defaults = Session::default();
        Session {
            api_key: self.api_key,
            model: if self.model.is_empty() {
                defaults.model
            } else {
                self.model
            },
            stages: self
                .stages
                .into_iter()
                .map(|s| Stage {
                    id: s.id,
                    prompt: s.prompt,
                    response: s.response,
                    // No request can still be running across a reload
                    status: match s.status {
                        StageStatus::Running => StageStatus::Idle,
                        other => other,
                    },
                    error: String::new(),
                    history: s.history,
                    model: s.model,
                })
                .collect(),
            is_processing: false,
            template_id: if self.template_id.is_empty() {
                defaults.template_id
            } else {
                self.template_id
            },
            theme: self.theme,
            connectivity: defaults.connectivity,
            session_title: self.session_title,
        }
    }
}

/// Persistence adapter for the session snapshot
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create a store under the default application directory
    pub fn at_default_location() -> AppResult<Self> {
        Ok(Self::new(ensure_promptchain_dir()?))
    }

    fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    fn key_path(&self) -> PathBuf {
        self.dir.join(API_KEY_FILE)
    }

    /// Load the last snapshot. Absent or malformed documents yield a default
    /// session; a valid dedicated key file repopulates the API key either way.
    pub fn load(&self) -> Session {
        let mut session = match self.read_snapshot(&self.state_path()) {
            Ok(Some(session)) => session,
            Ok(None) => Session::default(),
            Err(err) => {
                tracing::warn!("snapshot unreadable, falling back to defaults: {}", err);
                Session::default()
            }
        };

        if let Some(key) = self.read_stored_key() {
            session.api_key = key;
        }

        session.sanitize()
    }

    fn read_snapshot(&self, path: &Path) -> AppResult<Option<Session>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        let snapshot: PersistedSnapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot.into_session()))
    }

    fn read_stored_key(&self) -> Option<String> {
        let raw = fs::read_to_string(self.key_path()).ok()?;
        let key = raw.trim().to_string();
        validate_api_key(&key).then_some(key)
    }

    /// Write the reduced projection, plus the dedicated key file when the
    /// key passes format validation.
    pub fn save(&self, session: &Session) -> AppResult<()> {
        ensure_dir(&self.dir)?;

        let snapshot = PersistedSnapshot::from_session(session);
        let content = serde_json::to_string_pretty(&snapshot)?;
        fs::write(self.state_path(), content)?;

        if validate_api_key(&session.api_key) {
            fs::write(self.key_path(), &session.api_key)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_KEY: &str = "sk-or-v1-abcdefgh12345678";

    fn store() -> (tempfile::TempDir, SnapshotStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let (_dir, store) = store();
        let session = store.load();
        let defaults = Session::default();
        assert_eq!(session.model, defaults.model);
        assert_eq!(session.template_id, defaults.template_id);
        assert_eq!(session.stages.len(), 1);
        assert!(session.api_key.is_empty());
        assert!(!session.is_processing);
    }

    #[test]
    fn test_load_malformed_file_yields_defaults() {
        let (dir, store) = store();
        fs::write(dir.path().join(STATE_FILE), "{{{ not json").unwrap();
        let session = store.load();
        assert_eq!(session.stages.len(), 1);
        assert!(session.api_key.is_empty());
    }

    #[test]
    fn test_round_trip_is_idempotent() {
        let (dir, store) = store();
        let mut session = Session::default();
        session.api_key = VALID_KEY.to_string();
        session.session_title = "Chain".to_string();
        session.stages[0].prompt = "Capital of France?".to_string();
        session.stages[0].response = "Paris".to_string();

        store.save(&session).unwrap();
        let first = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();

        let reloaded = store.load();
        store.save(&reloaded).unwrap();
        let second = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_running_status_coerced_to_idle() {
        let (dir, store) = store();
        let doc = r#"{
            "apiKey": "",
            "model": "deepseek/deepseek-r1-0528",
            "stages": [
                {"id": "s1", "prompt": "p", "response": "", "history": [], "model": "", "status": "running"}
            ]
        }"#;
        fs::write(dir.path().join(STATE_FILE), doc).unwrap();

        let session = store.load();
        assert_eq!(session.stages[0].status, StageStatus::Idle);
    }

    #[test]
    fn test_invalid_key_not_persisted() {
        let (dir, store) = store();
        let mut session = Session::default();
        session.api_key = "sk-or-v1-short".to_string();
        store.save(&session).unwrap();

        let content = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(!content.contains("sk-or-v1-short"));
        assert!(!dir.path().join(API_KEY_FILE).exists());
    }

    #[test]
    fn test_key_file_survives_cleared_snapshot() {
        let (dir, store) = store();
        let mut session = Session::default();
        session.api_key = VALID_KEY.to_string();
        store.save(&session).unwrap();

        // Simulate a corrupted session snapshot
        fs::write(dir.path().join(STATE_FILE), "corrupted").unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.api_key, VALID_KEY);
    }

    #[test]
    fn test_key_file_preferred_over_snapshot_key() {
        let (dir, store) = store();
        let mut session = Session::default();
        session.api_key = VALID_KEY.to_string();
        store.save(&session).unwrap();

        let newer = "sk-or-v1-zyxwvut987654321";
        fs::write(dir.path().join(API_KEY_FILE), newer).unwrap();

        let reloaded = store.load();
        assert_eq!(reloaded.api_key, newer);
    }

    #[test]
    fn test_save_excludes_transient_fields() {
        let (dir, store) = store();
        let mut session = Session::default();
        session.is_processing = true;
        session.stages[0].status = StageStatus::Running;
        session.stages[0].error = "boom".to_string();
        store.save(&session).unwrap();

        let content = fs::read_to_string(dir.path().join(STATE_FILE)).unwrap();
        assert!(!content.contains("isProcessing"));
        assert!(!content.contains("running"));
        assert!(!content.contains("boom"));
        assert!(!content.contains("connectivity"));
    }
}

//! Persistence Integration Tests
//!
//! Snapshot behavior across store generations: what survives a restart,
//! what is coerced, and how corrupted files degrade.

use std::fs;
use std::sync::Arc;

use promptchain::{
    ApplyOutcome, Session, SessionService, SnapshotStore, StateStore, Theme,
};
use promptchain::storage::{API_KEY_FILE, STATE_FILE};

const VALID_KEY: &str = "sk-or-v1-abcdefgh12345678";

fn service_over(dir: &std::path::Path) -> (Arc<StateStore>, SessionService) {
    let store = Arc::new(StateStore::load(SnapshotStore::new(dir)));
    let service = SessionService::new(store.clone());
    (store, service)
}

#[test]
fn test_intent_edits_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (_store, service) = service_over(dir.path());
        service.set_api_key(VALID_KEY);
        service.set_session_title("Trip planning");
        service.toggle_theme();
        assert_eq!(service.apply_template("content", false), ApplyOutcome::Applied);
    }

    let (_store, service) = service_over(dir.path());
    let state = service.state();
    assert_eq!(state.api_key, VALID_KEY);
    assert_eq!(state.session_title, "Trip planning");
    assert_eq!(state.theme, Theme::Light);
    assert_eq!(state.template_id, "content");
    assert_eq!(state.stages.len(), 3);
}

#[test]
fn test_corrupted_snapshot_falls_back_but_keeps_the_key() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (_store, service) = service_over(dir.path());
        service.set_api_key(VALID_KEY);
    }
    fs::write(dir.path().join(STATE_FILE), "{not json").unwrap();

    let (_store, service) = service_over(dir.path());
    let state = service.state();
    let defaults = Session::default();
    assert_eq!(state.api_key, VALID_KEY);
    assert_eq!(state.model, defaults.model);
    assert_eq!(state.template_id, defaults.template_id);
    assert_eq!(state.stages.len(), 1);
    assert!(state.stages[0].prompt.is_empty());
    assert!(dir.path().join(API_KEY_FILE).exists());
}

#[test]
fn test_invalid_key_never_reaches_disk() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (_store, service) = service_over(dir.path());
        service.set_api_key("sk-or-v1-short");
        service.set_session_title("draft");
    }
    assert!(!dir.path().join(API_KEY_FILE).exists());

    let (_store, service) = service_over(dir.path());
    let state = service.state();
    // The title persisted, the syntactically invalid key did not
    assert_eq!(state.session_title, "draft");
    assert!(state.api_key.is_empty());
}

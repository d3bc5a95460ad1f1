//! Session Intents
//!
//! Small synchronous mutations on the session aggregate: settings edits,
//! stage management, template application, reset, and export. Each intent
//! funnels through the store so listeners and persistence observe every
//! change.

use std::sync::Arc;

use crate::models::export::SessionExport;
use crate::models::session::{Connectivity, Session, Stage, StagePatch};
use crate::models::template::template_prompts;
use crate::store::StateStore;
use crate::utils::error::AppResult;

/// Outcome of an intent that can destroy user content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The mutation was committed
    Applied,
    /// Existing content would be lost; caller must confirm and retry
    NeedsConfirmation,
}

/// Intent layer over the session store
pub struct SessionService {
    store: Arc<StateStore>,
}

impl SessionService {
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Current session snapshot
    pub fn state(&self) -> Session {
        self.store.get_state()
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        self.store.set_state(|mut s| {
            s.api_key = api_key;
            s
        });
    }

    pub fn set_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.store.set_state(|mut s| {
            s.model = model;
            s
        });
    }

    /// Record the selected template without touching the stages. Replacing
    /// the chain itself goes through [`apply_template`](Self::apply_template).
    pub fn set_template_id(&self, template_id: impl Into<String>) {
        let template_id = template_id.into();
        self.store.set_state(|mut s| {
            s.template_id = template_id;
            s
        });
    }

    pub fn set_session_title(&self, title: impl Into<String>) {
        let title = title.into();
        self.store.set_state(|mut s| {
            s.session_title = title;
            s
        });
    }

    pub fn toggle_theme(&self) {
        self.store.set_state(|mut s| {
            s.theme = s.theme.toggled();
            s
        });
    }

    pub fn set_connectivity(&self, connectivity: Connectivity) {
        self.store.set_state(|mut s| {
            s.connectivity = connectivity;
            s
        });
    }

    /// Append a blank stage to the end of the chain and return its id
    pub fn add_stage(&self) -> String {
        let stage = Stage::new();
        let id = stage.id.clone();
        self.store.set_state(|mut s| {
            s.stages.push(stage);
            s
        });
        id
    }

    pub fn set_stage_prompt(&self, stage_id: &str, prompt: impl Into<String>) {
        self.store.update_stage(
            stage_id,
            StagePatch {
                prompt: Some(prompt.into()),
                ..Default::default()
            },
        );
    }

    pub fn set_stage_model(&self, stage_id: &str, model: impl Into<String>) {
        self.store.update_stage(
            stage_id,
            StagePatch {
                model: Some(model.into()),
                ..Default::default()
            },
        );
    }

    /// Response text of a stage, if the stage exists
    pub fn stage_response(&self, stage_id: &str) -> Option<String> {
        self.store
            .get_state()
            .stage(stage_id)
            .map(|s| s.response.clone())
    }

    /// Replace the chain with a template's prompt set.
    ///
    /// When the current chain carries content and `confirmed` is false the
    /// call commits nothing and asks the caller to confirm.
    pub fn apply_template(&self, template_id: &str, confirmed: bool) -> ApplyOutcome {
        if !confirmed && self.store.get_state().has_content() {
            return ApplyOutcome::NeedsConfirmation;
        }
        let template_id = template_id.to_string();
        self.store.set_state(move |mut s| {
            s.template_id = template_id.clone();
            s.stages = template_prompts(&template_id)
                .iter()
                .map(|prompt| Stage::with_prompt(*prompt))
                .collect();
            s
        });
        ApplyOutcome::Applied
    }

    /// Start over with a fresh default session. Always requires
    /// confirmation. The API key survives (it lives in its own storage
    /// slot); connectivity is observed, not a setting, so it carries over.
    pub fn reset(&self, confirmed: bool) -> ApplyOutcome {
        if !confirmed {
            return ApplyOutcome::NeedsConfirmation;
        }
        self.store.set_state(|s| {
            let mut fresh = Session::default();
            fresh.api_key = s.api_key;
            fresh.connectivity = s.connectivity;
            fresh
        });
        ApplyOutcome::Applied
    }

    /// Export the current session as a document
    pub fn export(&self) -> SessionExport {
        SessionExport::from_session(&self.store.get_state())
    }

    /// Export the current session as pretty-printed JSON
    pub fn export_json(&self) -> AppResult<String> {
        self.export().to_pretty_json()
    }
}

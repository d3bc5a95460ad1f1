//! Session Models
//!
//! The root session aggregate and its stages. Exactly one `Session` lives in
//! the state store for the application's lifetime; it is recreated from the
//! persisted snapshot or from defaults on load.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use promptchain_core::ChatMessage;

/// Default session model when nothing is configured
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-r1-0528";

/// API key prefix required by the provider
const API_KEY_PREFIX: &str = "sk-or-v1-";

/// Minimum length (exclusive) for a plausible API key
const API_KEY_MIN_LEN: usize = 20;

/// Syntactic API key check: provider prefix plus a plausible length.
/// This is a sanity check, not server-side verification.
pub fn validate_api_key(key: &str) -> bool {
    key.starts_with(API_KEY_PREFIX) && key.len() > API_KEY_MIN_LEN
}

/// Lifecycle status of a stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// At rest, nothing in flight
    #[default]
    Idle,
    /// A request is in flight (never persisted as such)
    Running,
    /// Last send finished successfully
    Complete,
    /// Last send failed
    Error,
}

/// UI theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The other theme
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

/// Observed connectivity status of the host environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

/// A unit of work in the chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Opaque identifier, stable for the stage's lifetime
    pub id: String,
    /// Prompt text
    #[serde(default)]
    pub prompt: String,
    /// Response text from the last completed send
    #[serde(default)]
    pub response: String,
    /// Lifecycle status (transient, never persisted as running)
    #[serde(default)]
    pub status: StageStatus,
    /// Last error message, empty when none
    #[serde(default)]
    pub error: String,
    /// Exact message context sent to the model on the last send
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    /// Per-stage model override; empty inherits the session default
    #[serde(default)]
    pub model: String,
}

impl Stage {
    /// Create a blank idle stage
    pub fn new() -> Self {
        Self::with_prompt("")
    }

    /// Create an idle stage with the given prompt
    pub fn with_prompt(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            response: String::new(),
            status: StageStatus::Idle,
            error: String::new(),
            history: Vec::new(),
            model: String::new(),
        }
    }

    /// Merge a patch into this stage
    pub fn apply_patch(&mut self, patch: StagePatch) {
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(response) = patch.response {
            self.response = response;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(history) = patch.history {
            self.history = history;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

/// Field-wise merge patch for [`Stage`]
#[derive(Debug, Clone, Default)]
pub struct StagePatch {
    pub prompt: Option<String>,
    pub response: Option<String>,
    pub status: Option<StageStatus>,
    pub error: Option<String>,
    pub history: Option<Vec<ChatMessage>>,
    pub model: Option<String>,
}

/// The root session aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Provider API key; may be empty or syntactically invalid
    #[serde(default)]
    pub api_key: String,
    /// Session-wide default model
    #[serde(default = "default_model")]
    pub model: String,
    /// Ordered chain of stages; never empty after sanitation
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// Whether any stage send is currently in flight (derived, not persisted)
    #[serde(default)]
    pub is_processing: bool,
    /// Selected template identifier
    #[serde(default = "default_template")]
    pub template_id: String,
    /// UI theme
    #[serde(default)]
    pub theme: Theme,
    /// Observed connectivity (derived, not persisted)
    #[serde(default)]
    pub connectivity: Connectivity,
    /// User-facing session title
    #[serde(default)]
    pub session_title: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_template() -> String {
    "blank".to_string()
}

impl Session {
    /// Restore cross-field invariants. Type-level coercion happens at the
    /// serde boundary; this enforces what types alone cannot: the stage
    /// sequence is never empty.
    pub fn sanitize(mut self) -> Self {
        if self.stages.is_empty() {
            self.stages.push(Stage::new());
        }
        self
    }

    /// Look up a stage by id
    pub fn stage(&self, stage_id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    /// Position of a stage in the chain
    pub fn stage_index(&self, stage_id: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.id == stage_id)
    }

    /// The immediately preceding stage's response at this moment, if any.
    /// Computed at lookup time; stage data never embeds sibling references.
    pub fn previous_response(&self, stage_id: &str) -> Option<&str> {
        let index = self.stage_index(stage_id)?;
        if index == 0 {
            return None;
        }
        let response = self.stages[index - 1].response.as_str();
        if response.is_empty() {
            None
        } else {
            Some(response)
        }
    }

    /// Whether any stage carries prompt or response content
    pub fn has_content(&self) -> bool {
        self.stages
            .iter()
            .any(|s| !s.prompt.is_empty() || !s.response.is_empty())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            stages: vec![Stage::new()],
            is_processing: false,
            template_id: default_template(),
            theme: Theme::Dark,
            connectivity: Connectivity::Online,
            session_title: String::new(),
        }
    }
}

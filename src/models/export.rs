//! Session Export
//!
//! Serializable projection of a session for download/sharing: prompts,
//! responses, and the exact message history per stage plus metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use promptchain_core::ChatMessage;

use crate::models::session::{Session, Theme};
use crate::utils::error::AppResult;

/// Exported view of one stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedStage {
    pub prompt: String,
    pub response: String,
    pub history: Vec<ChatMessage>,
}

/// Exported session document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionExport {
    /// Export timestamp (ISO 8601)
    pub exported_at: DateTime<Utc>,
    pub model: String,
    pub theme: Theme,
    pub session_title: String,
    pub stages: Vec<ExportedStage>,
}

impl SessionExport {
    /// Build an export document from the current session
    pub fn from_session(session: &Session) -> Self {
        Self {
            exported_at: Utc::now(),
            model: session.model.clone(),
            theme: session.theme,
            session_title: session.session_title.clone(),
            stages: session
                .stages
                .iter()
                .map(|s| ExportedStage {
                    prompt: s.prompt.clone(),
                    response: s.response.clone(),
                    history: s.history.clone(),
                })
                .collect(),
        }
    }

    /// Pretty-printed JSON document
    pub fn to_pretty_json(&self) -> AppResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

//! Unified Stream Event Types
//!
//! Events emitted while a chat-completion request is in flight. The stream
//! client pushes these over an mpsc channel; the orchestrator forwards the
//! accumulated text to the transient streaming buffer and the presentation
//! binding without touching durable state.

use serde::{Deserialize, Serialize};

/// Event emitted during an in-flight streamed completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Incremental text from the model. `accumulated` is the full text so
    /// far; consecutive deltas observe a monotonically-growing accumulator.
    TextDelta { delta: String, accumulated: String },

    /// Stream finished; carries the final trimmed text.
    Complete { text: String },
}

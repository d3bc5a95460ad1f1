//! Stage Orchestrator
//!
//! Coordinates one stage's send lifecycle: precondition checks, message
//! context construction (chaining the previous stage's output), driving the
//! stream client, committing results back into the store, and the registry
//! of cancellable in-flight requests.
//!
//! Per-stage state machine: `idle -> running -> {complete | error | idle}`.
//! A request registry entry and a streaming buffer entry exist only while a
//! stage is `running`; both are removed on every exit path.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use promptchain_core::{ChatMessage, StreamEvent};
use promptchain_llm::{ChatClient, ChatRequest};

use crate::models::session::{validate_api_key, Connectivity, Session, StagePatch, StageStatus};
use crate::services::presentation::PresentationSink;
use crate::store::StateStore;

/// System instruction when no previous output is chained
const SYSTEM_PROMPT: &str = "You are a precise assistant.";

/// Placeholder surfaced while the request is being opened
const CONNECTING_PLACEHOLDER: &str = "Connecting to OpenRouter...";

/// Capacity of the per-request event channel
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Orchestrates stage sends against the stream client
pub struct StageOrchestrator {
    store: Arc<StateStore>,
    client: Arc<dyn ChatClient>,
    sink: Arc<dyn PresentationSink>,
    /// Cancellation handles for in-flight requests, keyed by stage id
    registry: Mutex<HashMap<String, CancellationToken>>,
    /// Latest accumulated partial text per in-flight stage; never persisted
    streaming: Mutex<HashMap<String, String>>,
}

impl StageOrchestrator {
    /// Create an orchestrator
    pub fn new(
        store: Arc<StateStore>,
        client: Arc<dyn ChatClient>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        Self {
            store,
            client,
            sink,
            registry: Mutex::new(HashMap::new()),
            streaming: Mutex::new(HashMap::new()),
        }
    }

    /// Send one stage to the model, streaming partial output as it arrives.
    ///
    /// Precondition violations surface a notice and leave all state
    /// untouched. The stage settles as `complete`, `error`, or back to
    /// `idle` when cancelled.
    pub async fn send(&self, stage_id: &str) {
        let state = self.store.get_state();
        let Some(stage) = state.stage(stage_id).cloned() else {
            self.sink.notice("Stage not found.");
            return;
        };

        if stage.prompt.trim().is_empty() {
            self.sink.notice("Prompt cannot be empty.");
            return;
        }
        if !validate_api_key(&state.api_key) {
            self.sink.notice("Enter a valid OpenRouter API key.");
            self.sink.request_key_focus();
            return;
        }
        if state.connectivity == Connectivity::Offline {
            self.sink
                .notice("You appear to be offline. Try again when connected.");
            return;
        }

        // One request per stage: a second send while the first is in flight
        // is rejected so its registry and buffer entries cannot be orphaned.
        let cancel = CancellationToken::new();
        {
            let mut registry = self.registry.lock();
            if registry.contains_key(stage_id) {
                drop(registry);
                self.sink.notice("Stage is already running.");
                return;
            }
            registry.insert(stage_id.to_string(), cancel.clone());
        }
        // Cleanup must run on every exit path, including this future being
        // dropped mid-flight, or the registry entry would reject every
        // later send on this stage.
        let _cleanup = SendCleanup {
            orchestrator: self,
            stage_id,
        };

        let model = if stage.model.is_empty() {
            state.model.clone()
        } else {
            stage.model.clone()
        };
        let messages = build_messages(&state, stage_id, &stage.prompt);

        self.store.set_state(|mut session| {
            session.is_processing = true;
            if let Some(s) = session.stages.iter_mut().find(|s| s.id == stage_id) {
                s.status = StageStatus::Running;
                s.error.clear();
                s.response.clear();
            }
            session
        });
        self.sink.stage_live_text(stage_id, CONNECTING_PLACEHOLDER);
        tracing::debug!(stage = stage_id, model = %model, "sending stage");

        let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let request = ChatRequest::new(state.api_key.clone(), model, messages.clone());

        let stream = self.client.stream_chat(request, tx, cancel);
        let drain = async {
            while let Some(event) = rx.recv().await {
                if let StreamEvent::TextDelta { accumulated, .. } = event {
                    self.streaming
                        .lock()
                        .insert(stage_id.to_string(), accumulated.clone());
                    self.sink.stage_live_text(stage_id, &accumulated);
                }
            }
        };
        let (result, ()) = tokio::join!(stream, drain);

        match result {
            Ok(final_text) => {
                // Fall back to the streamed buffer if the transport closed
                // before returning a final value.
                let resolved = if final_text.is_empty() {
                    self.streaming
                        .lock()
                        .get(stage_id)
                        .cloned()
                        .unwrap_or_default()
                } else {
                    final_text
                };
                self.store.update_stage(
                    stage_id,
                    StagePatch {
                        response: Some(resolved),
                        status: Some(StageStatus::Complete),
                        history: Some(messages),
                        ..Default::default()
                    },
                );
                self.sink.notice("Stage completed.");
            }
            Err(err) if err.is_cancelled() => {
                tracing::debug!(stage = stage_id, "stage cancelled");
                self.store.update_stage(
                    stage_id,
                    StagePatch {
                        status: Some(StageStatus::Idle),
                        error: Some("Request cancelled.".to_string()),
                        ..Default::default()
                    },
                );
                self.sink.notice("Request cancelled.");
            }
            Err(err) => {
                tracing::debug!(stage = stage_id, error = %err, "stage failed");
                self.store.update_stage(
                    stage_id,
                    StagePatch {
                        status: Some(StageStatus::Error),
                        error: Some(err.to_string()),
                        ..Default::default()
                    },
                );
                self.sink.notice("Something went wrong.");
            }
        }
    }

    /// Cancel the in-flight request for a stage; no-op when none exists
    pub fn stop(&self, stage_id: &str) {
        if let Some(token) = self.registry.lock().get(stage_id) {
            token.cancel();
        }
    }

    /// Latest accumulated partial text for an in-flight stage
    pub fn live_text(&self, stage_id: &str) -> Option<String> {
        self.streaming.lock().get(stage_id).cloned()
    }

    /// Whether a request is currently in flight for this stage
    pub fn is_in_flight(&self, stage_id: &str) -> bool {
        self.registry.lock().contains_key(stage_id)
    }
}

/// Removes a stage's transient request state when its `send` settles or its
/// future is dropped mid-flight.
struct SendCleanup<'a> {
    orchestrator: &'a StageOrchestrator,
    stage_id: &'a str,
}

impl Drop for SendCleanup<'_> {
    fn drop(&mut self) {
        self.orchestrator.registry.lock().remove(self.stage_id);
        self.orchestrator.streaming.lock().remove(self.stage_id);
        self.orchestrator.store.set_state(|mut session| {
            session.is_processing = false;
            session
        });
    }
}

/// Build the outgoing message context: a system message embedding the
/// immediately preceding stage's output when present, then the user prompt.
/// Only the immediately prior stage is chained, never the full transcript.
fn build_messages(session: &Session, stage_id: &str, prompt: &str) -> Vec<ChatMessage> {
    let system = match session.previous_response(stage_id) {
        Some(previous) => format!(
            "{} Use the previous stage output as context.\n{}",
            SYSTEM_PROMPT, previous
        ),
        None => SYSTEM_PROMPT.to_string(),
    };
    vec![ChatMessage::system(system), ChatMessage::user(prompt)]
}

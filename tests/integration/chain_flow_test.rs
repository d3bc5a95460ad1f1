//! Chain Flow Integration Tests
//!
//! Drives a two-stage chain end to end against a scripted stream client:
//! streaming deltas, previous-output chaining, cancellation, and the
//! notices the presentation seam receives along the way.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use promptchain::{
    NullSink, PresentationSink, Session, SessionService, SnapshotStore, StageOrchestrator,
    StageStatus, StateStore,
};
use promptchain_core::StreamEvent;
use promptchain_llm::{ChatClient, ChatRequest, LlmError, LlmResult};

const VALID_KEY: &str = "sk-or-v1-abcdefgh12345678";

/// Scripted stream client: pops one script entry per call
struct ScriptedClient {
    scripts: Mutex<Vec<Script>>,
    requests: Mutex<Vec<ChatRequest>>,
}

enum Script {
    Stream { chunks: Vec<&'static str> },
    HangUntilCancelled,
}

impl ScriptedClient {
    fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn stream_chat(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<String> {
        self.requests.lock().push(request);
        let script = self.scripts.lock().remove(0);
        match script {
            Script::Stream { chunks } => {
                let mut accumulated = String::new();
                for chunk in chunks {
                    accumulated.push_str(chunk);
                    let _ = tx
                        .send(StreamEvent::TextDelta {
                            delta: chunk.to_string(),
                            accumulated: accumulated.clone(),
                        })
                        .await;
                }
                Ok(accumulated.trim().to_string())
            }
            Script::HangUntilCancelled => {
                cancel.cancelled().await;
                Err(LlmError::Cancelled)
            }
        }
    }
}

/// Records every notice in arrival order
struct RecordingSink {
    notices: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
        }
    }
}

impl PresentationSink for RecordingSink {
    fn notice(&self, message: &str) {
        self.notices.lock().push(message.to_string());
    }

    fn stage_live_text(&self, _stage_id: &str, _text: &str) {}
}

fn harness(
    client: Arc<ScriptedClient>,
    sink: Arc<dyn PresentationSink>,
) -> (
    tempfile::TempDir,
    Arc<StateStore>,
    SessionService,
    Arc<StageOrchestrator>,
) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StateStore::new(
        Session::default(),
        SnapshotStore::new(dir.path()),
    ));
    let service = SessionService::new(store.clone());
    service.set_api_key(VALID_KEY);
    let orchestrator = Arc::new(StageOrchestrator::new(store.clone(), client, sink));
    (dir, store, service, orchestrator)
}

#[tokio::test]
async fn test_two_stage_chain_feeds_previous_output() {
    let client = Arc::new(ScriptedClient::new(vec![
        Script::Stream {
            chunks: vec!["Par", "is"],
        },
        Script::Stream {
            chunks: vec!["A city on the Seine."],
        },
    ]));
    let (_dir, store, service, orchestrator) = harness(client.clone(), Arc::new(NullSink));

    let first_id = store.get_state().stages[0].id.clone();
    service.set_stage_prompt(&first_id, "Capital of France?");
    let second_id = service.add_stage();
    service.set_stage_prompt(&second_id, "Describe that city.");

    orchestrator.send(&first_id).await;
    orchestrator.send(&second_id).await;

    let state = store.get_state();
    assert_eq!(state.stages[0].response, "Paris");
    assert_eq!(state.stages[1].response, "A city on the Seine.");
    assert_eq!(state.stages[0].status, StageStatus::Complete);
    assert_eq!(state.stages[1].status, StageStatus::Complete);

    let requests = client.requests.lock();
    assert_eq!(requests.len(), 2);
    // The first stage has no chained context
    assert_eq!(requests[0].messages[0].content, "You are a precise assistant.");
    // The second stage's system message embeds the first stage's output
    assert!(requests[1].messages[0].content.contains("Paris"));
    assert!(requests[1].messages[0]
        .content
        .contains("Use the previous stage output as context."));
    assert_eq!(requests[1].messages[1].content, "Describe that city.");
}

#[tokio::test]
async fn test_completed_chain_survives_a_restart() {
    let client = Arc::new(ScriptedClient::new(vec![Script::Stream {
        chunks: vec!["Paris"],
    }]));
    let dir = tempfile::tempdir().unwrap();
    {
        let store = Arc::new(StateStore::new(
            Session::default(),
            SnapshotStore::new(dir.path()),
        ));
        let service = SessionService::new(store.clone());
        service.set_api_key(VALID_KEY);
        let stage_id = store.get_state().stages[0].id.clone();
        service.set_stage_prompt(&stage_id, "Capital of France?");
        let orchestrator = StageOrchestrator::new(store.clone(), client, Arc::new(NullSink));
        orchestrator.send(&stage_id).await;
    }

    // New store generation over the same directory
    let store = StateStore::load(SnapshotStore::new(dir.path()));
    let state = store.get_state();
    assert_eq!(state.api_key, VALID_KEY);
    assert_eq!(state.stages[0].response, "Paris");
    assert_eq!(state.stages[0].status, StageStatus::Idle);
    assert!(!state.is_processing);
}

#[tokio::test]
async fn test_cancelled_stage_settles_idle_with_notice() {
    let client = Arc::new(ScriptedClient::new(vec![Script::HangUntilCancelled]));
    let sink = Arc::new(RecordingSink::new());
    let (_dir, store, service, orchestrator) = harness(client, sink.clone());

    let stage_id = store.get_state().stages[0].id.clone();
    service.set_stage_prompt(&stage_id, "Capital of France?");

    let task = {
        let orchestrator = orchestrator.clone();
        let stage_id = stage_id.clone();
        tokio::spawn(async move { orchestrator.send(&stage_id).await })
    };
    while !orchestrator.is_in_flight(&stage_id) {
        tokio::task::yield_now().await;
    }
    orchestrator.stop(&stage_id);
    task.await.unwrap();

    let state = store.get_state();
    assert_eq!(state.stages[0].status, StageStatus::Idle);
    assert_eq!(state.stages[0].error, "Request cancelled.");
    assert!(!state.is_processing);
    assert!(sink
        .notices
        .lock()
        .contains(&"Request cancelled.".to_string()));
}

#[tokio::test]
async fn test_precondition_notices_reach_the_sink() {
    let client = Arc::new(ScriptedClient::new(vec![]));
    let sink = Arc::new(RecordingSink::new());
    let (_dir, store, service, orchestrator) = harness(client, sink.clone());

    let stage_id = store.get_state().stages[0].id.clone();

    // Empty prompt
    orchestrator.send(&stage_id).await;
    // Bad key
    service.set_stage_prompt(&stage_id, "Capital of France?");
    service.set_api_key("nope");
    orchestrator.send(&stage_id).await;

    let notices = sink.notices.lock();
    assert_eq!(
        *notices,
        vec![
            "Prompt cannot be empty.".to_string(),
            "Enter a valid OpenRouter API key.".to_string(),
        ]
    );
}

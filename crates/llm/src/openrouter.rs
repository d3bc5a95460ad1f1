//! OpenRouter Client
//!
//! Implementation of the [`ChatClient`] trait against the OpenRouter
//! chat-completions endpoint. One POST per stage with `stream: true`; the
//! body is consumed incrementally through [`SseAccumulator`] and text deltas
//! are forwarded over the caller's channel. Cancellation is cooperative: the
//! token aborts the in-flight request at any suspension point.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::http_client::build_http_client;
use crate::provider::{missing_api_key_error, parse_http_error, ChatClient};
use crate::sse::SseAccumulator;
use crate::types::{ChatRequest, LlmError, LlmResult};
use promptchain_core::StreamEvent;

/// Default OpenRouter chat-completions endpoint
const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Referer-style identifying header value sent with every request
const HTTP_REFERER: &str = "https://promptchain.app";

/// Client title header value sent with every request
const CLIENT_TITLE: &str = "Promptchain";

/// Sampling temperature for all stage completions
const TEMPERATURE: f64 = 0.7;

/// Completion token ceiling for all stage completions
const MAX_TOKENS: u32 = 4096;

/// Streaming chat client for OpenRouter
pub struct OpenRouterClient {
    client: reqwest::Client,
    base_url: String,
}

impl OpenRouterClient {
    /// Create a client against the production endpoint
    pub fn new() -> Self {
        Self::with_base_url(OPENROUTER_API_URL)
    }

    /// Create a client against a custom endpoint (local proxies, tests)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            base_url: base_url.into(),
        }
    }

    /// Build the JSON request body
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "stream": true,
        })
    }

    /// Perform the request and drive the stream to completion.
    async fn stream_inner(
        &self,
        request: &ChatRequest,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> LlmResult<String> {
        if request.api_key.is_empty() {
            return Err(missing_api_key_error());
        }

        let body = self.build_request_body(request);
        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", format!("Bearer {}", request.api_key))
            .header("Content-Type", "application/json")
            .header("HTTP-Referer", HTTP_REFERER)
            .header("X-Title", CLIENT_TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let body_text = response.text().await.unwrap_or_default();
            return Err(parse_http_error(
                status,
                error_message_from_body(status, &body_text),
            ));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        // Some gateways answer a stream request with a plain JSON document.
        // Treat the body as a one-shot completion in that case.
        if !content_type.contains("text/event-stream") {
            let body_text = response.text().await.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            let parsed: CompletionResponse =
                serde_json::from_str(&body_text).map_err(|e| LlmError::ParseError {
                    message: format!("Failed to parse response: {}", e),
                })?;
            let text = parsed.message_content().trim().to_string();
            if !text.is_empty() {
                let _ = tx
                    .send(StreamEvent::TextDelta {
                        delta: text.clone(),
                        accumulated: text.clone(),
                    })
                    .await;
            }
            let _ = tx.send(StreamEvent::Complete { text: text.clone() }).await;
            return Ok(text);
        }

        use futures_util::StreamExt;
        let mut accumulator = SseAccumulator::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LlmError::NetworkError {
                message: e.to_string(),
            })?;
            for event in accumulator.feed(&chunk) {
                let _ = tx.send(event).await;
            }
            if accumulator.is_done() {
                break;
            }
        }

        // Transport end-of-stream without [DONE] still resolves with what
        // was accumulated.
        let text = accumulator.finish();
        let _ = tx.send(StreamEvent::Complete { text: text.clone() }).await;
        Ok(text)
    }
}

impl Default for OpenRouterClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatClient for OpenRouterClient {
    async fn stream_chat(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(model = %request.model, "stream cancelled");
                Err(LlmError::Cancelled)
            }
            result = self.stream_inner(&request, &tx) => result,
        }
    }
}

/// Best-effort extraction of the provider's error message from a non-success
/// body; falls back to a generic status-coded message.
fn error_message_from_body(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: Option<ErrorDetail>,
    }
    #[derive(Deserialize)]
    struct ErrorDetail {
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP error: {}", status))
}

/// Non-streamed completion response shape
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn message_content(&self) -> &str {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
            .unwrap_or_default()
    }
}

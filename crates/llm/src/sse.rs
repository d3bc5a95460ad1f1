//! SSE Stream Accumulator
//!
//! Incremental parser for `text/event-stream` chat-completion bodies. Raw
//! bytes are decoded as UTF-8 with partial multi-byte sequences carried over
//! between reads, buffered until a full `\n\n` event delimiter, and split
//! into `data:` lines. Each JSON payload contributes a text delta; malformed
//! payloads are skipped so one bad chunk never aborts the stream.

use serde::Deserialize;

use promptchain_core::StreamEvent;

/// Sentinel payload that terminates the stream
const DONE_SENTINEL: &str = "[DONE]";

/// One `data:` payload from an OpenRouter-style completion stream.
#[derive(Debug, Deserialize)]
struct SsePayload {
    #[serde(default)]
    choices: Vec<SseChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct SseChoice {
    #[serde(default)]
    delta: Option<SseContent>,
    #[serde(default)]
    message: Option<SseContent>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SseContent {
    #[serde(default)]
    content: Option<String>,
}

impl SseChoice {
    /// Extract the incremental text, in priority order: streaming delta,
    /// full message content, plain text field.
    fn delta_text(&self) -> Option<&str> {
        self.delta
            .as_ref()
            .and_then(|d| d.content.as_deref())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.message
                    .as_ref()
                    .and_then(|m| m.content.as_deref())
                    .filter(|s| !s.is_empty())
            })
            .or_else(|| self.text.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Incremental SSE parser and text accumulator.
///
/// Feed raw body chunks with [`feed`](Self::feed); each call returns the
/// stream events produced by the newly completed SSE events. The accumulated
/// text grows monotonically across deltas.
#[derive(Debug, Default)]
pub struct SseAccumulator {
    /// Undecoded byte tail (partial UTF-8 sequence from the last read)
    pending_bytes: Vec<u8>,
    /// Decoded text not yet framed into a complete event
    buffer: String,
    /// Text accumulated from all deltas so far
    accumulated: String,
    /// Whether the `[DONE]` sentinel has been observed
    done: bool,
}

impl SseAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the stream signalled explicit completion via `[DONE]`
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Accumulated text so far (untrimmed)
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Final result: the accumulated text, trimmed. Valid whether the stream
    /// ended with `[DONE]` or the transport simply closed.
    pub fn finish(self) -> String {
        self.accumulated.trim().to_string()
    }

    /// Feed a raw chunk of the response body, returning any events produced
    /// by SSE events completed within it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.pending_bytes.extend_from_slice(chunk);
        self.decode_pending();

        let mut events = Vec::new();
        while !self.done {
            let Some(end) = self.buffer.find("\n\n") else {
                break;
            };
            let event = self.buffer[..end].to_string();
            self.buffer.drain(..end + 2);
            self.process_event(&event, &mut events);
        }
        events
    }

    /// Decode as much of the pending byte buffer as is valid UTF-8, keeping
    /// an incomplete trailing sequence for the next read.
    fn decode_pending(&mut self) {
        loop {
            match std::str::from_utf8(&self.pending_bytes) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    self.pending_bytes.clear();
                    return;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    self.buffer.push_str(
                        std::str::from_utf8(&self.pending_bytes[..valid_up_to])
                            .expect("validated prefix"),
                    );
                    match err.error_len() {
                        // Incomplete multi-byte sequence at the tail: carry
                        // it over to the next read.
                        None => {
                            self.pending_bytes.drain(..valid_up_to);
                            return;
                        }
                        // Invalid bytes mid-stream: replace and continue.
                        Some(len) => {
                            self.buffer.push('\u{FFFD}');
                            self.pending_bytes.drain(..valid_up_to + len);
                        }
                    }
                }
            }
        }
    }

    /// Process one complete SSE event (the text between `\n\n` delimiters).
    fn process_event(&mut self, event: &str, events: &mut Vec<StreamEvent>) {
        for line in event.lines() {
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data:") else {
                continue;
            };
            let payload = payload.trim();

            if payload == DONE_SENTINEL {
                self.done = true;
                return;
            }

            match serde_json::from_str::<SsePayload>(payload) {
                Ok(parsed) => {
                    let delta = parsed
                        .choices
                        .first()
                        .and_then(|c| c.delta_text())
                        .unwrap_or_default();
                    if !delta.is_empty() {
                        self.accumulated.push_str(delta);
                        events.push(StreamEvent::TextDelta {
                            delta: delta.to_string(),
                            accumulated: self.accumulated.clone(),
                        });
                    }
                }
                Err(err) => {
                    // One bad chunk must not abort the stream.
                    tracing::debug!("skipping malformed SSE payload: {}", err);
                }
            }
        }
    }
}

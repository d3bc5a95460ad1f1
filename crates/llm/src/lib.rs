//! Promptchain LLM
//!
//! Streaming chat-completion client for OpenRouter. One HTTPS POST per stage
//! with `stream: true`; the response body is consumed incrementally as an SSE
//! event stream and incremental text is forwarded over an mpsc channel while
//! the request accumulates its final result.
//!
//! Also includes the SSE accumulator and the HTTP client factory.

pub mod http_client;
pub mod openrouter;
pub mod provider;
pub mod sse;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openrouter::OpenRouterClient;
pub use provider::{missing_api_key_error, parse_http_error, ChatClient};
pub use sse::SseAccumulator;
pub use types::*;

//! Chat Client Trait
//!
//! Defines the interface the orchestrator drives for streamed completions,
//! plus shared HTTP error mapping helpers.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::{ChatRequest, LlmError, LlmResult};
use promptchain_core::StreamEvent;

/// Trait for streamed chat-completion backends.
///
/// One call performs one request. Incremental text is pushed through `tx`
/// zero or more times before the final accumulated text is returned; the
/// cancellation token aborts the underlying network operation and resolves
/// the call with [`LlmError::Cancelled`].
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Stream a completion, emitting [`StreamEvent`]s as text arrives.
    ///
    /// # Returns
    /// The final accumulated text, trimmed.
    async fn stream_chat(
        &self,
        request: ChatRequest,
        tx: mpsc::Sender<StreamEvent>,
        cancel: CancellationToken,
    ) -> LlmResult<String>;
}

/// Helper function to create an error for a missing or invalid API key
pub fn missing_api_key_error() -> LlmError {
    LlmError::AuthenticationFailed {
        message: "API key not configured".to_string(),
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// `message` is the provider's error message if the body carried one, else
/// the generic status-coded fallback built by the caller.
pub fn parse_http_error(status: u16, message: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed { message },
        429 => LlmError::RateLimited { message },
        400 => LlmError::InvalidRequest { message },
        500..=599 => LlmError::ServerError {
            message,
            status: Some(status),
        },
        _ => LlmError::Other { message },
    }
}

//! HTTP Client Factory
//!
//! Provides a factory function for building the shared reqwest client.

use std::time::Duration;

/// Connect timeout for the chat-completion endpoint. Streamed reads have no
/// overall timeout; a stream stays open as long as the provider keeps sending.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a `reqwest::Client` for streamed chat-completion requests.
pub fn build_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build reqwest client")
}

//! Presentation Binding
//!
//! Narrow interface the core emits user-facing signals through. Committed
//! state reaches the renderer via the store's subscribe/notify path; this
//! trait carries the out-of-band signals that bypass it: transient notices
//! and per-stage live streaming text.

/// Sink for out-of-band presentation signals
pub trait PresentationSink: Send + Sync {
    /// One-line transient notice (validation, completion, cancellation)
    fn notice(&self, message: &str);

    /// Live partial output for an in-flight stage. Bypasses the snapshot
    /// path so every token does not trigger persistence.
    fn stage_live_text(&self, stage_id: &str, text: &str);

    /// Hint that the API key field should take focus
    fn request_key_focus(&self) {}
}

/// Sink that discards everything; for headless use and tests
#[derive(Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn notice(&self, _message: &str) {}
    fn stage_live_text(&self, _stage_id: &str, _text: &str) {}
}

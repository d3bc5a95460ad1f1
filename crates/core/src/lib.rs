//! Promptchain Core
//!
//! Foundational types shared across the promptchain workspace. This crate has
//! zero dependencies on application-level code (storage, HTTP, orchestration).
//!
//! ## Module Organization
//!
//! - `message` - Chat message role/content pairs sent to and recorded from providers
//! - `streaming` - Unified stream event types emitted during an in-flight request
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde** - keeps build times minimal
//! 2. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod message;
pub mod streaming;

// ── Message Types ──────────────────────────────────────────────────────
pub use message::{ChatMessage, Role};

// ── Streaming Types ────────────────────────────────────────────────────
pub use streaming::StreamEvent;

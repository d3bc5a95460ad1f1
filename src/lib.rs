//! Promptchain
//!
//! A multi-stage prompt chain runner for OpenRouter. Each stage carries a
//! prompt and streams a response; a stage's system message embeds the
//! previous stage's output so chains build on each other. Session state
//! lives in a reactive store backed by JSON snapshots on disk.
//!
//! Layout mirrors the layering: `models` holds the session aggregate and
//! templates, `storage` the snapshot persistence, `store` the reactive
//! state container, and `services` the orchestrator and intent layer.
//! Wire types and the streaming client live in the `promptchain-core` and
//! `promptchain-llm` member crates.

pub mod models;
pub mod services;
pub mod storage;
pub mod store;
pub mod utils;

pub use models::export::SessionExport;
pub use models::session::{Connectivity, Session, Stage, StagePatch, StageStatus, Theme};
pub use services::{ApplyOutcome, NullSink, PresentationSink, SessionService, StageOrchestrator};
pub use storage::SnapshotStore;
pub use store::{StateStore, Subscription};
pub use utils::error::{AppError, AppResult};

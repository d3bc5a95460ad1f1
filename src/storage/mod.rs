//! Storage Layer
//!
//! Durable persistence for the session snapshot.

pub mod snapshot;

pub use snapshot::{SnapshotStore, API_KEY_FILE, STATE_FILE};

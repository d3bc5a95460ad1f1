//! Integration Tests Module
//!
//! End-to-end tests across the store, persistence, orchestrator, and
//! session intents, using a scripted stream client in place of the network.

// Full chain run: streaming, chaining, cancellation
mod chain_flow_test;

// Snapshot persistence across store generations
mod persistence_test;

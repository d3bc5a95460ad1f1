//! Service layer: orchestration, session intents, and the presentation seam

pub mod orchestrator;
pub mod presentation;
pub mod session;

pub use orchestrator::StageOrchestrator;
pub use presentation::{NullSink, PresentationSink};
pub use session::{ApplyOutcome, SessionService};

//! Data Models
//!
//! Session aggregate, built-in templates, and the export projection.

pub mod export;
pub mod session;
pub mod template;

pub use export::{ExportedStage, SessionExport};
pub use session::{
    validate_api_key, Connectivity, Session, Stage, StagePatch, StageStatus, Theme, DEFAULT_MODEL,
};
pub use template::{template_prompts, BLANK_TEMPLATE, TEMPLATE_IDS};

//! Rhetor Domain Layer
//!
//! Core data model for the fallacy analysis pipeline. This crate has no
//! infrastructure dependencies; it defines the value types every other layer
//! exchanges and the trait seams infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **FallacyKind**: The closed ten-category taxonomy the model is constrained to
//! - **FallacyFinding**: One detected reasoning error in the analyzed text
//! - **AnalysisAttempt**: One end-to-end run of the pipeline with its outcome
//! - **AttemptStore**: Append-only persistence for attempts
//! - **CompletionProvider**: The external completion service, one call at a time

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attempt;
pub mod fallacy;
pub mod traits;

// Re-exports for convenience
pub use attempt::{
    now_millis, AnalysisAttempt, AnalysisRequest, AttemptId, AttemptStatus, FailureReason,
    FailureStage,
};
pub use fallacy::{FallacyFinding, FallacyKind};
pub use traits::{AttemptQuery, AttemptStore, CompletionPrompt, CompletionProvider, FailureClass, StatusFilter};

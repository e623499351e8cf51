//! Result types for the analysis service

use rhetor_domain::{AnalysisAttempt, AttemptId, FallacyFinding};

/// Outcome of a successful analysis
///
/// The attempt is returned even when persisting it failed; in that case
/// `storage_error` carries the store's message.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    /// The attempt as built (and, normally, recorded)
    pub attempt: AnalysisAttempt,

    /// Set when the attempt could not be recorded
    pub storage_error: Option<String>,
}

impl AnalysisReport {
    /// Findings in reply order
    pub fn findings(&self) -> &[FallacyFinding] {
        &self.attempt.findings
    }

    /// Id of the attempt
    pub fn id(&self) -> AttemptId {
        self.attempt.id
    }

    /// True if the attempt reached the store
    pub fn is_recorded(&self) -> bool {
        self.storage_error.is_none()
    }
}

//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and its
//! infrastructure. Implementations live in rhetor-llm and rhetor-store.

use crate::attempt::{AnalysisAttempt, AttemptId};

/// Instructions plus payload for one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionPrompt {
    /// System instructions (role, taxonomy, output format)
    pub system: String,

    /// User message carrying the text under analysis
    pub user: String,
}

/// Classification of a provider failure for retry purposes
pub trait FailureClass {
    /// True if retrying the same call may succeed (timeouts, rate limits, 5xx)
    fn is_transient(&self) -> bool;
}

/// A completion service reached with one blocking call per invocation
///
/// Implementations perform exactly one network call and never retry; retry
/// and backoff belong to the caller.
pub trait CompletionProvider {
    /// Error type for completion calls
    type Error: FailureClass + std::fmt::Display;

    /// Send the prompt and return the model's textual reply
    fn complete(&self, prompt: &CompletionPrompt) -> Result<String, Self::Error>;

    /// Model name reported into attempt records
    fn model_name(&self) -> &str;
}

/// Status filter for attempt listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Successful attempts only
    Success,
    /// Failed attempts only, any stage
    Failed,
}

impl StatusFilter {
    /// Parse from "success" / "failed"
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "success" | "succeeded" => Some(StatusFilter::Success),
            "failed" | "failure" => Some(StatusFilter::Failed),
            _ => None,
        }
    }
}

/// Query criteria for listing attempts
#[derive(Debug, Clone, Default)]
pub struct AttemptQuery {
    /// Filter by terminal status
    pub status: Option<StatusFilter>,

    /// Only attempts requested at or after this time (unix milliseconds)
    pub since: Option<u64>,

    /// Only attempts requested at or before this time (unix milliseconds)
    pub until: Option<u64>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl AttemptQuery {
    /// True if an attempt passes every filter (limit is not considered)
    pub fn matches(&self, attempt: &AnalysisAttempt) -> bool {
        if let Some(status) = self.status {
            let wanted = status == StatusFilter::Success;
            if attempt.is_success() != wanted {
                return false;
            }
        }
        if let Some(since) = self.since {
            if attempt.request.requested_at < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if attempt.request.requested_at > until {
                return false;
            }
        }
        true
    }
}

/// Append-only persistence for analysis attempts
///
/// Implementations must accept concurrent `record` calls from independent
/// analyses and never expose a partially written attempt to readers.
pub trait AttemptStore {
    /// Error type for store operations
    type Error;

    /// Persist an attempt; an id that already exists is rejected
    fn record(&self, attempt: &AnalysisAttempt) -> Result<AttemptId, Self::Error>;

    /// Fetch an attempt by id
    fn get(&self, id: AttemptId) -> Result<Option<AnalysisAttempt>, Self::Error>;

    /// List attempts matching the query, most recent first
    fn list(&self, query: &AttemptQuery) -> Result<Vec<AnalysisAttempt>, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::{AnalysisRequest, FailureReason, FailureStage};
    use std::time::Duration;

    fn attempt_at(requested_at: u64, ok: bool) -> AnalysisAttempt {
        let request = AnalysisRequest {
            text: "text".to_string(),
            requested_at,
        };
        if ok {
            AnalysisAttempt::succeeded(request, vec![], 0, Duration::ZERO, "m", None)
        } else {
            AnalysisAttempt::failed(
                request,
                FailureReason::new(FailureStage::Completion, "down"),
                3,
                Duration::ZERO,
                "m",
                None,
            )
        }
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let query = AttemptQuery::default();
        assert!(query.matches(&attempt_at(10, true)));
        assert!(query.matches(&attempt_at(10, false)));
    }

    #[test]
    fn test_status_filter() {
        let query = AttemptQuery {
            status: Some(StatusFilter::Failed),
            ..Default::default()
        };
        assert!(!query.matches(&attempt_at(10, true)));
        assert!(query.matches(&attempt_at(10, false)));
    }

    #[test]
    fn test_time_range_is_inclusive() {
        let query = AttemptQuery {
            since: Some(100),
            until: Some(200),
            ..Default::default()
        };
        assert!(query.matches(&attempt_at(100, true)));
        assert!(query.matches(&attempt_at(200, true)));
        assert!(!query.matches(&attempt_at(99, true)));
        assert!(!query.matches(&attempt_at(201, true)));
    }

    #[test]
    fn test_status_filter_parse() {
        assert_eq!(StatusFilter::parse("Success"), Some(StatusFilter::Success));
        assert_eq!(StatusFilter::parse("failed"), Some(StatusFilter::Failed));
        assert_eq!(StatusFilter::parse("pending"), None);
    }
}

//! Analysis requests and attempts

use crate::fallacy::FallacyFinding;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in unix milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Unique identifier for an analysis attempt, backed by a UUIDv7
///
/// UUIDv7 ids sort chronologically, so the store can break ties between
/// attempts requested within the same millisecond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttemptId(u128);

impl AttemptId {
    /// Generate a new UUIDv7-based AttemptId
    ///
    /// # Examples
    ///
    /// ```
    /// use rhetor_domain::AttemptId;
    ///
    /// let id = AttemptId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an AttemptId from a raw u128 value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an AttemptId from its hyphenated string form
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s.trim())
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid attempt id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Millisecond timestamp embedded in the UUIDv7
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 80) as u64
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Text submitted for analysis. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    /// The input text, exactly as submitted
    pub text: String,

    /// When the request was built (unix milliseconds)
    pub requested_at: u64,
}

/// Pipeline stage at which an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureStage {
    /// Input rejected before any network call
    InvalidInput,
    /// Completion service failed (after retries, if transient)
    Completion,
    /// Reply could not be interpreted
    Parse,
    /// Caller abandoned the call
    Cancelled,
}

impl FailureStage {
    /// Every stage, in pipeline order
    pub const ALL: [FailureStage; 4] = [
        FailureStage::InvalidInput,
        FailureStage::Completion,
        FailureStage::Parse,
        FailureStage::Cancelled,
    ];

    /// Stable storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::InvalidInput => "invalid_input",
            FailureStage::Completion => "completion",
            FailureStage::Parse => "parse",
            FailureStage::Cancelled => "cancelled",
        }
    }

    /// Parse a stage from its storage name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "invalid_input" => Some(FailureStage::InvalidInput),
            "completion" => Some(FailureStage::Completion),
            "parse" => Some(FailureStage::Parse),
            "cancelled" => Some(FailureStage::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReason {
    /// Stage that failed
    pub stage: FailureStage,

    /// Human-readable detail
    pub detail: String,
}

impl FailureReason {
    /// Create a new failure reason
    pub fn new(stage: FailureStage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.detail)
    }
}

/// Terminal status of an attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Reply parsed (possibly to zero findings)
    Success,
    /// Attempt failed at some stage
    Failed(FailureReason),
}

impl AttemptStatus {
    /// True for `Success`
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptStatus::Success)
    }

    /// The failure reason, if any
    pub fn failure(&self) -> Option<&FailureReason> {
        match self {
            AttemptStatus::Success => None,
            AttemptStatus::Failed(reason) => Some(reason),
        }
    }
}

/// One end-to-end run of the analysis pipeline.
///
/// Built once per analyze call and never mutated after it is recorded.
/// A failed attempt carries no findings.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisAttempt {
    /// Unique identifier
    pub id: AttemptId,

    /// The request that was analyzed
    pub request: AnalysisRequest,

    /// Findings in reply order (always empty when failed)
    pub findings: Vec<FallacyFinding>,

    /// Terminal status
    pub status: AttemptStatus,

    /// Completion retries performed (calls made minus one)
    pub retry_count: u32,

    /// Wall time from request build to terminal state
    pub latency: Duration,

    /// Model the completion client was configured with
    pub model: String,

    /// Raw reply text, when one was obtained
    pub raw_reply: Option<String>,

    /// When the attempt reached its terminal state (unix milliseconds)
    pub completed_at: u64,
}

impl AnalysisAttempt {
    /// Build a successful attempt
    pub fn succeeded(
        request: AnalysisRequest,
        findings: Vec<FallacyFinding>,
        retry_count: u32,
        latency: Duration,
        model: impl Into<String>,
        raw_reply: Option<String>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            request,
            findings,
            status: AttemptStatus::Success,
            retry_count,
            latency,
            model: model.into(),
            raw_reply,
            completed_at: now_millis(),
        }
    }

    /// Build a failed attempt; findings are always empty
    pub fn failed(
        request: AnalysisRequest,
        reason: FailureReason,
        retry_count: u32,
        latency: Duration,
        model: impl Into<String>,
        raw_reply: Option<String>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            request,
            findings: Vec::new(),
            status: AttemptStatus::Failed(reason),
            retry_count,
            latency,
            model: model.into(),
            raw_reply,
            completed_at: now_millis(),
        }
    }

    /// True if the attempt succeeded
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

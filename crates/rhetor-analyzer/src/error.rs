//! Error types for the analysis pipeline
//!
//! Every failure names the stage it came from so consumers can tell
//! "input too long" apart from "service unreachable, retried 3 times".

use rhetor_domain::FailureStage;
use rhetor_llm::CompletionError;
use std::time::Duration;
use thiserror::Error;

/// Input rejected before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidInputError {
    /// Text is empty
    #[error("Text is empty")]
    Empty,

    /// Text exceeds the configured maximum
    #[error("Text too long: {len} chars (max: {max})")]
    TooLong {
        /// Length of the submitted text (chars)
        len: usize,
        /// Configured maximum (chars)
        max: usize,
    },
}

/// Reply could not be interpreted at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unparseable model reply: {reason} (reply starts: {snippet:?})")]
pub struct ParseError {
    /// What went wrong
    pub reason: String,
    /// Leading part of the reply, for diagnosis
    pub snippet: String,
}

/// Errors returned by `AnalysisService::analyze`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Input rejected
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Completion service failed
    #[error(transparent)]
    Completion(CompletionError),

    /// Overall analysis deadline passed
    #[error("Analysis timed out after {after:?} ({retries} retries)")]
    TimedOut {
        /// Configured deadline
        after: Duration,
        /// Retries performed before the deadline
        retries: u32,
    },

    /// Model reply unparseable
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Caller cancelled the analysis
    #[error("Analysis cancelled")]
    Cancelled,
}

impl AnalysisError {
    /// Pipeline stage this error belongs to
    pub fn stage(&self) -> FailureStage {
        match self {
            AnalysisError::InvalidInput(_) => FailureStage::InvalidInput,
            AnalysisError::Completion(_) | AnalysisError::TimedOut { .. } => FailureStage::Completion,
            AnalysisError::Parse(_) => FailureStage::Parse,
            AnalysisError::Cancelled => FailureStage::Cancelled,
        }
    }

    /// Completion retries performed before the failure
    pub fn retries(&self) -> u32 {
        match self {
            AnalysisError::Completion(e) => e.retries(),
            AnalysisError::TimedOut { retries, .. } => *retries,
            _ => 0,
        }
    }
}

/// Invalid analyzer configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error: {0}")]
pub struct ConfigError(pub String);

//! Error types for the CLI application.

use rhetor_analyzer::{AnalysisError, ConfigError};
use rhetor_llm::LlmError;
use rhetor_store::StoreError;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Analyzer configuration rejected
    #[error(transparent)]
    AnalyzerConfig(#[from] ConfigError),

    /// Analysis failed
    #[error("Analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    /// Provider could not be built
    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    /// Attempt store error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

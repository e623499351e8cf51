//! Rhetor Analyzer
//!
//! Runs the fallacy-detection pipeline for a piece of text and records
//! every attempt.
//!
//! # Architecture
//!
//! ```text
//! Text → RequestBuilder → CompletionClient → parse_reply → AttemptStore
//! ```
//!
//! Every call to `AnalysisService::analyze` ends in exactly one recorded
//! attempt: `Success` with the parsed findings (possibly none), or
//! `Failed` naming the stage that failed.
//!
//! # Example Usage
//!
//! ```no_run
//! use rhetor_analyzer::{AnalysisService, AnalyzerConfig};
//! use rhetor_llm::{CompletionClient, MockProvider, RetryPolicy};
//! use rhetor_store::SqliteStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = MockProvider::new(r#"[{"type": "bandwagon", "quote": "Everyone knows"}]"#);
//! let client = CompletionClient::new(provider, RetryPolicy::default());
//! let store = Arc::new(SqliteStore::in_memory()?);
//!
//! let service = AnalysisService::new(client, store, AnalyzerConfig::default())?;
//! let report = service.analyze("Everyone knows this is true.").await?;
//!
//! for finding in report.findings() {
//!     println!("{}: {}", finding.kind.label(), finding.explanation);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod analyzer;
pub mod config;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod stats;
pub mod types;


pub use analyzer::AnalysisService;
pub use config::AnalyzerConfig;
pub use error::{AnalysisError, ConfigError, InvalidInputError, ParseError};
pub use parser::parse_reply;
pub use prompt::{response_prompt, RequestBuilder};
pub use stats::AttemptStats;
pub use types::AnalysisReport;

//! Rhetor Completion Layer
//!
//! Everything between a built prompt and the raw reply text: provider
//! implementations of the domain `CompletionProvider` trait, failure
//! classification, and the retrying `CompletionClient`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted replies and failures for testing
//! - `OpenAiProvider`: OpenAI-compatible chat completions endpoint
//! - `OllamaProvider`: Local Ollama generate endpoint
//!
//! # Examples
//!
//! ```
//! use rhetor_llm::MockProvider;
//! use rhetor_domain::{CompletionPrompt, CompletionProvider};
//!
//! let provider = MockProvider::new("[]");
//! let prompt = CompletionPrompt { system: "sys".into(), user: "text".into() };
//! assert_eq!(provider.complete(&prompt).unwrap(), "[]");
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod ollama;
pub mod openai;
pub mod retry;
pub mod settings;

use rhetor_domain::{CompletionPrompt, CompletionProvider, FailureClass};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use client::{CompletionClient, CompletionError, RawModelReply};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use retry::RetryPolicy;
pub use settings::{ConfiguredProvider, ProviderKind, ProviderSettings};

/// Errors from a single completion call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// Request timed out
    #[error("Request timed out")]
    Timeout,

    /// Service asked us to slow down
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Service-side failure (5xx)
    #[error("Server error (HTTP {status}): {body}")]
    ServerError {
        /// HTTP status code
        status: u16,
        /// Response body, if readable
        body: String,
    },

    /// Credential rejected
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Service rejected the request as malformed
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Reply envelope could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

impl LlmError {
    /// Map a non-success HTTP status to an error
    pub fn from_status(status: u16, body: impl Into<String>, model: &str) -> Self {
        let body = body.into();
        match status {
            401 | 403 => LlmError::Authentication(body),
            404 => LlmError::ModelNotAvailable(model.to_string()),
            408 => LlmError::Timeout,
            429 => LlmError::RateLimited,
            500..=599 => LlmError::ServerError { status, body },
            _ => LlmError::BadRequest(format!("HTTP {}: {}", status, body)),
        }
    }

    /// Map a transport error from reqwest
    pub fn from_transport(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Communication(format!("Request failed: {}", e))
        }
    }
}

impl FailureClass for LlmError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Communication(_)
                | LlmError::Timeout
                | LlmError::RateLimited
                | LlmError::ServerError { .. }
        )
    }
}

/// Drive an async HTTP call from the synchronous provider trait.
///
/// Providers are invoked on the blocking pool, where the ambient runtime
/// handle may be used to block; outside any runtime a private current-thread
/// runtime is built for the call.
pub(crate) fn block_on<F: Future>(fut: F) -> Result<F::Output, LlmError> {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => Ok(handle.block_on(fut)),
        Err(_) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| LlmError::Other(format!("Failed to start runtime: {}", e)))?;
            Ok(runtime.block_on(fut))
        }
    }
}

/// One scripted outcome for `MockProvider`
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Reply with this text
    Text(String),
    /// Fail with this error
    Fail(LlmError),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<MockReply>,
    prompts: Vec<CompletionPrompt>,
}

/// Mock completion provider for deterministic testing
///
/// Scripted outcomes are consumed in order; once the script is exhausted
/// every call returns the fallback.
///
/// # Examples
///
/// ```
/// use rhetor_llm::{LlmError, MockProvider};
/// use rhetor_domain::{CompletionPrompt, CompletionProvider};
///
/// let provider = MockProvider::new("[]").then_fail(LlmError::Timeout).then_reply("ok");
/// let prompt = CompletionPrompt { system: String::new(), user: String::new() };
///
/// assert!(provider.complete(&prompt).is_err());
/// assert_eq!(provider.complete(&prompt).unwrap(), "ok");
/// assert_eq!(provider.complete(&prompt).unwrap(), "[]");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    fallback: MockReply,
    state: Arc<Mutex<MockState>>,
    delay: Duration,
    model: String,
}

impl MockProvider {
    /// Mock that always replies with `response` once its script is empty
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            fallback: MockReply::Text(response.into()),
            state: Arc::new(Mutex::new(MockState::default())),
            delay: Duration::ZERO,
            model: "mock".to_string(),
        }
    }

    /// Mock that always fails with `error` once its script is empty
    pub fn failing(error: LlmError) -> Self {
        Self {
            fallback: MockReply::Fail(error),
            ..Self::new("")
        }
    }

    /// Queue a reply
    pub fn then_reply(self, response: impl Into<String>) -> Self {
        self.lock().script.push_back(MockReply::Text(response.into()));
        self
    }

    /// Queue a failure
    pub fn then_fail(self, error: LlmError) -> Self {
        self.lock().script.push_back(MockReply::Fail(error));
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Report a different model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Every prompt received, in call order
    pub fn prompts(&self) -> Vec<CompletionPrompt> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

impl CompletionProvider for MockProvider {
    type Error = LlmError;

    fn complete(&self, prompt: &CompletionPrompt) -> Result<String, Self::Error> {
        let next = {
            let mut state = self.lock();
            state.prompts.push(prompt.clone());
            state.script.pop_front()
        };

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        match next.unwrap_or_else(|| self.fallback.clone()) {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail(error) => Err(error),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt() -> CompletionPrompt {
        CompletionPrompt {
            system: "system".to_string(),
            user: "user".to_string(),
        }
    }

    #[test]
    fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        assert_eq!(provider.complete(&prompt()).unwrap(), "Test response");
        assert_eq!(provider.model_name(), "mock");
    }

    #[test]
    fn test_mock_provider_script_then_fallback() {
        let provider = MockProvider::new("fallback")
            .then_reply("first")
            .then_fail(LlmError::RateLimited);

        assert_eq!(provider.complete(&prompt()).unwrap(), "first");
        assert_eq!(provider.complete(&prompt()).unwrap_err(), LlmError::RateLimited);
        assert_eq!(provider.complete(&prompt()).unwrap(), "fallback");
        assert_eq!(provider.call_count(), 3);
    }

    #[test]
    fn test_mock_provider_failing() {
        let provider = MockProvider::failing(LlmError::Timeout);
        for _ in 0..3 {
            assert_eq!(provider.complete(&prompt()).unwrap_err(), LlmError::Timeout);
        }
    }

    #[test]
    fn test_mock_provider_records_prompts() {
        let provider = MockProvider::default();
        provider.complete(&prompt()).unwrap();
        assert_eq!(provider.prompts(), vec![prompt()]);
    }

    #[test]
    fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();

        provider1.complete(&prompt()).unwrap();

        assert_eq!(provider1.call_count(), 1);
        assert_eq!(provider2.call_count(), 1);
    }

    #[test]
    fn test_failure_classification() {
        assert!(LlmError::Timeout.is_transient());
        assert!(LlmError::RateLimited.is_transient());
        assert!(LlmError::Communication("reset".into()).is_transient());
        assert!(LlmError::ServerError { status: 503, body: String::new() }.is_transient());

        assert!(!LlmError::Authentication("bad key".into()).is_transient());
        assert!(!LlmError::BadRequest("bad".into()).is_transient());
        assert!(!LlmError::ModelNotAvailable("gpt".into()).is_transient());
        assert!(!LlmError::InvalidResponse("??".into()).is_transient());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(LlmError::from_status(401, "", "m"), LlmError::Authentication(_)));
        assert!(matches!(LlmError::from_status(403, "", "m"), LlmError::Authentication(_)));
        assert_eq!(LlmError::from_status(404, "", "gpt-x"), LlmError::ModelNotAvailable("gpt-x".into()));
        assert_eq!(LlmError::from_status(429, "", "m"), LlmError::RateLimited);
        assert!(matches!(LlmError::from_status(502, "", "m"), LlmError::ServerError { status: 502, .. }));
        assert!(matches!(LlmError::from_status(422, "", "m"), LlmError::BadRequest(_)));
    }

    #[test]
    fn test_block_on_outside_runtime() {
        let value = block_on(async { 7 }).unwrap();
        assert_eq!(value, 7);
    }
}

//! Retrying completion client
//!
//! Wraps a `CompletionProvider` with the retry policy. Transient failures are
//! retried with backoff until the budget is spent; permanent failures stop
//! immediately. Each provider call runs on the blocking pool so the caller's
//! task stays responsive to cancellation.

use crate::retry::RetryPolicy;
use rhetor_domain::{CompletionPrompt, CompletionProvider, FailureClass};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Raw reply from a successful completion
#[derive(Debug, Clone, PartialEq)]
pub struct RawModelReply {
    /// Reply text, unparsed
    pub text: String,

    /// Time spent in the client, including backoff
    pub latency: Duration,

    /// Retries performed before the successful call
    pub retry_count: u32,
}

/// Terminal failure of a completion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    /// Transient failures persisted through every retry
    #[error("Service unreachable after {retries} retries: {reason}")]
    Exhausted {
        /// Last failure seen
        reason: String,
        /// Retries performed
        retries: u32,
    },

    /// Failure that retrying cannot fix
    #[error("Completion failed: {reason}")]
    Permanent {
        /// The failure
        reason: String,
        /// Retries performed before it
        retries: u32,
    },

    /// Caller cancelled the call
    #[error("Completion cancelled")]
    Cancelled {
        /// Retries performed before cancellation
        retries: u32,
    },
}

impl CompletionError {
    /// Retries performed before the failure
    pub fn retries(&self) -> u32 {
        match self {
            CompletionError::Exhausted { retries, .. }
            | CompletionError::Permanent { retries, .. }
            | CompletionError::Cancelled { retries } => *retries,
        }
    }
}

/// Executes completions against a provider with retry and backoff
pub struct CompletionClient<P> {
    provider: Arc<P>,
    policy: RetryPolicy,
}

impl<P> Clone for CompletionClient<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            policy: self.policy.clone(),
        }
    }
}

impl<P> CompletionClient<P>
where
    P: CompletionProvider + Send + Sync + 'static,
{
    /// Create a client around a provider
    pub fn new(provider: P, policy: RetryPolicy) -> Self {
        Self::from_arc(Arc::new(provider), policy)
    }

    /// Create a client around a shared provider
    pub fn from_arc(provider: Arc<P>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// The injected retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Model name of the underlying provider
    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    /// Complete without external cancellation
    pub async fn complete(&self, prompt: &CompletionPrompt) -> Result<RawModelReply, CompletionError> {
        self.complete_with_cancel(prompt, &CancellationToken::new()).await
    }

    /// Complete, giving up as soon as `cancel` fires
    ///
    /// A provider call already in flight when the token fires keeps running
    /// on the blocking pool, but its result is discarded.
    pub async fn complete_with_cancel(
        &self,
        prompt: &CompletionPrompt,
        cancel: &CancellationToken,
    ) -> Result<RawModelReply, CompletionError> {
        let start = Instant::now();
        let mut retries = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(CompletionError::Cancelled { retries });
            }

            let provider = Arc::clone(&self.provider);
            let call_prompt = prompt.clone();
            let call = tokio::task::spawn_blocking(move || {
                provider
                    .complete(&call_prompt)
                    .map_err(|e| (e.is_transient(), e.to_string()))
            });

            let joined = tokio::select! {
                _ = cancel.cancelled() => return Err(CompletionError::Cancelled { retries }),
                joined = call => joined,
            };

            let (transient, reason) = match joined {
                Ok(Ok(text)) => {
                    debug!(retries, reply_len = text.len(), "Completion succeeded");
                    return Ok(RawModelReply {
                        text,
                        latency: start.elapsed(),
                        retry_count: retries,
                    });
                }
                Ok(Err(failure)) => failure,
                Err(e) => (false, format!("Task join error: {}", e)),
            };

            if !transient {
                warn!(retries, %reason, "Completion failed permanently");
                return Err(CompletionError::Permanent { reason, retries });
            }

            if retries >= self.policy.max_retries {
                warn!(retries, %reason, "Completion retries exhausted");
                return Err(CompletionError::Exhausted { reason, retries });
            }

            let delay = self.policy.delay_for(retries);
            warn!(
                "Transient completion failure (attempt {}/{}), retrying in {:?}: {}",
                retries + 1,
                self.policy.max_retries + 1,
                delay,
                reason
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(CompletionError::Cancelled { retries }),
                _ = tokio::time::sleep(delay) => {}
            }
            retries += 1;
        }
    }
}

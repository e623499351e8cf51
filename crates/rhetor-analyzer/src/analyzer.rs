//! Core AnalysisService implementation

use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, ConfigError};
use crate::parser::parse_reply;
use crate::prompt::{response_prompt, RequestBuilder};
use crate::stats::AttemptStats;
use crate::types::AnalysisReport;
use rhetor_domain::{
    now_millis, AnalysisAttempt, AnalysisRequest, AttemptId, AttemptQuery, AttemptStore,
    CompletionProvider, FailureReason,
};
use rhetor_llm::{CompletionClient, CompletionError, RawModelReply};
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Orchestrates one analysis: build, complete, parse, record
///
/// Holds no per-call state, so one service can serve concurrent `analyze`
/// calls; they share only the store.
pub struct AnalysisService<P, S> {
    builder: RequestBuilder,
    client: CompletionClient<P>,
    store: Arc<S>,
    config: AnalyzerConfig,
}

impl<P, S> AnalysisService<P, S>
where
    P: CompletionProvider + Send + Sync + 'static,
    S: AttemptStore,
    S::Error: Display,
{
    /// Create a service; fails if the config is invalid
    pub fn new(
        client: CompletionClient<P>,
        store: Arc<S>,
        config: AnalyzerConfig,
    ) -> Result<Self, ConfigError> {
        config.validate().map_err(ConfigError)?;
        client.policy().validate().map_err(ConfigError)?;

        Ok(Self {
            builder: RequestBuilder::new(config.max_text_length),
            client,
            store,
            config,
        })
    }

    /// The analyzer configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The shared attempt store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Analyze text for fallacies
    pub async fn analyze(&self, text: &str) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_with_cancel(text, &CancellationToken::new()).await
    }

    /// Analyze text, abandoning the attempt when `cancel` fires
    ///
    /// Exactly one attempt is recorded per call, whatever the outcome. A
    /// reply obtained after cancellation is kept as raw text on a
    /// `Cancelled` failure and never parsed into findings.
    pub async fn analyze_with_cancel(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<AnalysisReport, AnalysisError> {
        let start = Instant::now();

        let request = match self.builder.build(text) {
            Ok(request) => request,
            Err(e) => {
                let request = AnalysisRequest {
                    text: text.to_string(),
                    requested_at: now_millis(),
                };
                let err = AnalysisError::from(e);
                return Err(self.fail(request, err, 0, start, None));
            }
        };

        info!(
            text_len = request.text.chars().count(),
            model = self.client.model_name(),
            "Starting analysis"
        );

        let prompt = self.builder.prompt(&request);

        // Deadline covers the completion stage, retries and backoff included
        let deadline = cancel.child_token();
        let timer = {
            let deadline = deadline.clone();
            let after = self.config.analysis_timeout();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                deadline.cancel();
            })
        };
        let completion = self.client.complete_with_cancel(&prompt, &deadline).await;
        timer.abort();

        let reply = match completion {
            Ok(reply) => reply,
            Err(CompletionError::Cancelled { retries }) if !cancel.is_cancelled() => {
                let err = AnalysisError::TimedOut {
                    after: self.config.analysis_timeout(),
                    retries,
                };
                return Err(self.fail(request, err, retries, start, None));
            }
            Err(CompletionError::Cancelled { retries }) => {
                return Err(self.fail(request, AnalysisError::Cancelled, retries, start, None));
            }
            Err(e) => {
                let retries = e.retries();
                return Err(self.fail(request, AnalysisError::Completion(e), retries, start, None));
            }
        };

        self.conclude(request, reply, cancel, start)
    }

    /// Turn a completed reply into the recorded outcome of the attempt
    ///
    /// A reply that arrives after `cancel` fired is kept as raw text on a
    /// `Cancelled` failure and never parsed.
    pub(crate) fn conclude(
        &self,
        request: AnalysisRequest,
        reply: RawModelReply,
        cancel: &CancellationToken,
        start: Instant,
    ) -> Result<AnalysisReport, AnalysisError> {
        debug!(
            retries = reply.retry_count,
            latency_ms = reply.latency.as_millis() as u64,
            "Completion received"
        );

        if cancel.is_cancelled() {
            let err = AnalysisError::Cancelled;
            return Err(self.fail(request, err, reply.retry_count, start, Some(reply.text)));
        }

        match parse_reply(&reply.text) {
            Ok(findings) => {
                let attempt = AnalysisAttempt::succeeded(
                    request,
                    findings,
                    reply.retry_count,
                    start.elapsed(),
                    self.client.model_name(),
                    Some(reply.text),
                );
                let storage_error = self.persist(&attempt);

                info!(
                    id = %attempt.id,
                    findings = attempt.findings.len(),
                    retries = attempt.retry_count,
                    "Analysis complete"
                );

                Ok(AnalysisReport {
                    attempt,
                    storage_error,
                })
            }
            Err(e) => {
                let err = AnalysisError::from(e);
                Err(self.fail(request, err, reply.retry_count, start, Some(reply.text)))
            }
        }
    }

    /// Recorded attempts matching a query, most recent first
    pub fn history(&self, query: &AttemptQuery) -> Result<Vec<AnalysisAttempt>, S::Error> {
        self.store.list(query)
    }

    /// One recorded attempt
    pub fn attempt(&self, id: AttemptId) -> Result<Option<AnalysisAttempt>, S::Error> {
        self.store.get(id)
    }

    /// Aggregate statistics over the attempts matching a query
    pub fn stats(&self, query: &AttemptQuery) -> Result<AttemptStats, S::Error> {
        let attempts = self.store.list(query)?;
        Ok(AttemptStats::from_attempts(&attempts))
    }

    /// Write a friendly reply explaining a report's findings to the author
    ///
    /// One more completion under the same retry policy; nothing is recorded.
    /// `Ok(None)` when the report has no findings or the model returns an
    /// empty reply.
    pub async fn respond(&self, report: &AnalysisReport) -> Result<Option<String>, CompletionError> {
        let Some(prompt) = response_prompt(&report.attempt.request.text, report.findings()) else {
            return Ok(None);
        };

        let reply = self.client.complete(&prompt).await?;
        let text = reply.text.trim();
        if text.is_empty() {
            warn!(id = %report.id(), "Model returned an empty response");
            return Ok(None);
        }

        info!(id = %report.id(), retries = reply.retry_count, "Response written");
        Ok(Some(text.to_string()))
    }

    fn fail(
        &self,
        request: AnalysisRequest,
        err: AnalysisError,
        retries: u32,
        start: Instant,
        raw_reply: Option<String>,
    ) -> AnalysisError {
        let attempt = AnalysisAttempt::failed(
            request,
            FailureReason::new(err.stage(), err.to_string()),
            retries,
            start.elapsed(),
            self.client.model_name(),
            raw_reply,
        );

        warn!(id = %attempt.id, stage = %err.stage(), retries, "Analysis failed: {}", err);
        self.persist(&attempt);
        err
    }

    fn persist(&self, attempt: &AnalysisAttempt) -> Option<String> {
        match self.store.record(attempt) {
            Ok(_) => None,
            Err(e) => {
                error!(id = %attempt.id, "Failed to record attempt: {}", e);
                Some(e.to_string())
            }
        }
    }
}

//! Aggregate statistics over recorded attempts

use rhetor_domain::{AnalysisAttempt, AttemptStatus, FailureStage, FallacyKind};
use std::collections::BTreeMap;
use std::time::Duration;

/// Monitoring view over a set of attempts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttemptStats {
    /// Attempts considered
    pub total: usize,

    /// Attempts that ended in `Success`
    pub succeeded: usize,

    /// Failed attempts per stage
    pub failed_by_stage: BTreeMap<FailureStage, usize>,

    /// Successful attempts with at least one finding
    pub with_findings: usize,

    /// Findings per fallacy kind, across successful attempts
    pub findings_by_kind: BTreeMap<FallacyKind, usize>,

    /// Sum of reported finding confidences
    pub confidence_sum: f64,

    /// Findings that carried a confidence
    pub confidence_count: usize,

    /// Sum of completion retries
    pub total_retries: u64,

    /// Sum of attempt latencies
    pub total_latency: Duration,
}

impl AttemptStats {
    /// Create empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a batch of attempts
    pub fn from_attempts<'a>(attempts: impl IntoIterator<Item = &'a AnalysisAttempt>) -> Self {
        let mut stats = Self::new();
        for attempt in attempts {
            stats.record(attempt);
        }
        stats
    }

    /// Fold one attempt into the totals
    pub fn record(&mut self, attempt: &AnalysisAttempt) {
        self.total += 1;
        self.total_retries += u64::from(attempt.retry_count);
        self.total_latency += attempt.latency;

        match &attempt.status {
            AttemptStatus::Success => {
                self.succeeded += 1;
                if !attempt.findings.is_empty() {
                    self.with_findings += 1;
                }
                for finding in &attempt.findings {
                    *self.findings_by_kind.entry(finding.kind).or_insert(0) += 1;
                    if let Some(confidence) = finding.confidence {
                        self.confidence_sum += confidence;
                        self.confidence_count += 1;
                    }
                }
            }
            AttemptStatus::Failed(reason) => {
                *self.failed_by_stage.entry(reason.stage).or_insert(0) += 1;
            }
        }
    }

    /// Total failed attempts across stages
    pub fn failed(&self) -> usize {
        self.failed_by_stage.values().sum()
    }

    /// Total findings across kinds
    pub fn total_findings(&self) -> usize {
        self.findings_by_kind.values().sum()
    }

    /// Mean latency, zero when there are no attempts
    pub fn average_latency(&self) -> Duration {
        match u32::try_from(self.total) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total_latency / n,
            Err(_) => Duration::from_secs_f64(self.total_latency.as_secs_f64() / self.total as f64),
        }
    }

    /// Mean confidence over findings that reported one
    pub fn average_confidence(&self) -> Option<f64> {
        (self.confidence_count > 0).then(|| self.confidence_sum / self.confidence_count as f64)
    }

    /// Fraction of attempts that succeeded, in [0.0, 1.0]
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total as f64
        }
    }

    /// Human-readable summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Analysis Statistics".to_string(),
            "===================".to_string(),
            format!("Attempts: {}", self.total),
            format!("Succeeded: {} ({:.1}%)", self.succeeded, self.success_rate() * 100.0),
            format!("Failed: {}", self.failed()),
            format!("With findings: {}", self.with_findings),
            format!("Retries: {}", self.total_retries),
            format!("Average latency: {:?}", self.average_latency()),
        ];
        match self.average_confidence() {
            Some(confidence) => lines.push(format!("Average confidence: {:.2}", confidence)),
            None => lines.push("Average confidence: n/a".to_string()),
        }
        lines.push(String::new());

        if !self.failed_by_stage.is_empty() {
            lines.push("Failures by stage:".to_string());
            for (stage, count) in &self.failed_by_stage {
                lines.push(format!("  {}: {}", stage, count));
            }
            lines.push(String::new());
        }

        if !self.findings_by_kind.is_empty() {
            lines.push("Findings by kind:".to_string());
            for (kind, count) in &self.findings_by_kind {
                lines.push(format!("  {}: {}", kind, count));
            }
            lines.push(format!("  Total: {}", self.total_findings()));
        }

        lines.join("\n")
    }
}

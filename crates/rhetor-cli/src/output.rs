//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use rhetor_analyzer::{AnalysisReport, AttemptStats};
use rhetor_domain::{AnalysisAttempt, AttemptStatus, FallacyFinding, FallacyKind};
use serde_json::{json, Value};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Characters of analyzed text shown in history tables.
const TEXT_PREVIEW_CHARS: usize = 40;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the result of an analysis.
    pub fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let mut value = attempt_json(&report.attempt);
                value["storage_error"] = json!(report.storage_error);
                Ok(serde_json::to_string_pretty(&value)?)
            }
            OutputFormat::Table => {
                let mut out = self.findings_table(&report.attempt.findings);
                out.push('\n');
                out.push_str(&self.info(&format!(
                    "Attempt {} ({} retries, {:?})",
                    report.attempt.id, report.attempt.retry_count, report.attempt.latency
                )));
                Ok(out)
            }
            OutputFormat::Quiet => Ok(report
                .attempt
                .findings
                .iter()
                .map(|f| f.kind.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a written response to the analyzed text.
    pub fn format_response(&self, response: &str) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({ "response": response }))?),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.colorize("Suggested response:", "cyan"),
                response
            )),
            OutputFormat::Quiet => Ok(response.to_string()),
        }
    }

    /// Format a list of attempts.
    pub fn format_attempts(&self, attempts: &[AnalysisAttempt]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<Value> = attempts.iter().map(attempt_json).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => Ok(self.attempts_table(attempts)),
            OutputFormat::Quiet => Ok(attempts
                .iter()
                .map(|a| a.id.to_string())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format a single attempt in full.
    pub fn format_attempt(&self, attempt: &AnalysisAttempt) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&attempt_json(attempt))?),
            OutputFormat::Quiet => Ok(attempt.id.to_string()),
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Field", "Value"]);
                builder.push_record(["ID".to_string(), attempt.id.to_string()]);
                builder.push_record(["Status".to_string(), status_text(&attempt.status)]);
                builder.push_record(["Requested at".to_string(), attempt.request.requested_at.to_string()]);
                builder.push_record(["Completed at".to_string(), attempt.completed_at.to_string()]);
                builder.push_record(["Model".to_string(), attempt.model.clone()]);
                builder.push_record(["Retries".to_string(), attempt.retry_count.to_string()]);
                builder.push_record(["Latency".to_string(), format!("{:?}", attempt.latency)]);
                builder.push_record(["Text".to_string(), attempt.request.text.clone()]);

                let mut table = builder.build();
                table.with(Style::rounded());

                let mut out = table.to_string();
                if attempt.is_success() {
                    out.push('\n');
                    out.push_str(&self.findings_table(&attempt.findings));
                }
                Ok(out)
            }
        }
    }

    /// Format aggregate statistics.
    pub fn format_stats(&self, stats: &AttemptStats) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let failed: serde_json::Map<String, Value> = stats
                    .failed_by_stage
                    .iter()
                    .map(|(stage, count)| (stage.as_str().to_string(), json!(count)))
                    .collect();
                let findings: serde_json::Map<String, Value> = stats
                    .findings_by_kind
                    .iter()
                    .map(|(kind, count)| (kind.as_str().to_string(), json!(count)))
                    .collect();

                Ok(serde_json::to_string_pretty(&json!({
                    "total": stats.total,
                    "succeeded": stats.succeeded,
                    "failed": stats.failed(),
                    "failed_by_stage": failed,
                    "with_findings": stats.with_findings,
                    "findings_by_kind": findings,
                    "average_confidence": stats.average_confidence(),
                    "total_retries": stats.total_retries,
                    "average_latency_ms": stats.average_latency().as_millis() as u64,
                    "success_rate": stats.success_rate(),
                }))?)
            }
            OutputFormat::Table => Ok(stats.summary()),
            OutputFormat::Quiet => Ok(stats.total.to_string()),
        }
    }

    /// Format the fallacy taxonomy.
    pub fn format_kinds(&self) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let values: Vec<Value> = FallacyKind::ALL.iter().map(|k| kind_json(*k)).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
            OutputFormat::Table => {
                let mut builder = Builder::default();
                builder.push_record(["Kind", "Name", "Description"]);
                for kind in FallacyKind::ALL {
                    builder.push_record([kind.as_str(), kind.label(), kind.description()]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
            OutputFormat::Quiet => Ok(FallacyKind::ALL
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join("\n")),
        }
    }

    /// Format the description of one kind.
    pub fn format_explanation(&self, kind: FallacyKind) -> Result<String> {
        let description = kind.description();
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&kind_json(kind))?),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.colorize(kind.label(), "cyan"),
                description
            )),
            OutputFormat::Quiet => Ok(description.to_string()),
        }
    }

    fn findings_table(&self, findings: &[FallacyFinding]) -> String {
        if findings.is_empty() {
            return self.success("No fallacies found.");
        }

        let mut builder = Builder::default();
        builder.push_record(["#", "Kind", "Quote", "Explanation", "Confidence"]);

        for (idx, finding) in findings.iter().enumerate() {
            let confidence = finding
                .confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_string());
            builder.push_record([
                (idx + 1).to_string(),
                finding.kind.label().to_string(),
                finding.quoted_span.clone(),
                finding.explanation.clone(),
                confidence,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let header = self.warning(&format!("{} fallacies found", findings.len()));
        format!("{}\n{}", header, table)
    }

    fn attempts_table(&self, attempts: &[AnalysisAttempt]) -> String {
        if attempts.is_empty() {
            return self.colorize("No attempts found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Requested", "Status", "Findings", "Retries", "Latency", "Text"]);

        for attempt in attempts {
            let status = match &attempt.status {
                AttemptStatus::Success => self.colorize("success", "green"),
                AttemptStatus::Failed(reason) => self.colorize(&format!("failed ({})", reason.stage), "red"),
            };
            builder.push_record([
                attempt.id.to_string(),
                attempt.request.requested_at.to_string(),
                status,
                attempt.findings.len().to_string(),
                attempt.retry_count.to_string(),
                format!("{}ms", attempt.latency.as_millis()),
                preview(&attempt.request.text),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn status_text(status: &AttemptStatus) -> String {
    match status {
        AttemptStatus::Success => "success".to_string(),
        AttemptStatus::Failed(reason) => format!("failed ({})", reason),
    }
}

fn preview(text: &str) -> String {
    let single_line = text.replace(['\n', '\r'], " ");
    if single_line.chars().count() <= TEXT_PREVIEW_CHARS {
        single_line
    } else {
        let cut: String = single_line.chars().take(TEXT_PREVIEW_CHARS - 1).collect();
        format!("{}…", cut)
    }
}

fn kind_json(kind: FallacyKind) -> Value {
    json!({
        "kind": kind.as_str(),
        "name": kind.label(),
        "description": kind.description(),
    })
}

fn attempt_json(attempt: &AnalysisAttempt) -> Value {
    let findings: Vec<Value> = attempt
        .findings
        .iter()
        .map(|f| {
            json!({
                "kind": f.kind.as_str(),
                "quoted_span": f.quoted_span,
                "explanation": f.explanation,
                "confidence": f.confidence,
            })
        })
        .collect();

    let failure = attempt.status.failure().map(|reason| {
        json!({
            "stage": reason.stage.as_str(),
            "detail": reason.detail,
        })
    });

    json!({
        "id": attempt.id.to_string(),
        "text": attempt.request.text,
        "requested_at": attempt.request.requested_at,
        "completed_at": attempt.completed_at,
        "status": if attempt.is_success() { "success" } else { "failed" },
        "failure": failure,
        "findings": findings,
        "retry_count": attempt.retry_count,
        "latency_ms": attempt.latency.as_millis() as u64,
        "model": attempt.model,
        "raw_reply": attempt.raw_reply,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhetor_domain::{AnalysisRequest, FailureReason, FailureStage};
    use std::time::Duration;

    fn request(text: &str) -> AnalysisRequest {
        AnalysisRequest {
            text: text.to_string(),
            requested_at: 1_700_000_000_000,
        }
    }

    fn successful_attempt() -> AnalysisAttempt {
        AnalysisAttempt::succeeded(
            request("Everyone knows video games cause violence."),
            vec![
                FallacyFinding::new(FallacyKind::Bandwagon, "Everyone knows", "Appeals to popularity")
                    .with_confidence(0.9),
                FallacyFinding::new(FallacyKind::HastyGeneralization, "cause violence", "No evidence"),
            ],
            1,
            Duration::from_millis(850),
            "gpt-3.5-turbo",
            Some("[...]".to_string()),
        )
    }

    fn failed_attempt() -> AnalysisAttempt {
        AnalysisAttempt::failed(
            request("Some text"),
            FailureReason::new(FailureStage::Completion, "Service unreachable after 3 retries"),
            3,
            Duration::from_secs(7),
            "gpt-3.5-turbo",
            None,
        )
    }

    fn report() -> AnalysisReport {
        AnalysisReport {
            attempt: successful_attempt(),
            storage_error: None,
        }
    }

    #[test]
    fn test_report_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_report(&report()).unwrap();
        assert!(output.contains("2 fallacies found"));
        assert!(output.contains("Bandwagon"));
        assert!(output.contains("0.90"));
        assert!(output.contains("Confidence"));
    }

    #[test]
    fn test_report_without_findings() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut report = report();
        report.attempt.findings.clear();
        let output = formatter.format_report(&report).unwrap();
        assert!(output.contains("✓ No fallacies found."));
    }

    #[test]
    fn test_report_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_report(&report()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["findings"][0]["kind"], "bandwagon");
        assert_eq!(value["findings"][1]["kind"], "hasty_generalization");
        assert_eq!(value["retry_count"], 1);
        assert!(value["storage_error"].is_null());
    }

    #[test]
    fn test_report_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_report(&report()).unwrap();
        assert_eq!(output, "bandwagon\nhasty_generalization");
    }

    #[test]
    fn test_attempts_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter
            .format_attempts(&[successful_attempt(), failed_attempt()])
            .unwrap();
        assert!(output.contains("failed (completion)"));
        assert!(output.contains("success"));
        assert!(output.contains("850ms"));
    }

    #[test]
    fn test_empty_attempts() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_attempts(&[]).unwrap();
        assert!(output.contains("No attempts found"));
    }

    #[test]
    fn test_attempts_quiet_lists_ids() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let attempt = failed_attempt();
        let output = formatter.format_attempts(std::slice::from_ref(&attempt)).unwrap();
        assert_eq!(output, attempt.id.to_string());
    }

    #[test]
    fn test_failed_attempt_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_attempt(&failed_attempt()).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["failure"]["stage"], "completion");
        assert_eq!(value["findings"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_stats_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let stats = AttemptStats::from_attempts(&[successful_attempt(), failed_attempt()]);
        let output = formatter.format_stats(&stats).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["failed_by_stage"]["completion"], 1);
        assert_eq!(value["findings_by_kind"]["bandwagon"], 1);
        assert_eq!(value["with_findings"], 1);
        assert_eq!(value["average_confidence"], 0.9);
    }

    #[test]
    fn test_stats_json_without_confidence() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let stats = AttemptStats::from_attempts(&[failed_attempt()]);
        let output = formatter.format_stats(&stats).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["with_findings"], 0);
        assert!(value["average_confidence"].is_null());
    }

    #[test]
    fn test_response_json() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_response("Consider citing a study.").unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["response"], "Consider citing a study.");
    }

    #[test]
    fn test_explanation_quiet_is_description() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_explanation(FallacyKind::Strawman).unwrap();
        assert_eq!(output, FallacyKind::Strawman.description());
    }

    #[test]
    fn test_kinds_quiet() {
        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let output = formatter.format_kinds().unwrap();
        assert_eq!(output.lines().count(), 10);
        assert!(output.contains("ad_hominem"));
    }

    #[test]
    fn test_preview_truncates() {
        let long = "word ".repeat(20);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), TEXT_PREVIEW_CHARS);
        assert!(shown.ends_with('…'));
        assert_eq!(preview("short\ntext"), "short text");
    }

    #[test]
    fn test_colorize_disabled() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("test"), "✓ test");
        assert_eq!(formatter.error("bad"), "✗ bad");
    }
}

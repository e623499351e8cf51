//! Row encoding and decoding for the attempts table

use crate::StoreError;
use rhetor_domain::{
    AnalysisAttempt, AnalysisRequest, AttemptId, AttemptStatus, FailureReason, FailureStage,
    FallacyFinding, FallacyKind,
};
use serde_json::{json, Value};
use std::time::Duration;

/// Columns as read from SQLite, before validation
pub(crate) struct RawRow {
    id: Vec<u8>,
    text: String,
    requested_at: i64,
    completed_at: i64,
    status: String,
    failure_stage: Option<String>,
    failure_detail: Option<String>,
    findings: String,
    retry_count: i64,
    latency_ns: i64,
    model: String,
    raw_reply: Option<String>,
}

pub(crate) fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        text: row.get(1)?,
        requested_at: row.get(2)?,
        completed_at: row.get(3)?,
        status: row.get(4)?,
        failure_stage: row.get(5)?,
        failure_detail: row.get(6)?,
        findings: row.get(7)?,
        retry_count: row.get(8)?,
        latency_ns: row.get(9)?,
        model: row.get(10)?,
        raw_reply: row.get(11)?,
    })
}

pub(crate) fn decode_row(row: RawRow) -> Result<AnalysisAttempt, StoreError> {
    let status = match row.status.as_str() {
        "success" => AttemptStatus::Success,
        "failed" => {
            let stage_name = row
                .failure_stage
                .ok_or_else(|| StoreError::InvalidData("failed attempt without stage".to_string()))?;
            let stage = FailureStage::parse(&stage_name).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown failure stage: {}", stage_name))
            })?;
            AttemptStatus::Failed(FailureReason::new(stage, row.failure_detail.unwrap_or_default()))
        }
        other => return Err(StoreError::InvalidData(format!("Unknown status: {}", other))),
    };

    Ok(AnalysisAttempt {
        id: bytes_to_id(&row.id)?,
        request: AnalysisRequest {
            text: row.text,
            requested_at: row.requested_at as u64,
        },
        findings: decode_findings(&row.findings)?,
        status,
        retry_count: u32::try_from(row.retry_count)
            .map_err(|_| StoreError::InvalidData(format!("retry_count {}", row.retry_count)))?,
        latency: Duration::from_nanos(row.latency_ns.max(0) as u64),
        model: row.model,
        raw_reply: row.raw_reply,
        completed_at: row.completed_at as u64,
    })
}

/// Convert AttemptId to bytes for storage
pub(crate) fn id_to_bytes(id: AttemptId) -> Vec<u8> {
    id.value().to_be_bytes().to_vec()
}

/// Convert bytes to AttemptId
pub(crate) fn bytes_to_id(bytes: &[u8]) -> Result<AttemptId, StoreError> {
    let arr: [u8; 16] = bytes.try_into().map_err(|_| {
        StoreError::InvalidData(format!("Expected 16 bytes for AttemptId, got {}", bytes.len()))
    })?;
    Ok(AttemptId::from_value(u128::from_be_bytes(arr)))
}

pub(crate) fn latency_to_nanos(latency: Duration) -> i64 {
    i64::try_from(latency.as_nanos()).unwrap_or(i64::MAX)
}

pub(crate) fn encode_findings(findings: &[FallacyFinding]) -> String {
    let values: Vec<Value> = findings
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
    Value::Array(values).to_string()
}

pub(crate) fn decode_findings(raw: &str) -> Result<Vec<FallacyFinding>, StoreError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| StoreError::InvalidData(format!("findings column: {}", e)))?;
    let items = value
        .as_array()
        .ok_or_else(|| StoreError::InvalidData("findings column is not an array".to_string()))?;

    items
        .iter()
        .map(|item| {
            let kind_name = item.get("kind").and_then(Value::as_str).unwrap_or_default();
            let kind = FallacyKind::parse(kind_name).ok_or_else(|| {
                StoreError::InvalidData(format!("Unknown fallacy kind: {}", kind_name))
            })?;
            Ok(FallacyFinding {
                kind,
                quoted_span: item
                    .get("quoted_span")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                explanation: item
                    .get("explanation")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                confidence: item.get("confidence").and_then(Value::as_f64),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_findings_codec_preserves_order_and_fields() {
        let findings = vec![
            FallacyFinding::new(FallacyKind::Bandwagon, "Everyone knows", "popularity")
                .with_confidence(0.95),
            FallacyFinding::new(FallacyKind::Anecdotal, "", "one neighbour"),
        ];
        let decoded = decode_findings(&encode_findings(&findings)).unwrap();
        assert_eq!(decoded, findings);
    }

    #[test]
    fn test_unknown_kind_in_column_is_invalid() {
        let result = decode_findings(r#"[{"kind":"red_herring","quoted_span":"","explanation":""}]"#);
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
    }

    #[test]
    fn test_bytes_to_id_rejects_wrong_length() {
        assert!(bytes_to_id(&[1, 2, 3]).is_err());
        let id = AttemptId::new();
        assert_eq!(bytes_to_id(&id_to_bytes(id)).unwrap(), id);
    }

    #[test]
    fn test_latency_saturates() {
        assert_eq!(latency_to_nanos(Duration::from_millis(3)), 3_000_000);
        assert_eq!(latency_to_nanos(Duration::MAX), i64::MAX);
    }
}

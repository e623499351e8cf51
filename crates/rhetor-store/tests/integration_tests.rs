//! Integration tests for rhetor-store
//!
//! These verify the append-only record/get/list cycle against SQLite.

use rhetor_domain::traits::{AttemptQuery, AttemptStore, StatusFilter};
use rhetor_domain::{
    AnalysisAttempt, AnalysisRequest, AttemptId, FailureReason, FailureStage, FallacyFinding,
    FallacyKind,
};
use rhetor_store::{SqliteStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

fn request(text: &str, requested_at: u64) -> AnalysisRequest {
    AnalysisRequest {
        text: text.to_string(),
        requested_at,
    }
}

fn success_at(requested_at: u64) -> AnalysisAttempt {
    AnalysisAttempt::succeeded(
        request("Everyone knows video games cause violence.", requested_at),
        vec![
            FallacyFinding::new(FallacyKind::Bandwagon, "Everyone knows", "Appeals to popular belief")
                .with_confidence(0.95),
            FallacyFinding::new(FallacyKind::HastyGeneralization, "", "Single incident"),
        ],
        1,
        Duration::from_nanos(1_234_567_891),
        "gpt-test",
        Some("[...]".to_string()),
    )
}

fn failure_at(requested_at: u64, stage: FailureStage) -> AnalysisAttempt {
    AnalysisAttempt::failed(
        request("some text", requested_at),
        FailureReason::new(stage, "something broke"),
        3,
        Duration::from_millis(42),
        "gpt-test",
        None,
    )
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
    assert_eq!(store.unwrap().count().unwrap(), 0);
}

#[test]
fn test_record_and_get_round_trip() {
    let store = SqliteStore::in_memory().unwrap();
    let attempt = success_at(1_000);

    let id = store.record(&attempt).unwrap();
    assert_eq!(id, attempt.id);

    let fetched = store.get(id).unwrap().expect("attempt should exist");
    assert_eq!(fetched, attempt);

    // Reading does not change anything
    assert_eq!(store.get(id).unwrap().unwrap(), attempt);
}

#[test]
fn test_failed_attempt_round_trip() {
    let store = SqliteStore::in_memory().unwrap();
    for stage in FailureStage::ALL {
        let attempt = failure_at(2_000, stage);
        store.record(&attempt).unwrap();
        assert_eq!(store.get(attempt.id).unwrap().unwrap(), attempt);
    }
}

#[test]
fn test_get_missing_returns_none() {
    let store = SqliteStore::in_memory().unwrap();
    assert!(store.get(AttemptId::new()).unwrap().is_none());
}

#[test]
fn test_duplicate_record_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    let attempt = success_at(1_000);

    store.record(&attempt).unwrap();

    let mut altered = attempt.clone();
    altered.request.text = "rewritten".to_string();
    let result = store.record(&altered);
    assert!(matches!(result, Err(StoreError::Duplicate(id)) if id == attempt.id));

    // The original row is untouched
    assert_eq!(store.get(attempt.id).unwrap().unwrap(), attempt);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_list_most_recent_first() {
    let store = SqliteStore::in_memory().unwrap();
    for t in [3_000, 1_000, 2_000] {
        store.record(&success_at(t)).unwrap();
    }

    let listed = store.list(&AttemptQuery::default()).unwrap();
    let times: Vec<u64> = listed.iter().map(|a| a.request.requested_at).collect();
    assert_eq!(times, vec![3_000, 2_000, 1_000]);
}

#[test]
fn test_list_ties_broken_by_id() {
    let store = SqliteStore::in_memory().unwrap();
    let first = success_at(5_000);
    std::thread::sleep(Duration::from_millis(2));
    let second = success_at(5_000);
    store.record(&first).unwrap();
    store.record(&second).unwrap();

    let listed = store.list(&AttemptQuery::default()).unwrap();
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);
}

#[test]
fn test_list_filter_by_status() {
    let store = SqliteStore::in_memory().unwrap();
    store.record(&success_at(1_000)).unwrap();
    store.record(&failure_at(2_000, FailureStage::Parse)).unwrap();
    store.record(&failure_at(3_000, FailureStage::Completion)).unwrap();

    let failed = store
        .list(&AttemptQuery {
            status: Some(StatusFilter::Failed),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(failed.len(), 2);
    assert!(failed.iter().all(|a| !a.is_success() && a.findings.is_empty()));

    let succeeded = store
        .list(&AttemptQuery {
            status: Some(StatusFilter::Success),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(succeeded.len(), 1);
    assert_eq!(succeeded[0].findings.len(), 2);
}

#[test]
fn test_list_filter_by_time_range_and_limit() {
    let store = SqliteStore::in_memory().unwrap();
    for t in (1..=10).map(|i| i * 1_000) {
        store.record(&success_at(t)).unwrap();
    }

    let query = AttemptQuery {
        since: Some(3_000),
        until: Some(7_000),
        ..Default::default()
    };
    let in_range = store.list(&query).unwrap();
    let times: Vec<u64> = in_range.iter().map(|a| a.request.requested_at).collect();
    assert_eq!(times, vec![7_000, 6_000, 5_000, 4_000, 3_000]);

    let limited = store
        .list(&AttemptQuery {
            limit: Some(2),
            ..query
        })
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[0].request.requested_at, 7_000);
}

#[test]
fn test_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("attempts.db");
    let attempt = success_at(1_000);

    {
        let store = SqliteStore::new(&path).unwrap();
        store.record(&attempt).unwrap();
    }

    let reopened = SqliteStore::new(&path).unwrap();
    assert_eq!(reopened.get(attempt.id).unwrap().unwrap(), attempt);
    assert_eq!(reopened.count().unwrap(), 1);
}

#[test]
fn test_concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteStore::new(dir.path().join("attempts.db")).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|thread| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                let mut ids = Vec::new();
                for i in 0..25 {
                    let attempt = success_at(thread * 1_000 + i);
                    ids.push(store.record(&attempt).unwrap());
                }
                ids
            })
        })
        .collect();

    let ids: Vec<AttemptId> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(store.count().unwrap(), 200);
    for id in ids {
        let attempt = store.get(id).unwrap().unwrap();
        assert_eq!(attempt.findings.len(), 2);
    }
}

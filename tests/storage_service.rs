//! Storage Service Tests
//!
//! Tests for the request-level guarantees of a storage node:
//! - Payloads round-trip byte for byte, including empty and non-UTF-8 data
//! - Delete is idempotent
//! - Insert-only writes never overwrite
//! - Pagination totals and next-page numbers
//! - Namespace creation is idempotent and survives a restart
//! - Concurrent writers to one key leave exactly one intact value
//! - Corrupted payloads are reported as internal errors, not as absent
//! - A failing change stream never fails a write

use std::sync::Arc;
use std::time::Duration;

use rawstore::namespace::Pagination;
use rawstore::notifier::{ChangeNotifier, MemoryPublisher};
use rawstore::observability::MetricsRegistry;
use rawstore::service::{ServiceConfig, ServiceError, StorageService};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

fn open_service(dir: &TempDir) -> StorageService {
    StorageService::open(
        &ServiceConfig::new(dir.path()),
        None,
        Arc::new(MetricsRegistry::new()),
    )
    .expect("Failed to open service")
}

fn open_streaming_service(dir: &TempDir, publisher: Arc<MemoryPublisher>) -> StorageService {
    let metrics = Arc::new(MetricsRegistry::new());
    let notifier = ChangeNotifier::new(publisher, "RD").with_metrics(metrics.clone());
    StorageService::open(
        &ServiceConfig::new(dir.path()).with_stream(true),
        Some(notifier),
        metrics,
    )
    .expect("Failed to open service")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

// =============================================================================
// Round Trip
// =============================================================================

#[tokio::test]
async fn test_empty_payload_round_trip() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    svc.upsert("default", "empty", b"").await.unwrap();
    assert_eq!(svc.get("default", "empty").await.unwrap(), Vec::<u8>::new());
}

#[tokio::test]
async fn test_binary_payload_round_trip() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);
    let payload: Vec<u8> = vec![0xff, 0xfe, 0x00, 0x80, 0xc3, 0x28, 0x00, 0x01];

    svc.upsert("default", "bin", &payload).await.unwrap();
    assert_eq!(svc.get("default", "bin").await.unwrap(), payload);
}

// =============================================================================
// Delete & Insert-Only
// =============================================================================

#[tokio::test]
async fn test_delete_is_idempotent() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    svc.upsert("default", "a", b"x").await.unwrap();
    svc.delete("default", "a").await.unwrap();
    svc.delete("default", "a").await.unwrap();
    svc.delete("default", "never-written").await.unwrap();

    let err = svc.get("default", "a").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_insert_conflict_keeps_first_value() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    svc.insert("default", "k", b"first").await.unwrap();
    let err = svc.insert("default", "k", b"second").await.unwrap_err();

    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(svc.get("default", "k").await.unwrap(), b"first");
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn test_pagination_over_five_rows() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    for i in 0..5 {
        svc.upsert("default", &format!("k{}", i), format!("v{}", i).as_bytes())
            .await
            .unwrap();
    }

    let mut counts = Vec::new();
    let mut nexts = Vec::new();
    let mut keys = Vec::new();
    for page in 1..=3 {
        let result = svc
            .list("default", Pagination::new(page, 2).unwrap())
            .await
            .unwrap();
        assert_eq!(result.total, 5);
        counts.push(result.rows.len());
        nexts.push(result.next);
        keys.extend(result.rows.iter().map(|r| r.key.clone()));
    }

    assert_eq!(counts, vec![2, 2, 1]);
    assert_eq!(nexts, vec![2, 3, -1]);
    assert_eq!(keys, vec!["k0", "k1", "k2", "k3", "k4"]);
}

#[tokio::test]
async fn test_list_returns_decompressed_payloads() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    svc.upsert("default", "a", b"alpha").await.unwrap();
    let page = svc.list("default", Pagination::default()).await.unwrap();
    assert_eq!(page.rows[0].data, b"alpha");
}

#[tokio::test]
async fn test_key_listing_is_newest_first() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    for key in ["a", "b", "c"] {
        svc.upsert("default", key, b"x").await.unwrap();
    }
    let page = svc.list_keys("default", Pagination::default()).await.unwrap();
    let keys: Vec<&str> = page.rows.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["c", "b", "a"]);
    assert_eq!(page.next, -1);
}

// =============================================================================
// Namespaces
// =============================================================================

#[tokio::test]
async fn test_namespace_creation_is_idempotent() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    let (created, names) = svc.create_namespace("logs", None).await.unwrap();
    assert!(created);
    assert_eq!(names, vec!["default", "logs"]);

    let (created, names) = svc.create_namespace("logs", None).await.unwrap();
    assert!(!created);
    assert_eq!(names, vec!["default", "logs"]);
}

#[tokio::test]
async fn test_namespaces_and_data_survive_restart() {
    let dir = create_temp_dir();
    {
        let svc = open_service(&dir);
        svc.create_namespace("logs", None).await.unwrap();
        svc.upsert("logs", "a", b"persisted").await.unwrap();
        svc.backup("logs").await.unwrap();
    }

    let svc = open_service(&dir);
    assert_eq!(svc.namespaces(), vec!["default", "logs"]);
    assert_eq!(svc.get("logs", "a").await.unwrap(), b"persisted");
}

#[tokio::test]
async fn test_invalid_namespace_name() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    for name in ["", "a.b", "../etc", "status"] {
        let err = svc.create_namespace(name, None).await.unwrap_err();
        assert_eq!(err.status_code(), 400, "name {:?}", name);
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_leave_one_intact_value() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    let payloads: Vec<Vec<u8>> = (0..16u8).map(|i| vec![i; 1024 + i as usize]).collect();
    let mut handles = Vec::new();
    for payload in payloads.clone() {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            svc.upsert("default", "shared", &payload).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = svc.get("default", "shared").await.unwrap();
    assert!(payloads.contains(&stored), "stored value is not one of the written payloads");
}

// =============================================================================
// Corruption
// =============================================================================

#[tokio::test]
async fn test_corrupted_payload_is_internal_error() {
    let dir = create_temp_dir();
    let svc = open_service(&dir);

    // Bypass compression so the stored bytes are not a valid frame.
    svc.store().upsert("default", "broken", b"not a zstd frame").unwrap();

    let err = svc.get("default", "broken").await.unwrap_err();
    assert_eq!(err, ServiceError::Internal("stored payload is corrupted".into()));
    assert!(!err.is_not_found());
    assert_eq!(svc.metrics().snapshot().corrupted_reads, 1);

    let err = svc.list("default", Pagination::default()).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
}

// =============================================================================
// Change Stream
// =============================================================================

#[tokio::test]
async fn test_writes_emit_change_events() {
    let dir = create_temp_dir();
    let publisher = Arc::new(MemoryPublisher::new(1000));
    let svc = open_streaming_service(&dir, publisher.clone());

    svc.upsert("default", "a", b"1").await.unwrap();
    svc.insert("default", "b", b"2").await.unwrap();
    svc.delete("default", "a").await.unwrap();

    wait_until(|| publisher.entries("RD.default").len() == 2).await;
    let entries = publisher.entries("RD.default");
    assert_eq!(entries.len(), 2);

    let mut kinds: Vec<(String, String)> = entries
        .iter()
        .map(|e| (e.fields["key"].clone(), e.fields["kind"].clone()))
        .collect();
    kinds.sort();
    assert_eq!(
        kinds,
        vec![
            ("a".to_string(), "upsert".to_string()),
            ("b".to_string(), "insert".to_string())
        ]
    );
}

#[tokio::test]
async fn test_failed_publish_does_not_fail_write() {
    let dir = create_temp_dir();
    let publisher = Arc::new(MemoryPublisher::new(1000));
    publisher.set_failing(true);
    let svc = open_streaming_service(&dir, publisher.clone());

    svc.upsert("default", "a", b"kept").await.unwrap();
    assert_eq!(svc.get("default", "a").await.unwrap(), b"kept");

    wait_until(|| svc.metrics().snapshot().events_failed == 1).await;
    assert_eq!(svc.metrics().snapshot().events_failed, 1);
    assert!(publisher.entries("RD.default").is_empty());
}

#[tokio::test]
async fn test_conflicting_insert_emits_nothing() {
    let dir = create_temp_dir();
    let publisher = Arc::new(MemoryPublisher::new(1000));
    let svc = open_streaming_service(&dir, publisher.clone());

    svc.insert("default", "a", b"1").await.unwrap();
    assert!(svc.insert("default", "a", b"2").await.is_err());

    wait_until(|| !publisher.entries("RD.default").is_empty()).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(publisher.entries("RD.default").len(), 1);
}

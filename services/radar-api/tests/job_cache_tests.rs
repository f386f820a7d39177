//! Tests for the job cache core: deduplication, status transitions,
//! result retrieval, and expiry.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{Duration, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use radar_api::jobs::{ImageInfo, JobCache, JobResult, JobStatus, ResultLookup};
use radar_common::{GeoBounds, RadarError};
use radar_render::FeatureCollection;

fn test_cache(capacity: usize) -> (Arc<JobCache>, mpsc::Receiver<Uuid>) {
    JobCache::new(Duration::hours(24), capacity)
}

fn fake_result() -> JobResult {
    JobResult {
        geojson: FeatureCollection::new(),
        image_info: ImageInfo {
            image_path: "processed_data/test/overlay.png".to_string(),
            coordinates: [[-87.0, 41.0], [-85.0, 41.0], [-85.0, 39.0], [-87.0, 39.0]],
            bounds: GeoBounds {
                north: 41.0,
                south: 39.0,
                east: -85.0,
                west: -87.0,
            },
            width: 300,
            height: 300,
        },
        image: Bytes::from_static(b"\x89PNG"),
        completed_at: Utc::now(),
    }
}

// ============================================================================
// Deduplication
// ============================================================================

#[tokio::test]
async fn test_quick_resubmit_returns_same_job() {
    let (cache, _rx) = test_cache(8);

    let first = cache.submit("https://example.com/A").await.unwrap();
    let second = cache.submit("https://example.com/A").await.unwrap();

    assert!(!first.deduped);
    assert!(second.deduped);
    assert_eq!(first.job_id, second.job_id);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_dedup_reuses_processing_and_completed() {
    let (cache, _rx) = test_cache(8);

    let outcome = cache.submit("https://example.com/A").await.unwrap();
    cache.begin(outcome.job_id).await.unwrap();

    let during = cache.submit("https://example.com/A").await.unwrap();
    assert!(during.deduped);
    assert_eq!(during.job_id, outcome.job_id);
    assert_eq!(during.status, JobStatus::Processing);

    cache.complete(outcome.job_id, fake_result()).await;

    let after = cache.submit("https://example.com/A").await.unwrap();
    assert!(after.deduped);
    assert_eq!(after.job_id, outcome.job_id);
    assert_eq!(after.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_failed_job_does_not_block_resubmission() {
    let (cache, _rx) = test_cache(8);

    let first = cache.submit("https://example.com/B").await.unwrap();
    cache.begin(first.job_id).await.unwrap();
    cache
        .fail(first.job_id, "decode: Malformed radar file: truncated".to_string())
        .await;

    let snapshot = cache.status(first.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Failed);
    assert!(snapshot.error.as_deref().unwrap().starts_with("decode:"));
    assert!(snapshot.result.is_none());

    let second = cache.submit("https://example.com/B").await.unwrap();
    assert!(!second.deduped);
    assert_ne!(second.job_id, first.job_id);
}

#[tokio::test]
async fn test_distinct_sources_get_distinct_jobs() {
    let (cache, _rx) = test_cache(8);

    let a = cache.submit("https://example.com/A").await.unwrap();
    let b = cache.submit("https://example.com/B").await.unwrap();

    assert_ne!(a.job_id, b.job_id);
    assert_eq!(cache.len().await, 2);
}

// ============================================================================
// Status and result retrieval
// ============================================================================

#[tokio::test]
async fn test_result_not_ready_until_completed() {
    let (cache, _rx) = test_cache(8);
    let outcome = cache.submit("https://example.com/A").await.unwrap();

    assert!(matches!(
        cache.result(outcome.job_id).await,
        ResultLookup::NotReady
    ));

    cache.begin(outcome.job_id).await.unwrap();
    assert!(matches!(
        cache.result(outcome.job_id).await,
        ResultLookup::NotReady
    ));

    cache.complete(outcome.job_id, fake_result()).await;

    // once Completed is observable the result is visible on every read
    for _ in 0..3 {
        match cache.result(outcome.job_id).await {
            ResultLookup::Completed { source_url, result } => {
                assert_eq!(source_url, "https://example.com/A");
                assert_eq!(result.image_info.width, 300);
            }
            other => panic!("expected completed result, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_status_observes_forward_transitions_only() {
    let (cache, _rx) = test_cache(8);
    let outcome = cache.submit("https://example.com/A").await.unwrap();

    assert_eq!(
        cache.status(outcome.job_id).await.unwrap().status,
        JobStatus::Pending
    );

    cache.begin(outcome.job_id).await.unwrap();
    assert_eq!(
        cache.status(outcome.job_id).await.unwrap().status,
        JobStatus::Processing
    );

    cache.complete(outcome.job_id, fake_result()).await;
    assert_eq!(
        cache.status(outcome.job_id).await.unwrap().status,
        JobStatus::Completed
    );

    // terminal states are sticky: a late failure write is ignored
    cache.fail(outcome.job_id, "fetch: late error".to_string()).await;
    let snapshot = cache.status(outcome.job_id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Completed);
    assert!(snapshot.error.is_none());
    assert!(snapshot.result.is_some());
}

#[tokio::test]
async fn test_unknown_job_is_not_found() {
    let (cache, _rx) = test_cache(8);
    let ghost = Uuid::new_v4();

    assert!(cache.status(ghost).await.is_none());
    assert!(matches!(cache.result(ghost).await, ResultLookup::NotFound));
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test]
async fn test_reaper_removes_expired_terminal_jobs() {
    let (cache, _rx) = test_cache(8);

    let outcome = cache.submit("https://example.com/A").await.unwrap();
    cache.begin(outcome.job_id).await.unwrap();
    cache.complete(outcome.job_id, fake_result()).await;

    // within the window: nothing to do
    let (removed, stats) = cache.reap_expired(Utc::now()).await;
    assert!(removed.is_empty());
    assert_eq!(stats.removed, 0);

    // past the window: removed, then gone for both lookups
    let later = Utc::now() + Duration::hours(25);
    let (removed, stats) = cache.reap_expired(later).await;
    assert_eq!(removed, vec![outcome.job_id]);
    assert_eq!(stats.removed, 1);

    assert!(cache.status(outcome.job_id).await.is_none());
    assert!(matches!(
        cache.result(outcome.job_id).await,
        ResultLookup::NotFound
    ));
}

#[tokio::test]
async fn test_reaper_keeps_in_flight_jobs() {
    let (cache, _rx) = test_cache(8);

    let pending = cache.submit("https://example.com/A").await.unwrap();
    let processing = cache.submit("https://example.com/B").await.unwrap();
    cache.begin(processing.job_id).await.unwrap();

    let later = Utc::now() + Duration::hours(25);
    let (removed, stats) = cache.reap_expired(later).await;

    assert!(removed.is_empty());
    assert_eq!(stats.kept_in_flight, 2);
    assert!(cache.status(pending.job_id).await.is_some());
    assert!(cache.status(processing.job_id).await.is_some());
}

#[tokio::test]
async fn test_late_write_after_reap_is_safe_noop() {
    let (cache, _rx) = test_cache(8);

    let outcome = cache.submit("https://example.com/A").await.unwrap();
    cache.begin(outcome.job_id).await.unwrap();
    cache.fail(outcome.job_id, "decode: boom".to_string()).await;

    let later = Utc::now() + Duration::hours(25);
    let (removed, _) = cache.reap_expired(later).await;
    assert_eq!(removed, vec![outcome.job_id]);

    // a straggling background write must not crash or resurrect the job
    cache.complete(outcome.job_id, fake_result()).await;
    cache.fail(outcome.job_id, "render: too late".to_string()).await;

    assert!(cache.status(outcome.job_id).await.is_none());
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_expired_entry_does_not_dedup() {
    // zero-width retention: everything is expired as soon as any time passes
    let (cache, mut rx) = JobCache::new(Duration::zero(), 8);

    let first = cache.submit("https://example.com/A").await.unwrap();
    // drain the queue slot so the second submit has room
    assert_eq!(rx.recv().await, Some(first.job_id));
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;

    let second = cache.submit("https://example.com/A").await.unwrap();
    assert!(!second.deduped);
    assert_ne!(second.job_id, first.job_id);
}

// ============================================================================
// Backpressure
// ============================================================================

#[tokio::test]
async fn test_full_queue_rejects_submission() {
    let (cache, _rx) = test_cache(1);

    cache.submit("https://example.com/A").await.unwrap();
    let err = cache.submit("https://example.com/B").await.unwrap_err();

    assert!(matches!(err, RadarError::QueueFull));
    assert_eq!(err.http_status_code(), 503);
    // the rejected job left nothing behind
    assert_eq!(cache.len().await, 1);

    // and the same source can be submitted again once there is room
    let dedup = cache.submit("https://example.com/A").await.unwrap();
    assert!(dedup.deduped);
}

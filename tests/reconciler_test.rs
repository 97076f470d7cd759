//! Poll reconciler integration tests against a mock pipeline service.
//!
//! Exercises the list and detail watchers end to end: wholesale snapshot
//! replacement, failure tolerance, terminal-status stop, per-stage fetch
//! isolation, and deterministic cancellation on drop.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{job_json, TestHarness};
use vidtrack::model::{JobStatus, StageDetails, StageKind};
use vidtrack::poll::{JobDetailWatcher, JobListWatcher, StageSlot};

// ---------------------------------------------------------------------------
// Job list watcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_watcher_publishes_snapshot_then_keeps_it_through_failures() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([job_json(
            "vid-1",
            "processing",
            &["language_detection"],
            &[],
            Some("compression"),
        )])))
        .up_to_n_times(1)
        .mount(&harness.server)
        .await;
    // Every later poll fails at the transport level.
    Mock::given(method("GET"))
        .and(path("/api/v1/videos/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&harness.server)
        .await;

    let watcher = JobListWatcher::start(harness.api(), Duration::from_millis(50));
    let mut rx = watcher.subscribe();

    tokio::time::timeout(Duration::from_secs(2), async {
        while rx.borrow().jobs.is_empty() {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("list view never populated");

    let view = watcher.view();
    assert_eq!(view.jobs.len(), 1);
    assert_eq!(view.jobs[0].video_id, "vid-1");
    assert_eq!(view.jobs[0].status, JobStatus::Processing);
    assert_eq!(view.processing().count(), 1);
    assert_eq!(view.completed().count(), 0);

    // A failed poll records a retryable error but never discards the last
    // known-good snapshot.
    tokio::time::timeout(Duration::from_secs(2), async {
        while rx.borrow().last_error.is_none() {
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("poll failure never surfaced");

    let view = watcher.view();
    assert_eq!(view.jobs.len(), 1, "known-good view was discarded");
    assert!(view.last_error.is_some());
}

#[tokio::test]
async fn dropping_the_list_watcher_cancels_polling() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/videos/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&harness.server)
        .await;

    let watcher = JobListWatcher::start(harness.api(), Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(150)).await;
    drop(watcher);

    // Give any in-flight fetch time to land, then verify the request count
    // stays flat: no timer survives the subscription.
    tokio::time::sleep(Duration::from_millis(60)).await;
    let settled = harness.requests_to("/api/v1/videos/").await;
    assert!(settled > 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(harness.requests_to("/api/v1/videos/").await, settled);
}

// ---------------------------------------------------------------------------
// Job detail watcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn detail_watcher_stops_at_completion_and_isolates_missing_results() {
    let harness = TestHarness::new().await;
    let all = [
        "language_detection",
        "compression",
        "subtitle_generation",
        "animal_detection",
        "aggregation",
    ];

    // Two processing snapshots, then a terminal one.
    Mock::given(method("GET"))
        .and(path("/api/v1/videos/vid-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(
            "vid-9",
            "processing",
            &["language_detection"],
            &[],
            Some("compression"),
        )))
        .up_to_n_times(2)
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/videos/vid-9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(job_json("vid-9", "completed", &all, &[], None)),
        )
        .mount(&harness.server)
        .await;

    // Three stage results are retained; animal detection 404s (Scenario C).
    Mock::given(method("GET"))
        .and(path("/api/v1/processing/language-detection/vid-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": "vid-9",
            "detected_language": "fr",
            "language_name": "Français",
            "confidence": 0.97
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/processing/compression/vid-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": "vid-9",
            "resolution": "360p",
            "metadata": { "compression_ratio": "2.4x", "compressed_size": 52_428_800u64 }
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/processing/subtitles/vid-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "video_id": "vid-9",
            "model_name": "tiny",
            "language": "fr",
            "subtitle_text": "Bonjour"
        })))
        .mount(&harness.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/processing/animal-detection/vid-9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&harness.server)
        .await;

    let watcher = JobDetailWatcher::start(harness.api(), "vid-9", Duration::from_millis(40));
    let mut rx = watcher.subscribe();

    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            {
                let view = rx.borrow();
                if view
                    .job
                    .as_ref()
                    .is_some_and(|j| j.status == JobStatus::Completed)
                    && !view.stages.is_empty()
                {
                    break;
                }
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("detail view never reached completion");

    let view = watcher.view();
    assert_eq!(view.stages.len(), StageKind::RESULT_FETCHED.len());

    // The 404 stage renders unavailable; the siblings are untouched.
    assert_matches!(
        view.stages[&StageKind::AnimalDetection],
        StageSlot::NotAvailable
    );
    for kind in [
        StageKind::LanguageDetection,
        StageKind::Compression,
        StageKind::SubtitleGeneration,
    ] {
        assert!(view.stages[&kind].is_available(), "{} unavailable", kind);
    }
    match view.stages[&StageKind::LanguageDetection]
        .envelope()
        .unwrap()
        .details()
    {
        Some(StageDetails::Language(lang)) => {
            assert_eq!(lang.language_name.as_deref(), Some("Français"));
        }
        other => panic!("Expected language details, got: {:?}", other),
    }

    // Terminal status observed: polling stops. Exactly three detail fetches
    // happened and no more arrive.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(harness.requests_to("/api/v1/videos/vid-9").await, 3);
}

#[tokio::test]
async fn detail_watcher_stops_on_failure_without_result_fetches() {
    let harness = TestHarness::new().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/videos/vid-f"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_json(
            "vid-f",
            "failed",
            &["language_detection"],
            &["compression"],
            None,
        )))
        .mount(&harness.server)
        .await;

    let watcher = JobDetailWatcher::start(harness.api(), "vid-f", Duration::from_millis(40));
    let mut rx = watcher.subscribe();

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if rx
                .borrow()
                .job
                .as_ref()
                .is_some_and(|j| j.status == JobStatus::Failed)
            {
                break;
            }
            rx.changed().await.unwrap();
        }
    })
    .await
    .expect("detail view never observed the failure");

    tokio::time::sleep(Duration::from_millis(200)).await;
    // One fetch, then stop; no per-stage result fetches for a failed job.
    assert_eq!(harness.requests_to("/api/v1/videos/vid-f").await, 1);
    assert_eq!(harness.requests_to("/api/v1/processing/").await, 0);
    assert!(watcher.view().stages.is_empty());
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which starts a [`MockServer`] standing in for
//! the pipeline service and builds an [`HttpPipelineApi`] pointed at it,
//! plus canned JSON builders for server payloads.

use std::sync::Arc;

use serde_json::{json, Value};
use wiremock::MockServer;

use vidtrack::api::HttpPipelineApi;
use vidtrack::config::Config;

/// Test harness wrapping a mock pipeline service.
pub struct TestHarness {
    pub server: MockServer,
    pub config: Config,
}

impl TestHarness {
    /// Start a mock server and point a default config at it.
    pub async fn new() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let mut config = Config::default();
        config.api.base_url = server.uri();
        Self { server, config }
    }

    /// Build an HTTP API client against the mock server.
    pub fn api(&self) -> Arc<HttpPipelineApi> {
        Arc::new(HttpPipelineApi::new(&self.config))
    }

    /// Requests received so far whose path starts with `prefix`.
    pub async fn requests_to(&self, prefix: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path().starts_with(prefix))
            .count()
    }
}

/// Install the test log subscriber once; `RUST_LOG` filters as usual.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Canned job snapshot payload.
pub fn job_json(
    id: &str,
    status: &str,
    completed: &[&str],
    failed: &[&str],
    current: Option<&str>,
) -> Value {
    json!({
        "video_id": id,
        "original_filename": "clip.mp4",
        "file_size": 125_829_120u64,
        "content_type": "video/mp4",
        "status": status,
        "upload_time": "2025-06-01T10:00:00Z",
        "current_stage": current,
        "stages_completed": completed,
        "stages_failed": failed,
    })
}

/// Canned end-to-end outcome payload with a successful aggregation.
pub fn outcome_json(id: &str) -> Value {
    json!({
        "video_id": id,
        "overall_status": "completed",
        "message": "Traitement terminé",
        "total_duration": 84.2,
        "success_count": 5,
        "failure_count": 0,
        "skipped_count": 0,
        "aggregation": {
            "stage": "aggregation",
            "status": "completed",
            "result": {
                "aggregated_video_id": format!("{}-agg", id),
                "streaming_url": format!("http://cdn.local/stream/{}", id),
                "has_subtitles": true
            },
            "duration": 12.0
        },
        "final_streaming_url": format!("http://cdn.local/stream/{}", id)
    })
}

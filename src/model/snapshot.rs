//! Job snapshot as reported by the server.
//!
//! A snapshot is a point-in-time, self-consistent view of one job. The
//! client only ever replaces its local mirror with a fresh snapshot; it never
//! creates or mutates one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::JobStatus;

/// Server-reported state of one submitted job.
///
/// Field presence mirrors the wire format: the stage sets default to empty
/// when the server omits them, and every timestamp past the upload time is
/// optional. `processing_time` is a legacy alias some server versions still
/// send alongside `processing_start_time`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    /// Opaque, immutable job identifier minted by the server.
    pub video_id: String,

    pub original_filename: String,

    /// Server-side storage path; carried opaquely for display only.
    #[serde(default)]
    pub file_path: Option<String>,

    pub file_size: u64,

    pub content_type: String,

    pub status: JobStatus,

    pub upload_time: DateTime<Utc>,

    #[serde(default)]
    pub processing_start_time: Option<DateTime<Utc>>,

    /// Legacy alias for [`processing_start_time`](Self::processing_start_time).
    #[serde(default)]
    pub processing_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,

    /// The stage currently executing, if any.
    #[serde(default)]
    pub current_stage: Option<String>,

    /// Stages that finished successfully, in completion order.
    #[serde(default)]
    pub stages_completed: Vec<String>,

    /// Stages that failed, in failure order.
    #[serde(default)]
    pub stages_failed: Vec<String>,

    /// Identifier of the aggregated artifact, once produced.
    #[serde(default)]
    pub aggregated_video_id: Option<String>,
}

impl JobSnapshot {
    /// The moment processing began, preferring the current field name over
    /// the legacy alias.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.processing_start_time.or(self.processing_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_minimal_snapshot() {
        let json = r#"{
            "video_id": "abc-123",
            "original_filename": "clip.mp4",
            "file_size": 1048576,
            "content_type": "video/mp4",
            "status": "uploaded",
            "upload_time": "2025-06-01T10:00:00Z"
        }"#;
        let snapshot: JobSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.video_id, "abc-123");
        assert_eq!(snapshot.status, JobStatus::Uploaded);
        assert!(snapshot.stages_completed.is_empty());
        assert!(snapshot.stages_failed.is_empty());
        assert!(snapshot.current_stage.is_none());
        assert!(snapshot.started_at().is_none());
    }

    #[test]
    fn started_at_prefers_current_field_over_alias() {
        let json = r#"{
            "video_id": "abc-123",
            "original_filename": "clip.mp4",
            "file_size": 1,
            "content_type": "video/mp4",
            "status": "processing",
            "upload_time": "2025-06-01T10:00:00Z",
            "processing_time": "2025-06-01T10:00:05Z",
            "processing_start_time": "2025-06-01T10:00:10Z"
        }"#;
        let snapshot: JobSnapshot = serde_json::from_str(json).unwrap();
        let started = snapshot.started_at().unwrap();
        assert_eq!(started.to_rfc3339(), "2025-06-01T10:00:10+00:00");
    }
}

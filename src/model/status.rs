//! Per-stage status derivation and progress arithmetic.
//!
//! The job's overall status is authoritative from the server and never
//! derived here; this module only interprets the stage sets of a snapshot
//! into discrete per-stage statuses and a single completion percentage.

use super::snapshot::JobSnapshot;
use super::stage::{StageKind, StageStatus, STAGE_COUNT};

/// Fixed message for a stage skipped because the media has no audio track.
pub const SKIPPED_NO_AUDIO: &str = "Vidéo sans piste audio - étape non applicable";

/// Generic message for a stage skipped for any other (or unstated) reason.
pub const SKIPPED_GENERIC: &str = "Étape sautée";

/// Derive the status of one stage from a snapshot.
///
/// Precedence: `failed` > `completed` > `processing` (current-stage match) >
/// `pending`. Inconsistent input (a stage listed as completed *and* marked
/// current) is tolerated, not repaired: the stronger status wins, so a
/// completed stage is never displayed as processing again. A stage absent
/// from every set stays `pending` even when the job itself is terminal.
pub fn stage_status(job: &JobSnapshot, stage: StageKind) -> StageStatus {
    let name = stage.as_str();
    if job.stages_failed.iter().any(|s| s == name) {
        StageStatus::Failed
    } else if job.stages_completed.iter().any(|s| s == name) {
        StageStatus::Completed
    } else if job.current_stage.as_deref() == Some(name) {
        StageStatus::Processing
    } else {
        StageStatus::Pending
    }
}

/// Derive every stage's status in pipeline order.
pub fn stage_statuses(job: &JobSnapshot) -> [(StageKind, StageStatus); STAGE_COUNT] {
    StageKind::ALL.map(|kind| (kind, stage_status(job, kind)))
}

/// Completion percentage: settled stages (completed or failed) over the
/// fixed stage count, rounded.
///
/// Skipped stages are expected to also appear in the server's completed or
/// failed accounting; skipping never shrinks the denominator.
pub fn progress(job: &JobSnapshot) -> u8 {
    let settled = job.stages_completed.len() + job.stages_failed.len();
    ((settled as f64 / STAGE_COUNT as f64) * 100.0).round() as u8
}

/// Resolve the display message for a skipped stage.
///
/// A closed two-branch policy: the `no_audio_track` reason has a fixed
/// domain message, everything else falls back to the generic one.
pub fn skip_message(reason: Option<&str>) -> &'static str {
    match reason {
        Some("no_audio_track") => SKIPPED_NO_AUDIO,
        _ => SKIPPED_GENERIC,
    }
}

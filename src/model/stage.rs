//! Stage and status enumerations.
//!
//! [`StageKind`] declares the pipeline's execution order; everything that
//! needs "how many stages are there" derives it from [`StageKind::ALL`]
//! rather than repeating a literal count.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One named unit of pipeline work, in declared execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    LanguageDetection,
    Compression,
    SubtitleGeneration,
    AnimalDetection,
    Aggregation,
}

/// Number of stages in the pipeline; the fixed denominator of the progress
/// formula.
pub const STAGE_COUNT: usize = StageKind::ALL.len();

impl StageKind {
    /// Every stage, in pipeline execution order.
    pub const ALL: [StageKind; 5] = [
        StageKind::LanguageDetection,
        StageKind::Compression,
        StageKind::SubtitleGeneration,
        StageKind::AnimalDetection,
        StageKind::Aggregation,
    ];

    /// The stages whose results are independently fetchable from the server.
    /// Aggregation has no standalone result endpoint; its artifact reference
    /// travels on the job snapshot itself.
    pub const RESULT_FETCHED: [StageKind; 4] = [
        StageKind::LanguageDetection,
        StageKind::Compression,
        StageKind::SubtitleGeneration,
        StageKind::AnimalDetection,
    ];

    /// The wire identifier used in snapshot stage sets and form fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::LanguageDetection => "language_detection",
            StageKind::Compression => "compression",
            StageKind::SubtitleGeneration => "subtitle_generation",
            StageKind::AnimalDetection => "animal_detection",
            StageKind::Aggregation => "aggregation",
        }
    }

    /// The path segment of the per-stage result endpoint, if the server
    /// exposes one for this stage.
    pub fn result_endpoint(&self) -> Option<&'static str> {
        match self {
            StageKind::LanguageDetection => Some("language-detection"),
            StageKind::Compression => Some("compression"),
            StageKind::SubtitleGeneration => Some("subtitles"),
            StageKind::AnimalDetection => Some("animal-detection"),
            StageKind::Aggregation => None,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        StageKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown stage: {}", s))
    }
}

/// Discrete status of a single stage, as derived from a snapshot or reported
/// in a result envelope. `Skipped` is terminal and non-failure.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    Skipped,
}

impl StageStatus {
    /// Whether this status can no longer change for the stage.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageStatus::Completed | StageStatus::Failed | StageStatus::Skipped
        )
    }
}

/// Overall job status. Authoritative from the server; the client interprets
/// but never derives or invents this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether the pipeline has finished for this job, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Uploaded => "uploaded",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

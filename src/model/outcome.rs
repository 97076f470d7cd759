//! End-to-end outcome of a one-shot submission.

use serde::{Deserialize, Serialize};

use super::result::StageResultEnvelope;
use super::stage::{JobStatus, StageKind};

/// The full per-stage outcome returned synchronously when the submission
/// request resolves, minutes after upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    pub video_id: String,

    pub overall_status: JobStatus,

    /// Human-readable summary from the server.
    pub message: String,

    /// Wall-clock duration of the whole pipeline, in seconds.
    #[serde(default)]
    pub total_duration: Option<f64>,

    #[serde(default)]
    pub success_count: u32,

    #[serde(default)]
    pub failure_count: u32,

    #[serde(default)]
    pub skipped_count: u32,

    #[serde(default)]
    pub language_detection: Option<StageResultEnvelope>,

    #[serde(default)]
    pub compression: Option<StageResultEnvelope>,

    #[serde(default)]
    pub subtitle_generation: Option<StageResultEnvelope>,

    #[serde(default)]
    pub animal_detection: Option<StageResultEnvelope>,

    #[serde(default)]
    pub aggregation: Option<StageResultEnvelope>,

    /// Server-echoed playable reference;
    /// [`final_stream_reference`](Self::final_stream_reference) is the
    /// authoritative accessor.
    #[serde(default)]
    pub final_streaming_url: Option<String>,
}

impl ProcessingOutcome {
    /// The envelope for one stage, if the server reported it.
    pub fn stage(&self, kind: StageKind) -> Option<&StageResultEnvelope> {
        match kind {
            StageKind::LanguageDetection => self.language_detection.as_ref(),
            StageKind::Compression => self.compression.as_ref(),
            StageKind::SubtitleGeneration => self.subtitle_generation.as_ref(),
            StageKind::AnimalDetection => self.animal_detection.as_ref(),
            StageKind::Aggregation => self.aggregation.as_ref(),
        }
    }

    /// Reported stage envelopes in pipeline execution order.
    pub fn stages(&self) -> impl Iterator<Item = (StageKind, &StageResultEnvelope)> {
        StageKind::ALL
            .into_iter()
            .filter_map(|kind| self.stage(kind).map(|env| (kind, env)))
    }

    /// The final playable reference, surfaced if and only if the aggregation
    /// stage result supplies a streaming reference.
    pub fn final_stream_reference(&self) -> Option<&str> {
        self.aggregation
            .as_ref()?
            .result
            .as_ref()?
            .streaming_url
            .as_deref()
    }
}

//! Stage result payloads and their typed views.
//!
//! The server's per-stage payloads are inconsistently shaped: fields come and
//! go per stage kind, numbers arrive out of range, and some endpoints nest
//! the payload under a `result` key while others flatten it. This module is
//! the single chokepoint that turns that untyped input into typed output;
//! no other component touches raw payloads. Values are shaped, never
//! validated or clamped: a confidence above 1 passes through as-is.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::stage::{StageKind, StageStatus};

/// Raw per-stage result payload with every field optional.
///
/// This is the union of all stage kinds' fields; [`StageResultEnvelope::details`]
/// projects the relevant subset for one kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStageResult {
    // Skip marker, common to all stages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    // Language detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    // Compression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crf_value: Option<u32>,

    // Subtitle generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle_text_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srt_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub srt_content: Option<String>,

    // Animal detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_info: Option<VideoAnalysisInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detection_summary: Option<DetectionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_video: Option<String>,

    // Aggregation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregated_video_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_subtitles: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_audio: Option<bool>,

    // Compression and aggregation both report a `metadata` block; the shapes
    // differ, so the raw form is their union.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<RawMetadata>,
}

impl RawStageResult {
    /// Whether the stage reported itself as skipped.
    pub fn is_skipped(&self) -> bool {
        self.skipped == Some(true)
    }

    /// True when no field of the payload is populated.
    pub fn is_empty(&self) -> bool {
        serde_json::to_value(self)
            .map(|v| v.as_object().map(|o| o.is_empty()).unwrap_or(true))
            .unwrap_or(true)
    }
}

/// Union of the compression and aggregation `metadata` blocks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetadata {
    // Compression side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,

    // Aggregation side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    // Both sides report a duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// Frame-level analysis info reported by the detection stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoAnalysisInfo {
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub total_frames: Option<u64>,
    #[serde(default)]
    pub processed_frames: Option<u64>,
}

/// Aggregate detection counts reported by the detection stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    #[serde(default)]
    pub total_detections: Option<u64>,
    #[serde(default)]
    pub unique_classes: Option<u64>,
    #[serde(default)]
    pub animals_detected: Option<HashMap<String, u64>>,
    #[serde(default)]
    pub frames_with_detections: Option<u64>,
}

/// One stage's outcome as reported by the server, either inside a
/// [`ProcessingOutcome`](super::outcome::ProcessingOutcome) or from a
/// standalone per-stage fetch.
///
/// `duration` and `error_message` are reportable independently of status; a
/// failed stage may still carry a partial duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResultEnvelope {
    pub stage: StageKind,

    #[serde(default)]
    pub status: StageStatus,

    #[serde(default)]
    pub result: Option<RawStageResult>,

    #[serde(default)]
    pub error_message: Option<String>,

    /// Stage execution time in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
}

impl StageResultEnvelope {
    /// Status with the skip promotion applied: a completed stage whose
    /// payload carries `skipped=true` reads as [`StageStatus::Skipped`].
    /// A reported failure always wins.
    pub fn effective_status(&self) -> StageStatus {
        if self.status == StageStatus::Failed {
            return StageStatus::Failed;
        }
        if self.result.as_ref().is_some_and(|r| r.is_skipped()) {
            return StageStatus::Skipped;
        }
        self.status
    }

    /// Project the raw payload into the typed view for this envelope's stage
    /// kind. Returns `None` when the stage has produced no payload at all.
    pub fn details(&self) -> Option<StageDetails> {
        let raw = self.result.as_ref()?;
        if raw.is_skipped() {
            return Some(StageDetails::Skipped {
                reason: raw.reason.clone(),
            });
        }
        let details = match self.stage {
            StageKind::LanguageDetection => StageDetails::Language(LanguageDetails {
                detected_language: raw.detected_language.clone(),
                language_name: raw.language_name.clone(),
                confidence: raw.confidence,
            }),
            StageKind::Compression => StageDetails::Compression(CompressionDetails {
                resolution: raw.resolution.clone(),
                output_path: raw.output_path.clone(),
                crf_value: raw.crf_value,
                original_size: raw.metadata.as_ref().and_then(|m| m.original_size),
                compressed_size: raw.metadata.as_ref().and_then(|m| m.compressed_size),
                compression_ratio: raw
                    .metadata
                    .as_ref()
                    .and_then(|m| m.compression_ratio.clone()),
                bitrate: raw.metadata.as_ref().and_then(|m| m.bitrate),
            }),
            StageKind::SubtitleGeneration => StageDetails::Subtitles(SubtitleDetails {
                model_name: raw.model_name.clone(),
                language: raw.language.clone(),
                subtitle_text: raw.subtitle_text.clone(),
                subtitle_text_preview: raw.subtitle_text_preview.clone(),
                text_length: raw.text_length,
                srt_url: raw.srt_url.clone(),
            }),
            StageKind::AnimalDetection => StageDetails::Detection(DetectionDetails {
                video_info: raw.video_info.clone(),
                detection_summary: raw.detection_summary.clone(),
                output_video: raw.output_video.clone(),
            }),
            StageKind::Aggregation => StageDetails::Aggregation(AggregationDetails {
                aggregated_video_id: raw.aggregated_video_id.clone(),
                streaming_url: raw.streaming_url.clone(),
                has_subtitles: raw.has_subtitles,
                no_audio: raw.no_audio,
                final_filename: raw.metadata.as_ref().and_then(|m| m.final_filename.clone()),
                resolution: raw.metadata.as_ref().and_then(|m| m.resolution.clone()),
                duration: raw.metadata.as_ref().and_then(|m| m.duration),
                file_size: raw.metadata.as_ref().and_then(|m| m.file_size),
            }),
        };
        Some(details)
    }
}

/// Wire shape of a standalone per-stage result fetch.
///
/// Some endpoints return the payload flattened at the top level, others nest
/// it under `result`; both are absorbed here and normalized by
/// [`into_envelope`](Self::into_envelope).
#[derive(Debug, Clone, Deserialize)]
pub struct StageResultResponse {
    #[serde(default)]
    pub video_id: Option<String>,

    #[serde(default)]
    pub processing_type: Option<String>,

    #[serde(default)]
    pub status: Option<StageStatus>,

    #[serde(default)]
    pub result: Option<RawStageResult>,

    #[serde(flatten)]
    pub flat: RawStageResult,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl StageResultResponse {
    /// Normalize into a [`StageResultEnvelope`] for the given stage.
    ///
    /// The nested `result` wins when present, otherwise the flattened fields
    /// are taken. A retained result without an explicit status reads as
    /// completed, since the server only keeps results for stages that
    /// produced output.
    pub fn into_envelope(self, stage: StageKind) -> StageResultEnvelope {
        let payload = match self.result {
            Some(nested) => nested,
            None => self.flat,
        };
        StageResultEnvelope {
            stage,
            status: self.status.unwrap_or(StageStatus::Completed),
            result: if payload.is_empty() {
                None
            } else {
                Some(payload)
            },
            error_message: None,
            duration: None,
        }
    }
}

/// Typed, per-kind view over a raw stage payload.
#[derive(Debug, Clone)]
pub enum StageDetails {
    /// The stage was skipped; carries the server's reason code.
    Skipped { reason: Option<String> },
    Language(LanguageDetails),
    Compression(CompressionDetails),
    Subtitles(SubtitleDetails),
    Detection(DetectionDetails),
    Aggregation(AggregationDetails),
}

#[derive(Debug, Clone)]
pub struct LanguageDetails {
    pub detected_language: Option<String>,
    pub language_name: Option<String>,
    /// Reported confidence; passed through uninterpreted, even out of [0,1].
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CompressionDetails {
    pub resolution: Option<String>,
    pub output_path: Option<String>,
    pub crf_value: Option<u32>,
    pub original_size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub compression_ratio: Option<String>,
    pub bitrate: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SubtitleDetails {
    pub model_name: Option<String>,
    pub language: Option<String>,
    pub subtitle_text: Option<String>,
    pub subtitle_text_preview: Option<String>,
    pub text_length: Option<u64>,
    pub srt_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DetectionDetails {
    pub video_info: Option<VideoAnalysisInfo>,
    pub detection_summary: Option<DetectionSummary>,
    pub output_video: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AggregationDetails {
    pub aggregated_video_id: Option<String>,
    pub streaming_url: Option<String>,
    pub has_subtitles: Option<bool>,
    pub no_audio: Option<bool>,
    pub final_filename: Option<String>,
    pub resolution: Option<String>,
    pub duration: Option<f64>,
    pub file_size: Option<u64>,
}

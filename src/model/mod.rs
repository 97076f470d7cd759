//! Typed model of the remote pipeline's state.
//!
//! This module is the only place raw server payloads are interpreted:
//! snapshots, per-stage results, and the one-shot outcome envelope all enter
//! as loosely-shaped JSON and leave as the typed, optional-safe structures
//! the rest of the crate consumes.

mod outcome;
mod result;
mod snapshot;
mod stage;
pub mod status;

pub use outcome::ProcessingOutcome;
pub use result::{
    AggregationDetails, CompressionDetails, DetectionDetails, DetectionSummary, LanguageDetails,
    RawMetadata, RawStageResult, StageDetails, StageResultEnvelope, StageResultResponse,
    SubtitleDetails, VideoAnalysisInfo,
};
pub use snapshot::JobSnapshot;
pub use stage::{JobStatus, StageKind, StageStatus, STAGE_COUNT};

//! Submission inputs: the candidate file, the pipeline options, and the
//! upload progress plumbing shared with the API layer.

use std::path::PathBuf;

use tokio::sync::{oneshot, watch};

use crate::error::{Error, Result};

/// A file the caller wants to submit, described by metadata only; the
/// content is streamed from `path` at submission time.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    /// Build a candidate from a filesystem path, guessing the content type
    /// from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let metadata = std::fs::metadata(&path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Validation("Nom de fichier invalide".into()))?;
        let content_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self {
            path,
            file_name,
            content_type,
            size_bytes: metadata.len(),
        })
    }
}

/// Target resolution label for the compression stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetResolution {
    P240,
    #[default]
    P360,
    P480,
    P720,
    P1080,
}

impl TargetResolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetResolution::P240 => "240p",
            TargetResolution::P360 => "360p",
            TargetResolution::P480 => "480p",
            TargetResolution::P720 => "720p",
            TargetResolution::P1080 => "1080p",
        }
    }
}

/// Transcription model size for the subtitle stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubtitleModel {
    #[default]
    Tiny,
    Base,
    Small,
    Medium,
    Large,
}

impl SubtitleModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubtitleModel::Tiny => "tiny",
            SubtitleModel::Base => "base",
            SubtitleModel::Small => "small",
            SubtitleModel::Medium => "medium",
            SubtitleModel::Large => "large",
        }
    }
}

/// Configurable pipeline parameters sent with the submission.
///
/// Bounds are enforced by [`validate`](Self::validate) before any network
/// call; out-of-range values are rejected, not clamped.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Audio analysis window for language detection, in seconds ([10,120]).
    pub language_detection_duration: u32,
    pub target_resolution: TargetResolution,
    /// Compression quality factor ([18,28]; lower is higher quality).
    pub crf: u8,
    pub subtitle_model: SubtitleModel,
    /// Target language code, or `auto` to reuse the detected one.
    pub subtitle_language: String,
    pub enable_animal_detection: bool,
    /// Detection confidence threshold in [0,1].
    pub animal_confidence_threshold: f32,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            language_detection_duration: 30,
            target_resolution: TargetResolution::default(),
            crf: 23,
            subtitle_model: SubtitleModel::default(),
            subtitle_language: "auto".to_string(),
            enable_animal_detection: true,
            animal_confidence_threshold: 0.5,
        }
    }
}

impl PipelineOptions {
    /// Check every bounded parameter, with a user-facing reason per
    /// rejection.
    pub fn validate(&self) -> Result<()> {
        if !(10..=120).contains(&self.language_detection_duration) {
            return Err(Error::Validation(
                "La durée d'analyse doit être comprise entre 10 et 120 secondes".into(),
            ));
        }
        if !(18..=28).contains(&self.crf) {
            return Err(Error::Validation(
                "Le facteur de qualité (CRF) doit être compris entre 18 et 28".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.animal_confidence_threshold) {
            return Err(Error::Validation(
                "Le seuil de confiance doit être compris entre 0 et 1".into(),
            ));
        }
        Ok(())
    }
}

/// Sender half of the upload progress channel, handed to the API layer's
/// streaming body. Publishes a percentage in [0,100] and fires a one-shot
/// signal when the transport has carried the last byte.
#[derive(Debug)]
pub struct UploadProgress {
    percent: watch::Sender<f32>,
    transport_done: Option<oneshot::Sender<()>>,
}

impl UploadProgress {
    /// Create the progress sender together with its consumer halves.
    pub fn channel() -> (Self, watch::Receiver<f32>, oneshot::Receiver<()>) {
        let (percent, percent_rx) = watch::channel(0.0);
        let (done_tx, done_rx) = oneshot::channel();
        (
            Self {
                percent,
                transport_done: Some(done_tx),
            },
            percent_rx,
            done_rx,
        )
    }

    /// Record that `sent` of `total` bytes have been handed to the
    /// transport.
    pub fn advance(&mut self, sent: u64, total: u64) {
        let pct = if total == 0 {
            100.0
        } else {
            (((sent as f64 / total as f64) * 100.0).min(100.0)) as f32
        };
        self.percent.send_replace(pct);
        if sent >= total {
            self.finish();
        }
    }

    /// Mark the transport as complete. Idempotent.
    pub fn finish(&mut self) {
        self.percent.send_replace(100.0);
        if let Some(done) = self.transport_done.take() {
            let _ = done.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_bounds() {
        let options = PipelineOptions::default();
        assert!(options.validate().is_ok());
        assert_eq!(options.language_detection_duration, 30);
        assert_eq!(options.target_resolution.as_str(), "360p");
        assert_eq!(options.crf, 23);
        assert_eq!(options.subtitle_model.as_str(), "tiny");
        assert_eq!(options.subtitle_language, "auto");
        assert!(options.enable_animal_detection);
    }

    #[test]
    fn rejects_out_of_bounds_values() {
        let mut options = PipelineOptions {
            language_detection_duration: 5,
            ..Default::default()
        };
        assert!(options.validate().is_err());

        options.language_detection_duration = 30;
        options.crf = 40;
        assert!(options.validate().is_err());

        options.crf = 23;
        options.animal_confidence_threshold = 1.5;
        assert!(options.validate().is_err());
    }

    #[test]
    fn progress_fires_done_once_at_full_transfer() {
        let (mut progress, percent_rx, mut done_rx) = UploadProgress::channel();
        progress.advance(512, 1024);
        assert_eq!(*percent_rx.borrow(), 50.0);
        assert!(done_rx.try_recv().is_err());

        progress.advance(1024, 1024);
        assert_eq!(*percent_rx.borrow(), 100.0);
        assert!(done_rx.try_recv().is_ok());

        // A trailing finish (end-of-stream) stays idempotent.
        progress.finish();
    }
}

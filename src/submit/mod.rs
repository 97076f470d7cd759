//! Submission controller: the one-shot "submit and detach" path.
//!
//! Submission is a single long-lived request spanning upload transport *and*
//! server-side pipeline execution, but those are two different completions:
//! the controller resets its own state and hands off to polling as soon as
//! the transport reaches 100%, and only the detached outcome future waits
//! for the pipeline itself. The two completions are exposed as two separate
//! futures on [`Submission`].

mod options;

pub use options::{
    PipelineOptions, SubtitleModel, TargetResolution, UploadCandidate, UploadProgress,
};

use std::sync::Arc;

use tokio::sync::{oneshot, watch, Notify};
use tracing::{info, warn};

use crate::api::PipelineApi;
use crate::config::UploadConfig;
use crate::display::format_file_size;
use crate::error::{Error, Result};
use crate::model::ProcessingOutcome;

/// User-facing message when the whole submission exceeds its deadline.
pub const TIMEOUT_MESSAGE: &str =
    "Le traitement a pris trop de temps (> 30 minutes). Vérifiez la vidéo dans la liste.";

/// User-facing message for a transport failure during submission.
pub const NETWORK_ERROR_MESSAGE: &str = "Erreur réseau lors de l'upload";

/// Rejection reason for a file type outside the accepted set.
pub const UNSUPPORTED_FORMAT_MESSAGE: &str =
    "Format de fichier non supporté. Veuillez sélectionner un fichier MP4, AVI ou MOV.";

/// Discrete state of the submission form, published over a watch channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SubmitState {
    #[default]
    Idle,
    Selected { file_name: String, size_bytes: u64 },
    Submitting,
    Error { message: String },
}

/// Handle to one in-flight submission.
///
/// Dropping the handle does not cancel anything: the request is detached and
/// the controller keeps reacting to its completions.
#[derive(Debug)]
pub struct Submission {
    progress: watch::Receiver<f32>,
    upload_complete: oneshot::Receiver<()>,
    outcome: oneshot::Receiver<Result<ProcessingOutcome>>,
}

impl Submission {
    /// Transport progress percentage in [0,100].
    pub fn progress(&self) -> watch::Receiver<f32> {
        self.progress.clone()
    }

    /// Resolves once upload transport reaches 100%. Returns `false` if the
    /// request failed before the last byte was handed off.
    pub async fn upload_complete(&mut self) -> bool {
        (&mut self.upload_complete).await.is_ok()
    }

    /// Resolves when the server-side pipeline terminates (or the request
    /// fails or times out).
    pub async fn outcome(self) -> Result<ProcessingOutcome> {
        self.outcome.await.unwrap_or_else(|_| {
            Err(Error::Internal(
                "submission task dropped before reporting an outcome".into(),
            ))
        })
    }
}

/// Drives file selection, validation, and the detached submission request.
pub struct SubmissionController {
    api: Arc<dyn PipelineApi>,
    upload: UploadConfig,
    state: Arc<watch::Sender<SubmitState>>,
    reconcile: Arc<Notify>,
}

impl SubmissionController {
    pub fn new(api: Arc<dyn PipelineApi>, upload: UploadConfig) -> Self {
        Self::with_reconcile(api, upload, Arc::new(Notify::new()))
    }

    /// Create a controller that signals reconciliation on a shared handle,
    /// typically the list watcher's wake handle, so a finished upload shows
    /// up in the next list view without waiting a full poll interval.
    pub fn with_reconcile(
        api: Arc<dyn PipelineApi>,
        upload: UploadConfig,
        reconcile: Arc<Notify>,
    ) -> Self {
        let (state, _) = watch::channel(SubmitState::Idle);
        Self {
            api,
            upload,
            state: Arc::new(state),
            reconcile,
        }
    }

    /// Subscribe to form state transitions.
    pub fn state(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    /// Clone of the current form state.
    pub fn current_state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    /// The handle notified whenever a reconciliation pass should run.
    pub fn reconcile_handle(&self) -> Arc<Notify> {
        self.reconcile.clone()
    }

    /// Validate and select a candidate file. On rejection the form moves to
    /// the error state with the specific reason; no network call is made.
    pub fn select(&self, candidate: &UploadCandidate) -> Result<()> {
        if let Err(e) = self.validate(candidate) {
            self.state.send_replace(SubmitState::Error {
                message: user_message(&e),
            });
            return Err(e);
        }
        self.state.send_replace(SubmitState::Selected {
            file_name: candidate.file_name.clone(),
            size_bytes: candidate.size_bytes,
        });
        Ok(())
    }

    /// Clear the form back to idle.
    pub fn reset(&self) {
        self.state.send_replace(SubmitState::Idle);
    }

    /// Fire the one-shot submission request and detach.
    ///
    /// Validation runs again before any network call. On success the form
    /// moves to `Submitting`; it auto-resets to `Idle` as soon as upload
    /// transport completes, while the pipeline keeps running server-side.
    pub fn submit(
        &self,
        candidate: UploadCandidate,
        options: PipelineOptions,
    ) -> Result<Submission> {
        if let Err(e) = self.validate(&candidate).and_then(|_| options.validate()) {
            self.state.send_replace(SubmitState::Error {
                message: user_message(&e),
            });
            return Err(e);
        }

        self.state.send_replace(SubmitState::Submitting);

        let (progress, percent_rx, transport_done) = UploadProgress::channel();
        let (upload_tx, upload_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        // Transport completion: optimistically reset the form and hand
        // control back to the poll reconciler; the job now exists
        // server-side and will appear in the next list poll.
        {
            let state = self.state.clone();
            let reconcile = self.reconcile.clone();
            let file_name = candidate.file_name.clone();
            tokio::spawn(async move {
                if transport_done.await.is_ok() {
                    info!(file = %file_name, "upload transport complete; handing off to polling");
                    state.send_replace(SubmitState::Idle);
                    reconcile.notify_one();
                    let _ = upload_tx.send(());
                }
            });
        }

        // Pipeline completion: the long-lived request itself.
        {
            let api = self.api.clone();
            let state = self.state.clone();
            let reconcile = self.reconcile.clone();
            tokio::spawn(async move {
                let result = api.process_video(&candidate, &options, progress).await;
                match &result {
                    Ok(outcome) => {
                        info!(
                            video_id = %outcome.video_id,
                            status = %outcome.overall_status,
                            "pipeline outcome received"
                        );
                        reconcile.notify_one();
                    }
                    Err(Error::Timeout { .. }) => {
                        // The server-side job may have finished anyway;
                        // reconcile once so the list reflects it.
                        warn!("submission exceeded its deadline");
                        state.send_replace(SubmitState::Error {
                            message: TIMEOUT_MESSAGE.to_string(),
                        });
                        reconcile.notify_one();
                    }
                    Err(e) => {
                        warn!(error = %e, "submission failed");
                        let message = match e {
                            Error::Transport { .. } => NETWORK_ERROR_MESSAGE.to_string(),
                            other => user_message(other),
                        };
                        state.send_replace(SubmitState::Error { message });
                    }
                }
                let _ = outcome_tx.send(result);
            });
        }

        Ok(Submission {
            progress: percent_rx,
            upload_complete: upload_rx,
            outcome: outcome_rx,
        })
    }

    fn validate(&self, candidate: &UploadCandidate) -> Result<()> {
        if !self.upload.accepts(&candidate.content_type) {
            return Err(Error::Validation(UNSUPPORTED_FORMAT_MESSAGE.into()));
        }
        if candidate.size_bytes > self.upload.max_file_size_bytes {
            return Err(Error::Validation(format!(
                "La taille du fichier dépasse {}. Veuillez sélectionner un fichier plus petit.",
                format_file_size(self.upload.max_file_size_bytes)
            )));
        }
        Ok(())
    }
}

/// Strip the taxonomy prefix for form display; the raw reason is what the
/// user sees.
fn user_message(error: &Error) -> String {
    match error {
        Error::Validation(message) => message.clone(),
        other => other.to_string(),
    }
}

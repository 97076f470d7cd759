//! Poll reconciliation: periodic snapshot fetches merged into read-only
//! views.
//!
//! Each watcher is a scoped subscription: starting it spawns a polling task
//! and dropping it aborts that task, so no timer outlives its consumer and
//! no in-flight fetch is applied after teardown. Views are published over
//! `tokio::sync::watch`; a failed fetch records a retryable error and keeps
//! the last known-good snapshot.

mod sequence;

pub use sequence::PollSequencer;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::api::PipelineApi;
use crate::model::{JobSnapshot, JobStatus, StageKind, StageResultEnvelope};

/// Aborts the polling task when the subscription is dropped.
struct PollGuard {
    task: JoinHandle<()>,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read-only view over the job list, replaced wholesale on every successful
/// poll.
#[derive(Debug, Clone, Default)]
pub struct JobListView {
    pub jobs: Vec<JobSnapshot>,
    /// Message of the most recent failed poll, cleared on the next success.
    pub last_error: Option<String>,
}

impl JobListView {
    pub fn find(&self, id: &str) -> Option<&JobSnapshot> {
        self.jobs.iter().find(|j| j.video_id == id)
    }

    pub fn completed(&self) -> impl Iterator<Item = &JobSnapshot> {
        self.with_status(JobStatus::Completed)
    }

    pub fn processing(&self) -> impl Iterator<Item = &JobSnapshot> {
        self.with_status(JobStatus::Processing)
    }

    pub fn failed(&self) -> impl Iterator<Item = &JobSnapshot> {
        self.with_status(JobStatus::Failed)
    }

    fn with_status(&self, status: JobStatus) -> impl Iterator<Item = &JobSnapshot> {
        self.jobs.iter().filter(move |j| j.status == status)
    }
}

/// Scoped subscription polling the job list on a fixed cadence.
///
/// Polls unconditionally while held; [`refresh`](Self::refresh) (or the
/// shared wake handle) triggers an immediate extra poll, which is how the
/// submission controller requests its post-upload reconciliation pass.
pub struct JobListWatcher {
    rx: watch::Receiver<JobListView>,
    wake: Arc<Notify>,
    _guard: PollGuard,
}

impl JobListWatcher {
    /// Spawn the polling task. Must be called within a Tokio runtime.
    pub fn start(api: Arc<dyn PipelineApi>, every: Duration) -> Self {
        Self::start_with_wake(api, every, Arc::new(Notify::new()))
    }

    /// Spawn the polling task with an externally shared wake handle.
    pub fn start_with_wake(api: Arc<dyn PipelineApi>, every: Duration, wake: Arc<Notify>) -> Self {
        let (tx, rx) = watch::channel(JobListView::default());
        let task = tokio::spawn(run_list_loop(api, every, wake.clone(), tx));
        Self {
            rx,
            wake,
            _guard: PollGuard { task },
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<JobListView> {
        self.rx.clone()
    }

    /// Clone of the current view.
    pub fn view(&self) -> JobListView {
        self.rx.borrow().clone()
    }

    /// Request an immediate poll outside the regular cadence.
    pub fn refresh(&self) {
        self.wake.notify_one();
    }

    /// The wake handle driving [`refresh`](Self::refresh), shareable with
    /// producers that want to trigger reconciliation.
    pub fn wake_handle(&self) -> Arc<Notify> {
        self.wake.clone()
    }
}

async fn run_list_loop(
    api: Arc<dyn PipelineApi>,
    every: Duration,
    wake: Arc<Notify>,
    tx: watch::Sender<JobListView>,
) {
    debug!(interval_secs = every.as_secs(), "job list watcher started");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sequencer = PollSequencer::default();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = wake.notified() => {}
        }

        let attempt = sequencer.begin();
        match api.list_jobs().await {
            Ok(jobs) => {
                if sequencer.commit(attempt) {
                    tx.send_replace(JobListView {
                        jobs,
                        last_error: None,
                    });
                }
            }
            Err(e) => {
                warn!(error = %e, "job list poll failed; keeping last known-good view");
                tx.send_modify(|view| view.last_error = Some(e.to_string()));
            }
        }
    }
}

/// One stage's independently fetched result, as displayed on the detail
/// view.
#[derive(Debug, Clone, Default)]
pub enum StageSlot {
    /// Not yet produced, not retained, or the fetch failed. Rendered as
    /// "Résultat non disponible"; never an application error.
    #[default]
    NotAvailable,
    Available(StageResultEnvelope),
}

impl StageSlot {
    pub fn is_available(&self) -> bool {
        matches!(self, StageSlot::Available(_))
    }

    pub fn envelope(&self) -> Option<&StageResultEnvelope> {
        match self {
            StageSlot::Available(envelope) => Some(envelope),
            StageSlot::NotAvailable => None,
        }
    }
}

/// Read-only view over one job's detail and its per-stage results.
#[derive(Debug, Clone, Default)]
pub struct JobDetailView {
    pub job: Option<JobSnapshot>,
    /// Per-stage result slots, populated once the job completes.
    pub stages: BTreeMap<StageKind, StageSlot>,
    /// Message of the most recent failed poll, cleared on the next success.
    pub last_error: Option<String>,
}

/// Scoped subscription polling one job's detail while it is processing.
///
/// Stops on its own once a terminal status is observed; for a completed job
/// it first runs one round of per-stage result fetches, each
/// failure-isolated.
pub struct JobDetailWatcher {
    rx: watch::Receiver<JobDetailView>,
    _guard: PollGuard,
}

impl JobDetailWatcher {
    /// Spawn the polling task. Must be called within a Tokio runtime.
    pub fn start(api: Arc<dyn PipelineApi>, id: impl Into<String>, every: Duration) -> Self {
        let (tx, rx) = watch::channel(JobDetailView::default());
        let task = tokio::spawn(run_detail_loop(api, id.into(), every, tx));
        Self {
            rx,
            _guard: PollGuard { task },
        }
    }

    /// Subscribe to view updates.
    pub fn subscribe(&self) -> watch::Receiver<JobDetailView> {
        self.rx.clone()
    }

    /// Clone of the current view.
    pub fn view(&self) -> JobDetailView {
        self.rx.borrow().clone()
    }
}

async fn run_detail_loop(
    api: Arc<dyn PipelineApi>,
    id: String,
    every: Duration,
    tx: watch::Sender<JobDetailView>,
) {
    debug!(video_id = %id, interval_secs = every.as_secs(), "job detail watcher started");
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sequencer = PollSequencer::default();

    loop {
        ticker.tick().await;

        let attempt = sequencer.begin();
        match api.get_job(&id).await {
            Ok(job) => {
                if !sequencer.commit(attempt) {
                    continue;
                }
                let status = job.status;
                tx.send_modify(|view| {
                    view.job = Some(job);
                    view.last_error = None;
                });
                if status.is_terminal() {
                    if status == JobStatus::Completed {
                        let stages = fetch_stage_results(api.as_ref(), &id).await;
                        tx.send_modify(|view| view.stages = stages);
                    }
                    debug!(video_id = %id, %status, "job reached terminal status; detail watcher stopping");
                    break;
                }
            }
            Err(e) => {
                warn!(video_id = %id, error = %e, "job detail poll failed; keeping last known-good view");
                tx.send_modify(|view| view.last_error = Some(e.to_string()));
            }
        }
    }
}

/// Fetch the result-bearing stages concurrently. Every fetch is
/// failure-isolated: a 404 or transport error leaves that stage's slot
/// unavailable without touching the siblings.
async fn fetch_stage_results(api: &dyn PipelineApi, id: &str) -> BTreeMap<StageKind, StageSlot> {
    let fetches = StageKind::RESULT_FETCHED.map(|stage| async move {
        let slot = match api.stage_result(id, stage).await {
            Ok(Some(envelope)) => StageSlot::Available(envelope),
            Ok(None) => {
                debug!(video_id = %id, %stage, "stage result not available");
                StageSlot::NotAvailable
            }
            Err(e) => {
                warn!(video_id = %id, %stage, error = %e, "stage result fetch failed");
                StageSlot::NotAvailable
            }
        };
        (stage, slot)
    });
    futures::future::join_all(fetches).await.into_iter().collect()
}

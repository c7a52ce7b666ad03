use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::PipelineApi;
use crate::model::{DetailedProgress, Job};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// One rendered frame of job state. `job` and `details` always come
/// from the same fetch batch, so a snapshot never pairs a stale detail
/// list with a fresh coarse status or vice versa.
#[derive(Debug, Clone, Default)]
pub struct PollSnapshot {
    pub job: Option<Job>,
    pub details: Option<DetailedProgress>,
    /// Soft error from the latest cycle; polling continues past it.
    pub error: Option<String>,
    pub cycle: u64,
}

/// Polls coarse status and detailed progress for one job until it
/// reaches a terminal stage, publishing snapshots over a watch channel.
pub struct JobPoller {
    api: Arc<dyn PipelineApi>,
    job_id: String,
    interval: Duration,
}

impl JobPoller {
    pub fn new(api: Arc<dyn PipelineApi>, job_id: impl Into<String>) -> Self {
        Self {
            api,
            job_id: job_id.into(),
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the poll task. The returned handle owns the task's
    /// cancellation token; dropping it tears the poller down.
    pub fn spawn(self) -> PollerHandle {
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(PollSnapshot::default());

        let task_token = token.clone();
        let task = tokio::spawn(async move {
            poll_loop(self.api, self.job_id, self.interval, task_token, tx).await;
        });

        PollerHandle {
            token,
            updates: rx,
            task: Some(task),
        }
    }
}

pub struct PollerHandle {
    token: CancellationToken,
    updates: watch::Receiver<PollSnapshot>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PollerHandle {
    pub fn updates(&self) -> watch::Receiver<PollSnapshot> {
        self.updates.clone()
    }

    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Wait for the poll task to finish (terminal status or stop()).
    pub async fn wait(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn poll_loop(
    api: Arc<dyn PipelineApi>,
    job_id: String,
    interval: Duration,
    token: CancellationToken,
    tx: watch::Sender<PollSnapshot>,
) {
    let subscription = uuid::Uuid::new_v4();
    let mut cycle: u64 = 0;
    let mut last_job: Option<Job> = None;

    loop {
        if token.is_cancelled() {
            return;
        }
        cycle += 1;

        // One batch per cycle: both fetches settle together before
        // anything is applied.
        let (job_result, details_result) =
            tokio::join!(api.fetch_job(&job_id), api.fetch_details(&job_id));

        // A batch that settles after teardown must be a no-op.
        if token.is_cancelled() {
            return;
        }

        let mut snapshot = PollSnapshot {
            cycle,
            ..PollSnapshot::default()
        };

        let terminal = match job_result {
            Ok(job) if job.job_id != job_id => {
                tracing::warn!(
                    %subscription,
                    expected = %job_id,
                    got = %job.job_id,
                    "discarding status response for mismatched job id"
                );
                snapshot.error = Some("mismatched job id in status response".to_owned());
                false
            }
            Ok(job) => {
                let terminal = job.status.is_terminal();
                last_job = Some(job);
                // Details ride with the coarse status they were fetched
                // alongside. A snapshot never carries this batch's
                // details under an earlier batch's status, so on a
                // failed or discarded coarse fetch the batch's details
                // are dropped with it.
                match details_result {
                    Ok(details) => snapshot.details = Some(details),
                    // Non-fatal: the snapshot simply carries no detail.
                    Err(err) => {
                        tracing::debug!(%subscription, job_id, %err, "detail fetch failed; continuing");
                    }
                }
                terminal
            }
            Err(err) => {
                tracing::debug!(%subscription, job_id, %err, "status fetch failed; will retry");
                snapshot.error = Some(err.to_string());
                false
            }
        };
        // Fatal for the cycle only: keep the last known status visible.
        snapshot.job = last_job.clone();

        if tx.send(snapshot).is_err() {
            return;
        }

        if terminal {
            tracing::info!(%subscription, job_id, "job reached terminal stage; polling stopped");
            return;
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

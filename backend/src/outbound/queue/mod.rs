//! In-process job queue backed by a bounded Tokio channel.
//!
//! [`TokioJobQueue`] implements the `JobDispatcher` port. Dispatch never
//! waits: a full channel rejects the job and a closed one reports the queue
//! as unavailable, so request paths stay non-blocking. [`JobRunner`] drains
//! the channel and runs every job on its own task inside a `tracing` span,
//! which is where promotion and recomputation outcomes are logged.
//!
//! The two halves are built separately because the services that schedule
//! jobs are usually the same services the runner executes.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{Instrument, debug, error, info_span, warn};

use crate::domain::ports::{
    BackgroundJob, JobDispatchError, JobDispatcher, RatingRecompute, WaitlistPromotion,
};
use crate::domain::{PromotionFailure, PromotionOutcome};

/// Sending half of the job channel.
#[derive(Debug, Clone)]
pub struct TokioJobQueue {
    sender: mpsc::Sender<BackgroundJob>,
}

/// Receiving half of the job channel, consumed by [`JobRunner::spawn`].
#[derive(Debug)]
pub struct JobReceiver {
    receiver: mpsc::Receiver<BackgroundJob>,
}

impl TokioJobQueue {
    /// Create a queue holding at most `capacity` pending jobs.
    ///
    /// A capacity of zero is raised to one, as Tokio channels require.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, JobReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, JobReceiver { receiver })
    }
}

impl JobDispatcher for TokioJobQueue {
    fn dispatch(&self, job: BackgroundJob) -> Result<(), JobDispatchError> {
        self.sender.try_send(job).map_err(|err| match err {
            mpsc::error::TrySendError::Full(dropped) => {
                JobDispatchError::rejected(format!("job queue is full; dropped {dropped}"))
            }
            mpsc::error::TrySendError::Closed(dropped) => {
                JobDispatchError::unavailable(format!("job queue is closed; dropped {dropped}"))
            }
        })?;
        debug!(job = %job, "background job queued");
        Ok(())
    }
}

/// Executes queued jobs against the promotion and rating services.
#[derive(Clone)]
pub struct JobRunner {
    promotion: Arc<dyn WaitlistPromotion>,
    ratings: Arc<dyn RatingRecompute>,
}

impl JobRunner {
    /// Build a runner over the services that execute jobs.
    #[must_use]
    pub const fn new(promotion: Arc<dyn WaitlistPromotion>, ratings: Arc<dyn RatingRecompute>) -> Self {
        Self { promotion, ratings }
    }

    /// Start consuming `jobs` on the current Tokio runtime.
    #[must_use]
    pub fn spawn(self, jobs: JobReceiver) -> JobRunnerHandle {
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(self.run(jobs.receiver, stopped));
        JobRunnerHandle {
            stop: Some(stop),
            task,
        }
    }

    async fn run(
        self,
        mut receiver: mpsc::Receiver<BackgroundJob>,
        mut stop: oneshot::Receiver<()>,
    ) {
        let mut in_flight = JoinSet::new();
        let mut closing = false;
        loop {
            tokio::select! {
                next = receiver.recv() => match next {
                    Some(job) => self.start(&mut in_flight, job),
                    None => break,
                },
                _ = &mut stop, if !closing => {
                    // Buffered jobs are still delivered after close.
                    closing = true;
                    receiver.close();
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    log_join(joined);
                }
            }
        }
        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        debug!("job runner stopped");
    }

    fn start(&self, in_flight: &mut JoinSet<()>, job: BackgroundJob) {
        let span = info_span!("background_job", job = job.kind(), event_id = %job.event_id());
        let runner = self.clone();
        in_flight.spawn(async move { runner.execute(job).await }.instrument(span));
    }

    async fn execute(&self, job: BackgroundJob) {
        match job {
            BackgroundJob::PromoteWaitlist { event_id } => {
                let outcome = self.promotion.promote_next(event_id).await;
                debug!(%event_id, outcome = outcome_label(&outcome), "promotion job finished");
            }
            BackgroundJob::RecomputeRating { event_id } => {
                match self.ratings.recompute(event_id).await {
                    Ok(average) => debug!(%event_id, average, "rating job finished"),
                    Err(err) => {
                        error!(
                            %event_id,
                            error = %err,
                            outcome = "failed",
                            "rating recompute failed"
                        );
                    }
                }
            }
        }
    }
}

fn outcome_label(outcome: &PromotionOutcome) -> &'static str {
    match outcome {
        PromotionOutcome::Promoted(_) => "promoted",
        PromotionOutcome::NoOneWaiting => "no_one_waiting",
        PromotionOutcome::Failed(PromotionFailure::Store(_)) => "store_failure",
        PromotionOutcome::Failed(_) => "aborted",
    }
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        warn!(error = %err, "background job task did not complete");
    }
}

/// Control handle for a running [`JobRunner`].
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) also
/// stops intake; the runner then finishes in the background.
#[derive(Debug)]
pub struct JobRunnerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl JobRunnerHandle {
    /// Stop accepting jobs, run everything already queued and wait for
    /// in-flight jobs to finish.
    ///
    /// # Errors
    ///
    /// Returns the [`JoinError`] of the runner task if it panicked or was
    /// cancelled.
    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        if let Some(stop) = self.stop.take()
            && stop.send(()).is_err()
        {
            debug!("job runner already stopped");
        }
        self.task.await
    }
}

//! Generation queue and its single-worker driver.
//!
//! The queue is the only shared mutable state. Every mutation happens under
//! one `std::sync::Mutex`, which is never held across an `.await`; the
//! backend call is the only place the driver suspends.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gq_core::{
    compute_fingerprint, resolve_parameters, resolve_seed, GenerationParams, Request, RequestField,
};
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::artifact::Artifact;
use crate::backend::Backend;
use crate::error::{BackendError, QueueError};
use crate::events::{EventBus, QueueEvent};
use crate::job::{Job, JobId, JobStatus};

/// How long shutdown waits for the backend to acknowledge an interrupt
const INTERRUPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of a successful call to [`Scheduler::enqueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued(JobId),
    /// An identical request is already in the queue; nothing was added
    Duplicate,
}

impl Enqueued {
    pub fn job_id(&self) -> Option<JobId> {
        match self {
            Self::Queued(id) => Some(*id),
            Self::Duplicate => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: usize,
    pub in_flight: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl QueueCounts {
    pub fn active(&self) -> usize {
        self.pending + self.in_flight
    }

    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Default)]
struct QueueState {
    jobs: Vec<Job>,
    shut_down: bool,
}

impl QueueState {
    fn find_mut(&mut self, job_id: JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id() == job_id)
    }

    fn has_active(&self) -> bool {
        self.jobs.iter().any(|job| job.status().is_active())
    }
}

struct Shared {
    queue: Mutex<QueueState>,
    /// Fired on enqueue; the driver sleeps on it when idle
    wake: Notify,
    /// Fired whenever the driver runs out of work
    idle: Notify,
    events: EventBus,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the oldest pending job, if nothing is in flight
    fn start_next(&self) -> Option<(JobId, GenerationParams)> {
        let mut state = self.lock();
        if state.shut_down {
            return None;
        }
        if state.jobs.iter().any(|job| job.status() == JobStatus::InFlight) {
            return None;
        }

        let job = state
            .jobs
            .iter_mut()
            .find(|job| job.status() == JobStatus::Pending)?;
        let job_id = job.id();
        if !job.start() {
            error!(%job_id, status = job.status().label(), "Refusing to start job");
            return None;
        }

        let params = resolve_parameters(job.request(), job.resolved_seed());
        info!(%job_id, seed = params.seed, prompt = %job.request().prompt, "Starting job");
        self.events.publish(QueueEvent::JobStarted(job_id));

        Some((job_id, params))
    }

    fn finish(&self, job_id: JobId, result: Result<Artifact, BackendError>) {
        let mut state = self.lock();
        let Some(job) = state.find_mut(job_id) else {
            error!(%job_id, "In-flight job vanished from the queue");
            return;
        };

        match result {
            Ok(artifact) => {
                let bytes = artifact.len();
                if !job.succeed(artifact) {
                    let status = job.status().label();
                    error!(%job_id, status, "Refusing to mark job succeeded");
                    return;
                }
                info!(%job_id, bytes, "Job complete");
                self.events.publish(QueueEvent::JobSucceeded(job_id));
            }
            Err(e) => {
                let error = e.to_string();
                if !job.fail(error.clone()) {
                    let status = job.status().label();
                    error!(%job_id, status, "Refusing to mark job failed");
                    return;
                }
                warn!(%job_id, error = %e, "Job failed");
                self.events.publish(QueueEvent::JobFailed { job_id, error });
            }
        }
    }
}

/// Owns the job queue and drives it against a single-concurrency backend.
///
/// Created with [`Scheduler::new`] inside a tokio runtime, shared as
/// `Arc<Scheduler>`, stopped with [`Scheduler::shutdown`]. All methods except
/// `shutdown` and `wait_idle` are synchronous and never wait on the backend.
pub struct Scheduler {
    shared: Arc<Shared>,
    shutdown_tx: watch::Sender<bool>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(backend: Arc<dyn Backend>, events: EventBus) -> Self {
        let shared = Arc::new(Shared {
            queue: Mutex::new(QueueState::default()),
            wake: Notify::new(),
            idle: Notify::new(),
            events,
        });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let driver = tokio::spawn(drive(shared.clone(), backend, shutdown_rx));

        Self {
            shared,
            shutdown_tx,
            driver: Mutex::new(Some(driver)),
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<QueueEvent> {
        self.shared.events.subscribe()
    }

    /// Add a job for `request` at the tail of the queue.
    ///
    /// Unless `bypass_dedup` is set, a request whose fingerprint matches any
    /// job already in the queue (whatever its status) is dropped and
    /// [`Enqueued::Duplicate`] is returned.
    pub fn enqueue(&self, request: Request, bypass_dedup: bool) -> Result<Enqueued, QueueError> {
        let fingerprint = compute_fingerprint(&request);
        let resolved_seed = resolve_seed(&request.seed)?;

        let mut state = self.shared.lock();
        if state.shut_down {
            return Err(QueueError::ShutDown);
        }

        if !bypass_dedup && state.jobs.iter().any(|job| job.fingerprint() == &fingerprint) {
            debug!(prompt = %request.prompt, seed = %request.seed, "Dropping duplicate submission");
            return Ok(Enqueued::Duplicate);
        }

        let job = Job::new(request, resolved_seed);
        let job_id = job.id();
        info!(%job_id, seed = resolved_seed, position = state.jobs.len(), "Job queued");
        state.jobs.push(job);
        self.shared.events.publish(QueueEvent::JobQueued(job_id));
        drop(state);

        self.shared.wake.notify_one();
        Ok(Enqueued::Queued(job_id))
    }

    /// Remove a job that is not currently being generated
    pub fn delete(&self, job_id: JobId) -> Result<(), QueueError> {
        let mut state = self.shared.lock();
        let index = state
            .jobs
            .iter()
            .position(|job| job.id() == job_id)
            .ok_or(QueueError::NotFound(job_id))?;

        if state.jobs[index].status() == JobStatus::InFlight {
            return Err(QueueError::Conflict(job_id));
        }

        state.jobs.remove(index);
        info!(%job_id, "Job deleted");
        self.shared.events.publish(QueueEvent::JobDeleted(job_id));
        Ok(())
    }

    /// Queue a brand-new job with the same request, skipping dedup.
    /// The original job stays where it is.
    pub fn retry(&self, job_id: JobId) -> Result<Enqueued, QueueError> {
        let request = self.request_of(job_id)?;
        debug!(%job_id, "Retrying job");
        self.enqueue(request, true)
    }

    /// Queue a variation of an existing job, e.g. bumped quality or a fresh seed
    pub fn derive(
        &self,
        job_id: JobId,
        overrides: impl IntoIterator<Item = RequestField>,
    ) -> Result<Enqueued, QueueError> {
        let mut request = self.request_of(job_id)?;
        for field in overrides {
            request.set(field);
        }
        self.enqueue(request, false)
    }

    /// Remove every succeeded or failed job. Returns how many were removed.
    pub fn clear_completed(&self) -> usize {
        let mut state = self.shared.lock();
        let (completed, kept): (Vec<Job>, Vec<Job>) = std::mem::take(&mut state.jobs)
            .into_iter()
            .partition(|job| job.status().is_complete());
        state.jobs = kept;

        for job in &completed {
            self.shared.events.publish(QueueEvent::JobDeleted(job.id()));
        }
        info!(removed = completed.len(), "Cleared completed jobs");
        completed.len()
    }

    /// Ordered copy of the queue for display
    pub fn snapshot(&self) -> Vec<Job> {
        self.shared.lock().jobs.clone()
    }

    pub fn job(&self, job_id: JobId) -> Option<Job> {
        self.shared.lock().jobs.iter().find(|job| job.id() == job_id).cloned()
    }

    pub fn counts(&self) -> QueueCounts {
        let state = self.shared.lock();
        let mut counts = QueueCounts::default();
        for job in &state.jobs {
            match job.status() {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::InFlight => counts.in_flight += 1,
                JobStatus::Succeeded => counts.succeeded += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    /// Resolves once nothing is pending or in flight, or the scheduler is shut down
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.shared.lock();
                if state.shut_down || !state.has_active() {
                    return;
                }
            }

            notified.await;
        }
    }

    /// Stop the driver.
    ///
    /// An outstanding backend call is abandoned, the backend is asked to
    /// interrupt, and the in-flight job is marked failed. Pending jobs stay
    /// pending. Later enqueues fail with [`QueueError::ShutDown`].
    pub async fn shutdown(&self) {
        self.shared.lock().shut_down = true;
        // Err only means the driver already exited.
        let _ = self.shutdown_tx.send(true);

        let driver = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(driver) = driver {
            if let Err(e) = driver.await {
                error!(error = %e, "Scheduler driver panicked");
            }
        }

        self.shared.idle.notify_waiters();
        info!("Scheduler shut down");
    }

    fn request_of(&self, job_id: JobId) -> Result<Request, QueueError> {
        self.shared
            .lock()
            .jobs
            .iter()
            .find(|job| job.id() == job_id)
            .map(|job| job.request().clone())
            .ok_or(QueueError::NotFound(job_id))
    }
}

async fn drive(
    shared: Arc<Shared>,
    backend: Arc<dyn Backend>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!("Scheduler driver started");

    loop {
        let (job_id, params) = match shared.start_next() {
            Some(next) => next,
            None => {
                shared.idle.notify_waiters();
                tokio::select! {
                    _ = shared.wake.notified() => {}
                    _ = shutdown.changed() => break,
                }
                continue;
            }
        };

        // A panicking backend only takes down its own task.
        let mut call = {
            let backend = backend.clone();
            tokio::spawn(async move { backend.generate(&params).await })
        };

        let result = tokio::select! {
            joined = &mut call => Some(
                joined.unwrap_or_else(|e| Err(BackendError::Panicked(e.to_string()))),
            ),
            _ = shutdown.changed() => None,
        };

        match result {
            Some(result) => shared.finish(job_id, result),
            None => {
                info!(%job_id, "Abandoning in-flight job on shutdown");
                call.abort();
                match tokio::time::timeout(INTERRUPT_TIMEOUT, backend.interrupt()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!(error = %e, "Failed to interrupt backend"),
                    Err(_) => {
                        error!(timeout = ?INTERRUPT_TIMEOUT, "Backend did not acknowledge interrupt")
                    }
                }
                shared.finish(job_id, Err(BackendError::Interrupted));
                break;
            }
        }
    }

    debug!("Scheduler driver stopped");
}

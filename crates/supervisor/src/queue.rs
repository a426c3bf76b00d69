// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Queue & Supervisor: a single FIFO behind one lock, and the single-runner
//! task loop that drains it through the `Executor`.
//!
//! Queue mutations are serialized by one `parking_lot::Mutex`; publishing
//! the resulting event always happens after the guard is dropped, so
//! subscribers never observe a mutation mid-lock.

use crate::error::SupervisorError;
use crate::registry::JobRegistry;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::{Clock, Job, JobError, JobId, JobStatus, TranscriptionSettings};
use tj_engine::{Executor, Interrupt, RunOutcome};
use tj_hub::{signal_event, GlobalHub, JobHub};
use tj_storage::ArtifactStore;
use tokio::sync::Notify;

/// `prioritize`'s two modes: `gentle` only reorders the queue, `force` also
/// preempts whatever is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrioritizeMode {
    Gentle,
    Force,
}

struct RunningJob {
    id: JobId,
    interrupt: Interrupt,
    /// Set by a `cancel(delete_data=true)` that arrived while this job was
    /// running; acted on once `run_forever` observes the job's outcome.
    pending_delete: bool,
}

#[derive(Default)]
struct QueueState {
    order: VecDeque<JobId>,
    running: Option<RunningJob>,
}

impl QueueState {
    fn queued_ids(&self) -> Vec<JobId> {
        self.order.iter().copied().collect()
    }
}

/// Owns the job queue and the single background runner that drains it one
/// job at a time. One `Executor` instance backs every run — this is what
/// makes "single runner" hold: ASR/VAD/alignment models are loaded once,
/// process-wide, not per job.
pub struct Supervisor<M, V, R, L, P, C> {
    registry: Arc<JobRegistry>,
    executor: Arc<Executor<M, V, R, L, P, C>>,
    store: Arc<ArtifactStore>,
    job_hub: Arc<JobHub>,
    global_hub: Arc<GlobalHub>,
    clock: C,
    state: Mutex<QueueState>,
    notify: Notify,
}

impl<M, V, R, L, P, C> Supervisor<M, V, R, L, P, C>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        executor: Executor<M, V, R, L, P, C>,
        registry: Arc<JobRegistry>,
        store: Arc<ArtifactStore>,
        job_hub: Arc<JobHub>,
        global_hub: Arc<GlobalHub>,
        clock: C,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry,
            executor: Arc::new(executor),
            store,
            job_hub,
            global_hub,
            clock,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
        })
    }

    /// Rebuild the Registry from disk and, if `auto_resume` is set, enqueue
    /// every `interrupted` job (at the queue head, preserving its
    /// checkpoint) whose last recorded error is still auto-retryable. Call
    /// once at startup, before [`Self::spawn_runner`].
    pub fn recover(&self, auto_resume: bool) -> Result<(), SupervisorError> {
        let jobs = self.registry.load_from_disk()?;
        if !auto_resume {
            return Ok(());
        }
        let mut state = self.state.lock();
        for job in jobs.iter().filter(|j| j.status == JobStatus::Interrupted) {
            let retryable = job.last_error.as_ref().map(JobError::auto_retryable).unwrap_or(true);
            if retryable {
                state.order.push_front(job.id);
            }
        }
        drop(state);
        self.notify.notify_one();
        self.publish_queue_update();
        Ok(())
    }

    /// Spawn the single background runner. Returns a handle the caller can
    /// `abort()` on shutdown; the loop otherwise runs forever.
    pub fn spawn_runner(self: &Arc<Self>) -> tokio::task::JoinHandle<()>
    where
        M: 'static,
        V: 'static,
        R: 'static,
        L: 'static,
        P: 'static,
        C: 'static,
    {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_forever().await })
    }

    async fn run_forever(self: Arc<Self>) {
        loop {
            let (job_id, interrupt) = self.wait_for_next_job().await;

            let mut job = match self.registry.get(job_id) {
                Some(job) => job,
                None => {
                    tracing::error!(%job_id, "supervisor: queued job missing from registry");
                    self.finish_slot(job_id, None);
                    continue;
                }
            };

            let paths = tj_core::JobPaths::new(self.store.root(), job.id, &job.filename);
            let outcome = self.executor.run(&mut job, &paths, &interrupt).await;
            self.registry.sync(job.clone());

            let pending_delete = {
                let state = self.state.lock();
                state.running.as_ref().filter(|r| r.id == job_id).map(|r| r.pending_delete).unwrap_or(false)
            };

            match outcome {
                Ok(RunOutcome::Completed) => {
                    self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
                }
                Ok(RunOutcome::Canceled) => {
                    self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
                    if pending_delete {
                        self.delete_job_data(job.id);
                    }
                }
                Ok(RunOutcome::Paused) => {
                    self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
                }
                Err(error) => {
                    tracing::warn!(%job_id, %error, "supervisor: job run failed");
                    self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
                }
            }

            self.finish_slot(job_id, None);
        }
    }

    /// Block until a job is available to run and the runner slot is free,
    /// then atomically claim both. Returns the claimed job id and a fresh
    /// `Interrupt` handle that `pause`/`cancel`/`prioritize(force)` can
    /// signal through.
    async fn wait_for_next_job(&self) -> (JobId, Interrupt) {
        loop {
            {
                let mut state = self.state.lock();
                if state.running.is_none() {
                    if let Some(id) = state.order.pop_front() {
                        let interrupt = Interrupt::new();
                        state.running = Some(RunningJob { id, interrupt: interrupt.clone(), pending_delete: false });
                        drop(state);
                        self.publish_queue_update();
                        return (id, interrupt);
                    }
                }
            }
            self.notify.notified().await;
        }
    }

    fn finish_slot(&self, job_id: JobId, _reason: Option<&str>) {
        {
            let mut state = self.state.lock();
            if state.running.as_ref().map(|r| r.id) == Some(job_id) {
                state.running = None;
            }
        }
        self.notify.notify_one();
        self.publish_queue_update();
    }

    fn publish_queue_update(&self) {
        let state = self.state.lock();
        let queued_ids = state.queued_ids();
        let running_id = state.running.as_ref().map(|r| r.id);
        drop(state);
        self.global_hub.publish(tj_core::GlobalEvent::QueueUpdate { queued_ids, running_id });
    }

    /// Admission: `job_id` must already exist in the Registry (created via
    /// upload/create-job in `created` status). Freeze
    /// `settings` onto it, move it to `queued`, and append it to the
    /// queue's tail.
    pub fn start(&self, job_id: JobId, settings: TranscriptionSettings) -> Result<Job, SupervisorError> {
        let now = self.clock.epoch_ms();
        let job = self.registry.mutate(job_id, move |j| j.start(settings, now))?;
        {
            let mut state = self.state.lock();
            state.order.push_back(job_id);
        }
        self.notify.notify_one();
        self.publish_queue_update();
        Ok(job)
    }

    /// Replace the queue order. `order` must be exactly a permutation of the
    /// currently-queued ids (the running job, if any, is not part of this
    /// set and is unaffected). A no-op reorder (same order) does not emit a
    /// `queue_update`.
    pub fn reorder(&self, order: Vec<JobId>) -> Result<(), SupervisorError> {
        let mut state = self.state.lock();
        let current: Vec<JobId> = state.order.iter().copied().collect();

        let current_set: std::collections::HashSet<JobId> = current.iter().copied().collect();
        let wanted_set: std::collections::HashSet<JobId> = order.iter().copied().collect();
        if current.len() != order.len() || current_set != wanted_set {
            return Err(SupervisorError::InvalidQueueOrder);
        }

        if current == order {
            return Ok(());
        }

        state.order = order.into_iter().collect();
        drop(state);
        self.publish_queue_update();
        Ok(())
    }

    /// `gentle` moves `job_id` to the queue head,
    /// leaving any running job alone; a job already at the head is a no-op.
    /// `force` additionally pauses the running job first (same protocol as
    /// a user pause) so the prioritized job runs next; the preempted job is
    /// re-enqueued at the *tail*, requiring a deliberate follow-up action to
    /// reprioritize it rather than silently resuming its old place.
    pub fn prioritize(&self, job_id: JobId, mode: PrioritizeMode) -> Result<(), SupervisorError> {
        let mut state = self.state.lock();
        if !state.order.contains(&job_id) {
            return Err(SupervisorError::NotQueued(job_id));
        }

        if state.order.front() == Some(&job_id) {
            // Already at the head; `force` may still need to preempt a
            // running job, so fall through instead of returning early.
        } else {
            state.order.retain(|id| *id != job_id);
            state.order.push_front(job_id);
        }

        let preempt = if mode == PrioritizeMode::Force {
            state.running.as_ref().map(|r| (r.id, r.interrupt.clone()))
        } else {
            None
        };
        drop(state);

        if let Some((running_id, interrupt)) = preempt {
            // The running job's own poll point will persist `paused` and
            // publish the signal; we only need to requeue it once the
            // runner slot frees up.
            interrupt.request_pause();
            let mut state = self.state.lock();
            state.order.push_back(running_id);
            drop(state);
        }

        self.publish_queue_update();
        Ok(())
    }

    /// Pause `job_id`. If it's running, set its interrupt flag (the
    /// Executor persists the `paused` status itself on its next poll
    /// point). If it's only queued, transition it directly — there is no
    /// runner to interrupt.
    pub fn pause(&self, job_id: JobId) -> Result<(), SupervisorError> {
        let running_interrupt = {
            let state = self.state.lock();
            state.running.as_ref().filter(|r| r.id == job_id).map(|r| r.interrupt.clone())
        };

        if let Some(interrupt) = running_interrupt {
            interrupt.request_pause();
            return Ok(());
        }

        let was_queued = {
            let mut state = self.state.lock();
            let was_queued = state.order.iter().any(|id| *id == job_id);
            state.order.retain(|id| *id != job_id);
            was_queued
        };
        if !was_queued {
            return Err(SupervisorError::NotQueued(job_id));
        }

        let now = self.clock.epoch_ms();
        let job = self.registry.mutate(job_id, move |j| {
            j.status = JobStatus::Paused;
            j.updated_at_epoch_ms = now;
        })?;
        self.job_hub.publish(job_id, signal_event(JobStatus::Paused, "paused by request"));
        self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
        self.publish_queue_update();
        Ok(())
    }

    /// Resume a paused job: append it to the queue tail.
    pub fn resume(&self, job_id: JobId) -> Result<(), SupervisorError> {
        let now = self.clock.epoch_ms();
        let job = self.registry.mutate(job_id, move |j| {
            j.status = JobStatus::Queued;
            j.updated_at_epoch_ms = now;
        })?;
        {
            let mut state = self.state.lock();
            state.order.push_back(job_id);
        }
        self.notify.notify_one();
        self.job_hub.publish(job_id, tj_hub::initial_state_event(&job));
        self.publish_queue_update();
        Ok(())
    }

    /// Cancel `job_id`. Running jobs are interrupted cooperatively; queued
    /// jobs transition directly. `delete_data` additionally removes the
    /// job's working directory once it has reached a terminal state.
    pub fn cancel(&self, job_id: JobId, delete_data: bool) -> Result<(), SupervisorError> {
        let running_interrupt = {
            let mut state = self.state.lock();
            state.running.as_mut().filter(|r| r.id == job_id).map(|r| {
                if delete_data {
                    r.pending_delete = true;
                }
                r.interrupt.clone()
            })
        };

        if let Some(interrupt) = running_interrupt {
            interrupt.request_cancel();
            if delete_data {
                tracing::debug!(%job_id, "supervisor: data deletion deferred until the run exits");
            }
            return Ok(());
        }

        {
            let mut state = self.state.lock();
            state.order.retain(|id| *id != job_id);
        }

        let job = self.registry.mutate(job_id, |j| {
            j.mark_terminal(JobStatus::Canceled, self.clock.epoch_ms());
        })?;
        self.job_hub.publish(job_id, signal_event(JobStatus::Canceled, "canceled by request"));
        self.global_hub.publish(tj_core::GlobalEvent::JobStatus { id: job.id, status: job.status });
        self.publish_queue_update();

        if delete_data {
            self.delete_job_data(job_id);
        }
        Ok(())
    }

    /// Remove a canceled job's working directory and its `job_index.json`
    /// entry. Best-effort: logs and continues on failure rather than
    /// returning an error, since the cancel itself has already succeeded.
    fn delete_job_data(&self, job_id: JobId) {
        let dir = self.store.job_dir(job_id);
        if let Err(error) = std::fs::remove_dir_all(&dir) {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(%job_id, %error, "supervisor: failed to remove job directory");
            }
        }
        if let Err(error) = self.store.deregister_input(job_id) {
            tracing::warn!(%job_id, %error, "supervisor: failed to deregister job from index");
        }
    }

    pub fn queued_ids(&self) -> Vec<JobId> {
        self.state.lock().queued_ids()
    }

    pub fn running_id(&self) -> Option<JobId> {
        self.state.lock().running.as_ref().map(|r| r.id)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

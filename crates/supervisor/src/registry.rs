// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! The Job Registry: an in-memory `Job` snapshot cache backed by the
//! Artifact Store, plus the startup scan that rebuilds it.

use crate::error::SupervisorError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tj_core::{Job, JobId, JobStatus};
use tj_storage::ArtifactStore;

/// Owns the authoritative in-memory view of every known job. Mutations
/// persist to the Artifact Store before the snapshot is handed back to the
/// caller; publishing the resulting event is the caller's job, done outside
/// the lock, since only the caller knows which event the transition
/// warrants.
pub struct JobRegistry {
    store: Arc<ArtifactStore>,
    jobs: RwLock<HashMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store, jobs: RwLock::new(HashMap::new()) }
    }

    pub fn get(&self, id: JobId) -> Option<Job> {
        self.jobs.read().get(&id).cloned()
    }

    pub fn list(&self) -> Vec<Job> {
        self.jobs.read().values().cloned().collect()
    }

    /// Persist a brand-new job (status `created`/`queued`) and add it to the
    /// cache.
    pub fn insert_new(&self, job: Job) -> Result<(), SupervisorError> {
        self.store.save_state(&job)?;
        self.jobs.write().insert(job.id, job);
        Ok(())
    }

    /// Apply `f` to the cached job, persist the result, and return the new
    /// snapshot. The write lock is held only across the in-memory mutation;
    /// the I/O happens after it is released.
    pub fn mutate(&self, id: JobId, f: impl FnOnce(&mut Job)) -> Result<Job, SupervisorError> {
        let snapshot = {
            let mut jobs = self.jobs.write();
            let job = jobs.get_mut(&id).ok_or(SupervisorError::JobNotFound(id))?;
            f(job);
            job.clone()
        };
        self.store.save_state(&snapshot)?;
        Ok(snapshot)
    }

    /// Overwrite the cached snapshot with one the caller already persisted
    /// (used after an `Executor` run, which writes `state.json` itself on
    /// every phase transition).
    pub fn sync(&self, job: Job) {
        self.jobs.write().insert(job.id, job);
    }

    /// Rebuild the cache from disk. Any job found
    /// `processing` means the previous run crashed mid-job; reclassify it
    /// `interrupted` and persist the correction before anyone observes it.
    /// Returns every job now in the cache.
    pub fn load_from_disk(&self) -> Result<Vec<Job>, SupervisorError> {
        let mut jobs = self.store.scan_jobs()?;
        for job in &mut jobs {
            if job.status == JobStatus::Processing {
                job.status = JobStatus::Interrupted;
                self.store.save_state(job)?;
            }
        }
        let mut cache = self.jobs.write();
        cache.clear();
        for job in &jobs {
            cache.insert(job.id, job.clone());
        }
        Ok(jobs)
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! The Artifact Store: on-disk layout under a configurable root.
//!
//! ```text
//! jobs/<job_id>/
//!   state.json
//!   checkpoint.json
//!   audio.wav
//!   vocals.wav
//!   subtitles.srt
//!   thumbnail.jpg
//!   peaks.json
//! input/
//! job_index.json
//! ```

use crate::atomic::{write_atomic, write_atomic_with_backup};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tj_core::{Checkpoint, Job, JobId};

#[derive(Debug, Error)]
pub enum ArtifactStoreError {
    #[error("I/O error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("malformed JSON at {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
    #[error("job {0} has no state.json")]
    NotFound(JobId),
}

impl ArtifactStoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    fn json(path: &Path, source: serde_json::Error) -> Self {
        Self::Json { path: path.to_path_buf(), source }
    }
}

/// Root-relative path helpers plus read/write operations for every artifact
/// kind. Cheap to clone (just a `PathBuf`); intended to be
/// held behind an `Arc` by the Registry and Executor.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn jobs_dir(&self) -> PathBuf {
        self.root.join("jobs")
    }

    pub fn input_dir(&self) -> PathBuf {
        self.root.join("input")
    }

    pub fn job_dir(&self, id: JobId) -> PathBuf {
        self.jobs_dir().join(id.as_str())
    }

    pub fn state_path(&self, id: JobId) -> PathBuf {
        self.job_dir(id).join("state.json")
    }

    pub fn checkpoint_path(&self, id: JobId) -> PathBuf {
        self.job_dir(id).join("checkpoint.json")
    }

    pub fn job_index_path(&self) -> PathBuf {
        self.root.join("job_index.json")
    }

    pub fn save_state(&self, job: &Job) -> Result<(), ArtifactStoreError> {
        let path = self.state_path(job.id);
        let bytes = serde_json::to_vec_pretty(job).map_err(|e| Self::json_err(&path, e))?;
        write_atomic(&path, &bytes).map_err(|e| ArtifactStoreError::io(&path, e))
    }

    pub fn load_state(&self, id: JobId) -> Result<Job, ArtifactStoreError> {
        let path = self.state_path(id);
        if !path.exists() {
            return Err(ArtifactStoreError::NotFound(id));
        }
        let bytes = fs::read(&path).map_err(|e| ArtifactStoreError::io(&path, e))?;
        serde_json::from_slice(&bytes).map_err(|e| Self::json_err(&path, e))
    }

    /// Checkpoints use backup rotation: a corrupt write (caught by
    /// [`Checkpoint::is_consistent`]) can be recovered from `.bak`.
    pub fn save_checkpoint(&self, id: JobId, checkpoint: &Checkpoint) -> Result<(), ArtifactStoreError> {
        let path = self.checkpoint_path(id);
        let bytes = serde_json::to_vec_pretty(checkpoint).map_err(|e| Self::json_err(&path, e))?;
        write_atomic_with_backup(&path, &bytes).map_err(|e| ArtifactStoreError::io(&path, e))
    }

    pub fn load_checkpoint(&self, id: JobId) -> Result<Option<Checkpoint>, ArtifactStoreError> {
        let path = self.checkpoint_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).map_err(|e| ArtifactStoreError::io(&path, e))?;
        serde_json::from_slice(&bytes).map(Some).map_err(|e| Self::json_err(&path, e))
    }

    pub fn load_job_index(&self) -> Result<IndexMap<JobId, PathBuf>, ArtifactStoreError> {
        let path = self.job_index_path();
        if !path.exists() {
            return Ok(IndexMap::new());
        }
        let bytes = fs::read(&path).map_err(|e| ArtifactStoreError::io(&path, e))?;
        let raw: IndexMap<String, PathBuf> =
            serde_json::from_slice(&bytes).map_err(|e| Self::json_err(&path, e))?;
        Ok(raw.into_iter().map(|(k, v)| (JobId::from_string(k), v)).collect())
    }

    pub fn save_job_index(&self, index: &IndexMap<JobId, PathBuf>) -> Result<(), ArtifactStoreError> {
        let path = self.job_index_path();
        let raw: IndexMap<&str, &Path> =
            index.iter().map(|(k, v)| (k.as_str(), v.as_path())).collect();
        let bytes = serde_json::to_vec_pretty(&raw).map_err(|e| Self::json_err(&path, e))?;
        write_atomic(&path, &bytes).map_err(|e| ArtifactStoreError::io(&path, e))
    }

    /// Register one job's input path, rewriting `job_index.json` atomically.
    pub fn register_input(&self, id: JobId, input_path: PathBuf) -> Result<(), ArtifactStoreError> {
        let mut index = self.load_job_index()?;
        index.insert(id, input_path);
        self.save_job_index(&index)
    }

    /// Remove one job's entry from `job_index.json`, rewriting it atomically.
    /// A no-op if `id` isn't present.
    pub fn deregister_input(&self, id: JobId) -> Result<(), ArtifactStoreError> {
        let mut index = self.load_job_index()?;
        if index.shift_remove(&id).is_none() {
            return Ok(());
        }
        self.save_job_index(&index)
    }

    /// Load every `jobs/<id>/state.json` present on disk. Used at startup
    /// to rebuild the in-memory Registry.
    pub fn scan_jobs(&self) -> Result<Vec<Job>, ArtifactStoreError> {
        let dir = self.jobs_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut jobs = Vec::new();
        let entries = fs::read_dir(&dir).map_err(|e| ArtifactStoreError::io(&dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| ArtifactStoreError::io(&dir, e))?;
            if !entry.path().is_dir() {
                continue;
            }
            let state_path = entry.path().join("state.json");
            if !state_path.exists() {
                continue;
            }
            let bytes = fs::read(&state_path).map_err(|e| ArtifactStoreError::io(&state_path, e))?;
            let job: Job = serde_json::from_slice(&bytes).map_err(|e| Self::json_err(&state_path, e))?;
            jobs.push(job);
        }
        Ok(jobs)
    }

    /// Startup integrity sweep: drop `job_index.json` entries whose
    /// input file or job working directory no longer exists. Returns the
    /// ids that were dropped so the caller can log/report them.
    pub fn integrity_sweep(&self) -> Result<IntegritySweepReport, ArtifactStoreError> {
        let mut index = self.load_job_index()?;
        let mut dropped = Vec::new();

        index.retain(|id, input_path| {
            let ok = input_path.exists() && self.job_dir(*id).exists();
            if !ok {
                dropped.push(*id);
            }
            ok
        });

        if !dropped.is_empty() {
            self.save_job_index(&index)?;
        }

        Ok(IntegritySweepReport { dropped })
    }

    fn json_err(path: &Path, source: serde_json::Error) -> ArtifactStoreError {
        ArtifactStoreError::json(path, source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntegritySweepReport {
    pub dropped: Vec<JobId>,
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

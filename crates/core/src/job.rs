// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Job identifier and the per-job state record.

use crate::error::JobError;
use crate::phase::Phase;
use crate::settings::TranscriptionSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a transcription job.
    pub struct JobId("job-");
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Created,
    Queued,
    Processing,
    Paused,
    Finished,
    Failed,
    Canceled,
    /// Found `processing` at startup; eligible for auto-resume.
    Interrupted,
}

crate::simple_display! {
    JobStatus {
        Created => "created",
        Queued => "queued",
        Processing => "processing",
        Paused => "paused",
        Finished => "finished",
        Failed => "failed",
        Canceled => "canceled",
        Interrupted => "interrupted",
    }
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Finished | JobStatus::Failed | JobStatus::Canceled)
    }
}

/// Paths derived from the job id and the configured artifact root. Never
/// persisted directly — recomputed from `root_dir` + `id` on load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPaths {
    pub job_dir: PathBuf,
    pub input_path: PathBuf,
}

impl JobPaths {
    pub fn new(root: &std::path::Path, id: JobId, input_filename: &str) -> Self {
        Self {
            job_dir: root.join("jobs").join(id.as_str()),
            input_path: root.join("input").join(input_filename),
        }
    }

    pub fn state_json(&self) -> PathBuf {
        self.job_dir.join("state.json")
    }

    pub fn checkpoint_json(&self) -> PathBuf {
        self.job_dir.join("checkpoint.json")
    }

    pub fn audio_wav(&self) -> PathBuf {
        self.job_dir.join("audio.wav")
    }

    pub fn vocals_wav(&self) -> PathBuf {
        self.job_dir.join("vocals.wav")
    }

    pub fn subtitles_srt(&self) -> PathBuf {
        self.job_dir.join("subtitles.srt")
    }

    pub fn thumbnail_jpg(&self) -> PathBuf {
        self.job_dir.join("thumbnail.jpg")
    }

    pub fn peaks_json(&self) -> PathBuf {
        self.job_dir.join("peaks.json")
    }
}

/// The unit of work tracked by the Registry, Supervisor, Executor and Hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub filename: String,
    pub title: String,
    pub status: JobStatus,
    pub phase: Phase,
    pub percent: u32,
    pub phase_percent: u32,
    pub message: String,
    /// Frozen at `created -> queued`; `None` before the job has been started.
    pub settings: Option<TranscriptionSettings>,
    pub language: Option<String>,
    /// Structured so crash recovery can call [`JobError::auto_retryable`]
    /// without re-parsing a display string.
    pub last_error: Option<JobError>,
    pub created_at_epoch_ms: u64,
    pub updated_at_epoch_ms: u64,
}

impl Job {
    pub fn new(id: JobId, filename: impl Into<String>, created_at_epoch_ms: u64) -> Self {
        let filename = filename.into();
        Self {
            id,
            title: filename.clone(),
            filename,
            status: JobStatus::Created,
            phase: Phase::Pending,
            percent: 0,
            phase_percent: 0,
            message: String::new(),
            settings: None,
            language: None,
            last_error: None,
            created_at_epoch_ms,
            updated_at_epoch_ms: created_at_epoch_ms,
        }
    }

    /// Freeze settings onto the job and move it to `queued`. Idempotent
    /// guard against re-starting an already-started job is the caller's
    /// responsibility (Supervisor admission logic).
    pub fn start(&mut self, settings: TranscriptionSettings, now_epoch_ms: u64) {
        self.settings = Some(settings);
        self.status = JobStatus::Queued;
        self.updated_at_epoch_ms = now_epoch_ms;
    }

    pub fn mark_terminal(&mut self, status: JobStatus, now_epoch_ms: u64) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.updated_at_epoch_ms = now_epoch_ms;
        if status == JobStatus::Finished {
            self.percent = 100;
        }
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn builder(filename: impl Into<String>) -> JobBuilder {
        JobBuilder { filename: filename.into(), created_at_epoch_ms: 0 }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct JobBuilder {
    filename: String,
    created_at_epoch_ms: u64,
}

#[cfg(any(test, feature = "test-support"))]
impl JobBuilder {
    crate::setters! {
        set { created_at_epoch_ms: u64 }
    }

    pub fn build(self) -> Job {
        Job::new(JobId::new(), self.filename, self.created_at_epoch_ms)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;

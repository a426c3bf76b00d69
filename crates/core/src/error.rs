// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Error taxonomy. These are the *kinds* the Executor classifies
//! phase failures into; each carries enough context to decide retry vs.
//! terminal handling and to populate `Job::last_error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Serialize, Deserialize)]
pub enum JobError {
    #[error("input file missing: {path}")]
    InputMissing { path: String },

    #[error("media decode error: {detail}")]
    MediaDecodeError { detail: String },

    #[error("model load error: {model}: {detail}")]
    ModelLoadError { model: String, detail: String },

    #[error("GPU out of memory during {phase}")]
    GpuOutOfMemory { phase: String },

    #[error("transient I/O error: {detail}")]
    TransientIoError { detail: String },

    #[error("checkpoint corrupt: {detail}")]
    CheckpointCorrupt { detail: String },

    #[error("circuit breaker open")]
    CircuitBreakerOpen,

    #[error("canceled")]
    Canceled,

    #[error("paused")]
    Paused,

    #[error("subscriber too slow, disconnected")]
    SubscriberSlow,
}

impl JobError {
    /// Whether this kind marks the job `failed` outright (vs. a
    /// non-error lifecycle transition like `Canceled`/`Paused`, or a
    /// retryable condition the Executor handles internally).
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            JobError::InputMissing { .. }
                | JobError::MediaDecodeError { .. }
                | JobError::ModelLoadError { .. }
                | JobError::CircuitBreakerOpen
        )
    }

    /// Whether a crash-recovered job carrying this error should be
    /// automatically retried: not retried if `last_error` indicates
    /// an unrecoverable failure.
    pub fn auto_retryable(&self) -> bool {
        !matches!(self, JobError::InputMissing { .. } | JobError::ModelLoadError { .. })
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Errors raised by the Registry and Supervisor.

use thiserror::Error;
use tj_core::JobId;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("job {0} not found")]
    JobNotFound(JobId),

    /// `reorder` was given a set that isn't exactly the currently-queued
    /// ids. The queue is left untouched.
    #[error("reorder must be a permutation of the currently queued job ids")]
    InvalidQueueOrder,

    #[error("job {0} is not queued")]
    NotQueued(JobId),

    #[error("job {0} is not running")]
    NotRunning(JobId),

    #[error(transparent)]
    Storage(#[from] tj_storage::ArtifactStoreError),
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! SRT read/write routes. Write is atomic (tmp + rename),
//! delegated to `tj_storage::write_atomic`.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::{Clock, JobId, JobPaths};

pub async fn get_srt<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
) -> Result<String, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    let paths = JobPaths::new(state.store.root(), id, &job.filename);
    Ok(std::fs::read_to_string(paths.subtitles_srt())?)
}

pub async fn post_srt<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    body: String,
) -> Result<StatusCode, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    // Validate before writing: a malformed upload must never clobber a
    // good subtitles.srt.
    tj_core::srt::parse(&body)?;
    let paths = JobPaths::new(state.store.root(), id, &job.filename);
    tj_storage::write_atomic(&paths.subtitles_srt(), body.as_bytes())?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "srt_tests.rs"]
mod tests;

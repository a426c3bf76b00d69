// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Media Server routes: Range-served video/audio/thumbnail via
//! `tower_http::services::ServeFile`, and lazily-generated, cached
//! waveform peaks.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::{Clock, JobId, JobPaths};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Drive a `ServeFile` service for `path` against the inbound request,
/// preserving its `Range` header so seeking works in the editor.
async fn serve_file(path: std::path::PathBuf, request: Request<axum::body::Body>) -> Result<Response, ApiError> {
    if !path.exists() {
        return Err(ApiError::BadRequest(format!("no such media file: {}", path.display())));
    }
    let (parts, _) = request.into_parts();
    let mut forwarded = Request::new(axum::body::Body::empty());
    *forwarded.method_mut() = parts.method;
    *forwarded.headers_mut() = parts.headers;
    // `ServeFile`'s service is infallible: IO errors become a 500 response
    // rather than a `Service::Error`.
    let response = match ServeFile::new(path).oneshot(forwarded).await {
        Ok(response) => response,
        Err(never) => match never {},
    };
    Ok(response.into_response())
}

fn job_paths<M, V, R, L, P, C>(
    state: &AppState<M, V, R, L, P, C>,
    id: JobId,
) -> Result<(tj_core::Job, JobPaths), ApiError> {
    let job = state.registry.get(id).ok_or(tj_supervisor::SupervisorError::JobNotFound(id))?;
    let paths = JobPaths::new(state.store.root(), id, &job.filename);
    Ok((job, paths))
}

pub async fn video<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    request: Request<axum::body::Body>,
) -> Result<Response, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let (_job, paths) = job_paths(&state, JobId::from_string(id))?;
    serve_file(paths.input_path, request).await
}

pub async fn audio<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    request: Request<axum::body::Body>,
) -> Result<Response, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let (_job, paths) = job_paths(&state, JobId::from_string(id))?;
    serve_file(paths.audio_wav(), request).await
}

pub async fn thumbnail<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    request: Request<axum::body::Body>,
) -> Result<Response, ApiError>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let (_job, paths) = job_paths(&state, JobId::from_string(id))?;
    serve_file(paths.thumbnail_jpg(), request).await
}

#[derive(Deserialize)]
pub struct PeaksQuery {
    pub samples: Option<usize>,
}

/// Generate (or serve cached) waveform peaks: typically 2000 samples, or
/// 10x video duration for long files, whichever is larger.
pub async fn peaks<M, V, R, L, P, C>(
    State(state): State<AppState<M, V, R, L, P, C>>,
    Path(id): Path<String>,
    Query(q): Query<PeaksQuery>,
) -> Result<axum::Json<Vec<f32>>, ApiError>
where
    M: MediaAdapter + Clone,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    let id = JobId::from_string(id);
    let (_job, paths) = job_paths(&state, id)?;

    let cache_path = paths.peaks_json();
    if q.samples.is_none() {
        if let Ok(bytes) = std::fs::read(&cache_path) {
            if let Ok(cached) = serde_json::from_slice::<Vec<f32>>(&bytes) {
                return Ok(axum::Json(cached));
            }
        }
    }

    let duration_sec = state.store.load_checkpoint(id)?.map(|c| c.duration_sec).unwrap_or(0.0);
    let bucket_count = q
        .samples
        .unwrap_or(state.config.default_peaks_samples)
        .max((duration_sec * 10.0) as usize);

    let peaks = state.media.peaks(&paths.audio_wav(), bucket_count).await?;

    if q.samples.is_none() {
        let bytes = serde_json::to_vec(&peaks).unwrap_or_default();
        let _ = tj_storage::write_atomic(&cache_path, &bytes);
    }

    Ok(axum::Json(peaks))
}

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;

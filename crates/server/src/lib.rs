// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tj-server: the HTTP/SSE API surface — axum routes for job
//! admission/control, per-job and global SSE streams, and the Media
//! Server (Range video/audio, peaks, thumbnail, SRT read/write).

pub mod error;
pub mod routes;
pub mod state;

#[cfg(test)]
pub mod test_support;

pub use error::ApiError;
pub use state::{AppState, ServerConfig};

use axum::routing::{get, post};
use axum::Router;
use tj_adapters::{AlignAdapter, AsrAdapter, MediaAdapter, SeparationAdapter, VadAdapter};
use tj_core::Clock;

/// Build the full route table over a generic [`AppState`]. Every
/// handler is registered with an explicit turbofish, the same pattern
/// `Executor`/`Supervisor` use to thread the five adapter traits plus
/// `Clock` through generically rather than via trait objects.
pub fn router<M, V, R, L, P, C>(state: AppState<M, V, R, L, P, C>) -> Router
where
    M: MediaAdapter + Clone,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    Router::new()
        .route("/api/upload", post(routes::jobs::upload::<M, V, R, L, P, C>))
        .route("/api/create-job", post(routes::jobs::create_job::<M, V, R, L, P, C>))
        .route("/api/start", post(routes::jobs::start::<M, V, R, L, P, C>))
        .route("/api/cancel/{id}", post(routes::jobs::cancel::<M, V, R, L, P, C>))
        .route("/api/pause/{id}", post(routes::jobs::pause::<M, V, R, L, P, C>))
        .route("/api/resume/{id}", post(routes::jobs::resume::<M, V, R, L, P, C>))
        .route("/api/prioritize/{id}", post(routes::jobs::prioritize::<M, V, R, L, P, C>))
        .route("/api/reorder-queue", post(routes::jobs::reorder_queue::<M, V, R, L, P, C>))
        .route("/api/status/{id}", get(routes::jobs::status::<M, V, R, L, P, C>))
        .route("/api/queue-status", get(routes::jobs::queue_status::<M, V, R, L, P, C>))
        .route("/api/sync-tasks", get(routes::jobs::sync_tasks::<M, V, R, L, P, C>))
        .route("/api/copy-result/{id}", post(routes::jobs::copy_result::<M, V, R, L, P, C>))
        .route("/api/stream/{id}", get(routes::sse::stream_job::<M, V, R, L, P, C>))
        .route("/api/events/global", get(routes::sse::stream_global::<M, V, R, L, P, C>))
        .route("/api/media/{id}/video", get(routes::media::video::<M, V, R, L, P, C>))
        .route("/api/media/{id}/audio", get(routes::media::audio::<M, V, R, L, P, C>))
        .route("/api/media/{id}/thumbnail", get(routes::media::thumbnail::<M, V, R, L, P, C>))
        .route("/api/media/{id}/peaks", get(routes::media::peaks::<M, V, R, L, P, C>))
        .route(
            "/api/media/{id}/srt",
            get(routes::srt::get_srt::<M, V, R, L, P, C>).post(routes::srt::post_srt::<M, V, R, L, P, C>),
        )
        .with_state(state)
}

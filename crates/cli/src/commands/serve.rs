// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `tj serve`: wire up the production adapters, recover the Registry from
//! disk, spawn the single runner, then serve the HTTP/SSE API. Startup
//! sequencing matters: `recover` must run before `spawn_runner`, and both
//! before the listener accepts connections.

use crate::config::TjConfig;
use crate::exit_error::{ExitError, EX_INTERRUPTED};
use std::future::IntoFuture;
use std::sync::Arc;
use tj_adapters::{FfmpegMediaAdapter, ProcessAlignAdapter, ProcessAsrAdapter, ProcessSeparationAdapter, ProcessVadAdapter};
use tj_core::SystemClock;
use tj_engine::Executor;
use tj_hub::{GlobalHub, JobHub};
use tj_server::{AppState, ServerConfig};
use tj_storage::ArtifactStore;
use tj_supervisor::{JobRegistry, Supervisor};

pub async fn run(config: TjConfig) -> Result<(), ExitError> {
    let store = Arc::new(ArtifactStore::new(config.root_dir.clone()));
    let registry = Arc::new(JobRegistry::new(Arc::clone(&store)));
    let job_hub = Arc::new(JobHub::with_capacity(config.sse_subscriber_buffer));
    let global_hub = Arc::new(GlobalHub::with_capacity(config.sse_subscriber_buffer));
    let clock = SystemClock;

    let media = FfmpegMediaAdapter::new(config.ffmpeg_path.clone(), config.ffprobe_path.clone());
    let vad = ProcessVadAdapter::new(config.vad_binary_path.clone());
    let asr = ProcessAsrAdapter::new(config.asr_binary_path.clone());
    let align = ProcessAlignAdapter::new(config.align_binary_path.clone());
    let separation = ProcessSeparationAdapter::new(config.separation_binary_path.clone());

    let executor = Executor::new(
        media.clone(),
        vad,
        asr,
        align,
        separation,
        Arc::clone(&store),
        Arc::clone(&job_hub),
        config.phase_weights,
        clock.clone(),
    );

    let supervisor =
        Supervisor::new(executor, Arc::clone(&registry), Arc::clone(&store), Arc::clone(&job_hub), Arc::clone(&global_hub), clock.clone());

    supervisor.recover(config.auto_resume_on_startup).map_err(|err| ExitError::internal(err.to_string()))?;
    let runner = supervisor.spawn_runner();

    let server_config = ServerConfig {
        sse_heartbeat: std::time::Duration::from_secs(config.sse_heartbeat_seconds),
        default_peaks_samples: config.default_peaks_samples,
    };
    let state = AppState::new(supervisor, registry, store, job_hub, global_hub, media, clock, server_config);
    let app = tj_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await.map_err(|err| ExitError::internal(err.to_string()))?;
    tracing::info!(addr = %config.bind_addr, "tj-server: listening");

    let result = tokio::select! {
        result = axum::serve(listener, app).into_future() => {
            result.map_err(|err| ExitError::internal(err.to_string()))
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("tj-server: received interrupt, shutting down");
            Err(ExitError::new(EX_INTERRUPTED, "interrupted"))
        }
    };

    runner.abort();
    result
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Shared application state threaded through every route handler via axum's
//! `State` extractor, grounded on the same "one struct of `Arc`-wrapped
//! shared services" shape as `stupid-db`'s `AppState`.

use std::sync::Arc;
use std::time::Duration;
use tj_core::Clock;
use tj_hub::{GlobalHub, JobHub};
use tj_storage::ArtifactStore;
use tj_supervisor::{JobRegistry, Supervisor};

/// Server-layer knobs. Everything else (model paths, phase
/// weights) is consumed earlier, while wiring up the `Executor`; this
/// struct only holds what the HTTP layer itself needs.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    pub sse_heartbeat: Duration,
    pub default_peaks_samples: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { sse_heartbeat: Duration::from_secs(15), default_peaks_samples: 2000 }
    }
}

/// One instance per process, cloned cheaply into every handler. `media` is
/// held outside the `Arc<Executor<..>>` because the peaks route calls it
/// directly, off the single-runner path, so Media Server requests run in
/// parallel with the runner.
pub struct AppState<M, V, R, L, P, C> {
    pub supervisor: Arc<Supervisor<M, V, R, L, P, C>>,
    pub registry: Arc<JobRegistry>,
    pub store: Arc<ArtifactStore>,
    pub job_hub: Arc<JobHub>,
    pub global_hub: Arc<GlobalHub>,
    pub media: M,
    pub clock: C,
    pub config: ServerConfig,
}

impl<M: Clone, V, R, L, P, C: Clone> Clone for AppState<M, V, R, L, P, C> {
    fn clone(&self) -> Self {
        Self {
            supervisor: Arc::clone(&self.supervisor),
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
            job_hub: Arc::clone(&self.job_hub),
            global_hub: Arc::clone(&self.global_hub),
            media: self.media.clone(),
            clock: self.clock.clone(),
            config: self.config,
        }
    }
}

impl<M, V, R, L, P, C> AppState<M, V, R, L, P, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        supervisor: Arc<Supervisor<M, V, R, L, P, C>>,
        registry: Arc<JobRegistry>,
        store: Arc<ArtifactStore>,
        job_hub: Arc<JobHub>,
        global_hub: Arc<GlobalHub>,
        media: M,
        clock: C,
        config: ServerConfig,
    ) -> Self {
        Self { supervisor, registry, store, job_hub, global_hub, media, clock, config }
    }
}

impl<M, V, R, L, P, C: Clock> AppState<M, V, R, L, P, C> {
    pub fn now_epoch_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Shared harness for route tests: an in-process router over fake
//! adapters and a temp-dir-backed `ArtifactStore`, mirroring the
//! `build()` helper in `tj-supervisor`'s `queue_tests.rs`.

#![cfg(test)]

use crate::state::{AppState, ServerConfig};
use crate::router;
use std::sync::Arc;
use tempfile::TempDir;
use tj_adapters::{FakeAlignAdapter, FakeAsrAdapter, FakeMediaAdapter, FakeSeparationAdapter, FakeVadAdapter};
use tj_core::{FakeClock, PhaseWeights};
use tj_engine::Executor;
use tj_hub::{GlobalHub, JobHub};
use tj_storage::ArtifactStore;
use tj_supervisor::{JobRegistry, Supervisor};

pub type TestAppState =
    AppState<FakeMediaAdapter, FakeVadAdapter, FakeAsrAdapter, FakeAlignAdapter, FakeSeparationAdapter, FakeClock>;

pub fn build() -> (TempDir, TestAppState) {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let job_hub = Arc::new(JobHub::new());
    let global_hub = Arc::new(GlobalHub::new());
    let registry = Arc::new(JobRegistry::new(store.clone()));
    let media = FakeMediaAdapter::new();
    let executor = Executor::new(
        media.clone(),
        FakeVadAdapter::new(),
        FakeAsrAdapter::new(),
        FakeAlignAdapter::new(),
        FakeSeparationAdapter::new(),
        store.clone(),
        job_hub.clone(),
        PhaseWeights::default(),
        FakeClock::new(),
    );
    let supervisor = Supervisor::new(executor, registry.clone(), store.clone(), job_hub.clone(), global_hub.clone(), FakeClock::new());
    let state =
        AppState::new(supervisor, registry, store, job_hub, global_hub, media, FakeClock::new(), ServerConfig::default());
    (dir, state)
}

pub fn test_router() -> (TempDir, axum::Router) {
    let (dir, state) = build();
    (dir, router(state))
}

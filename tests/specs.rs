// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! A handful of end-to-end scenarios driven through the full HTTP surface
//! against fake adapters.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tj_adapters::{FakeAlignAdapter, FakeAsrAdapter, FakeMediaAdapter, FakeSeparationAdapter, FakeVadAdapter};
use tj_core::{FakeClock, PhaseWeights};
use tj_engine::Executor;
use tj_hub::{GlobalHub, JobHub};
use tj_storage::ArtifactStore;
use tj_supervisor::{JobRegistry, Supervisor};
use tower::ServiceExt;

type TestAppState =
    tj_server::AppState<FakeMediaAdapter, FakeVadAdapter, FakeAsrAdapter, FakeAlignAdapter, FakeSeparationAdapter, FakeClock>;

fn build() -> (TempDir, TestAppState) {
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
    let supervisor =
        Supervisor::new(executor, registry.clone(), store.clone(), job_hub.clone(), global_hub.clone(), FakeClock::new());
    let state = tj_server::AppState::new(
        supervisor,
        registry,
        store,
        job_hub,
        global_hub,
        media,
        FakeClock::new(),
        tj_server::ServerConfig::default(),
    );
    (dir, state)
}

fn seed_input(dir: &TempDir, filename: &str) {
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join(filename), b"fake media bytes").expect("seed input");
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("valid json")
}

async fn create_job(router: &axum::Router, filename: &str) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/create-job")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "filename": filename }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["job_id"].as_str().expect("job_id").to_string()
}

async fn start_job(router: &axum::Router, job_id: &str) {
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/start")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "job_id": job_id, "settings": {} }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

async fn get_job(router: &axum::Router, job_id: &str) -> Value {
    let response =
        router.clone().oneshot(Request::get(format!("/api/status/{job_id}")).body(Body::empty()).expect("request")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// Happy path, single job: status sequence ends in `finished`, the SRT
/// is present, and `percent` reaches 100.
#[tokio::test]
async fn happy_path_single_job_runs_to_completion() {
    let (dir, state) = build();
    let router = tj_server::router(state.clone());
    seed_input(&dir, "clip_10s.mp4");

    let job_id = create_job(&router, "clip_10s.mp4").await;
    start_job(&router, &job_id).await;
    let _runner = state.supervisor.spawn_runner();

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    let mut job = get_job(&router, &job_id).await;
    while job["status"] != "finished" {
        assert!(tokio::time::Instant::now() < deadline, "job did not finish in time: {job:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
        job = get_job(&router, &job_id).await;
    }

    assert_eq!(job["percent"], 100);

    let response = router
        .oneshot(Request::get(format!("/api/media/{job_id}/srt")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let srt = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("read body");
    assert!(!srt.is_empty(), "expected a non-empty generated SRT");
}

/// Cancel with data delete removes the job's working directory and drops
/// it from the index, without ever starting the runner (so the assertion
/// is deterministic, not a race against execution speed).
#[tokio::test]
async fn cancel_with_delete_data_removes_the_job_directory() {
    let (dir, state) = build();
    let router = tj_server::router(state);
    seed_input(&dir, "a.mp4");
    seed_input(&dir, "b.mp4");

    let a = create_job(&router, "a.mp4").await;
    let b = create_job(&router, "b.mp4").await;
    start_job(&router, &a).await;
    start_job(&router, &b).await;

    let job_dir_b = dir.path().join("jobs").join(&b);
    assert!(job_dir_b.exists());

    let response = router
        .clone()
        .oneshot(Request::post(format!("/api/cancel/{b}?delete_data=true")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    assert!(!job_dir_b.exists(), "job directory should have been removed");

    let queue = get_queue_status(&router).await;
    let queued_ids: Vec<&str> = queue["queue"].as_array().expect("array").iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(queued_ids, vec![a.as_str()]);
}

async fn get_queue_status(router: &axum::Router) -> Value {
    let response = router.clone().oneshot(Request::get("/api/queue-status").body(Body::empty()).expect("request")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

/// A valid reorder changes queue order; a set that is not a permutation
/// of the current queue is rejected.
#[tokio::test]
async fn reorder_changes_queue_order_and_rejects_non_permutations() {
    let (dir, state) = build();
    let router = tj_server::router(state);
    seed_input(&dir, "a.mp4");
    seed_input(&dir, "b.mp4");
    seed_input(&dir, "c.mp4");

    let a = create_job(&router, "a.mp4").await;
    let b = create_job(&router, "b.mp4").await;
    let c = create_job(&router, "c.mp4").await;
    start_job(&router, &a).await;
    start_job(&router, &b).await;
    start_job(&router, &c).await;

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/reorder-queue")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "job_ids": [c.clone(), b.clone(), a.clone()] }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let queue = get_queue_status(&router).await;
    let queued_ids: Vec<&str> = queue["queue"].as_array().expect("array").iter().map(|v| v.as_str().unwrap()).collect();
    assert_eq!(queued_ids, vec![c.as_str(), b.as_str(), a.as_str()]);

    let response = router
        .oneshot(
            Request::post("/api/reorder-queue")
                .header("content-type", "application/json")
                .body(Body::from(json!({ "job_ids": [a, b] }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// `tj doctor` (blackbox, via the compiled binary): a reachable, executable
/// binary on `PATH` passes; a nonexistent absolute path fails and the
/// process exits non-zero.
#[test]
fn doctor_reports_missing_binaries_as_a_failing_exit_code() {
    let dir = TempDir::new().expect("tempdir");
    assert_cmd::Command::cargo_bin("tj")
        .expect("tj binary")
        .args([
            "doctor",
            "--root-dir",
            dir.path().to_str().expect("utf8 path"),
            "--asr-binary-path",
            "/no/such/binary/here",
        ])
        .assert()
        .failure();
}

#[test]
fn doctor_passes_when_every_binary_resolves() {
    let dir = TempDir::new().expect("tempdir");
    let real_binary = std::env::current_exe().expect("current exe");
    assert_cmd::Command::cargo_bin("tj")
        .expect("tj binary")
        .args([
            "doctor",
            "--root-dir",
            dir.path().to_str().expect("utf8 path"),
            "--ffmpeg-path",
            real_binary.to_str().expect("utf8 path"),
            "--ffprobe-path",
            real_binary.to_str().expect("utf8 path"),
            "--vad-binary-path",
            real_binary.to_str().expect("utf8 path"),
            "--asr-binary-path",
            real_binary.to_str().expect("utf8 path"),
            "--align-binary-path",
            real_binary.to_str().expect("utf8 path"),
            "--separation-binary-path",
            real_binary.to_str().expect("utf8 path"),
        ])
        .assert()
        .success();
}

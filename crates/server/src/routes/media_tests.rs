// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use crate::router;
use crate::test_support::build;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

async fn create_job(router: &axum::Router, filename: &str) -> String {
    let response = router
        .clone()
        .oneshot(
            Request::post("/api/create-job")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::json!({ "filename": filename }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let created: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    created["job_id"].as_str().expect("job_id").to_string()
}

#[tokio::test]
async fn video_serves_the_uploaded_source_file() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"video-bytes").expect("seed input file");
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;

    let response = router
        .oneshot(Request::get(format!("/api/media/{job_id}/video")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.as_ref(), b"video-bytes");
}

#[tokio::test]
async fn video_honors_a_range_request() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"0123456789").expect("seed input file");
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;

    let response = router
        .oneshot(
            Request::get(format!("/api/media/{job_id}/video"))
                .header("range", "bytes=0-3")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.as_ref(), b"0123");
}

#[tokio::test]
async fn audio_and_thumbnail_are_served_from_the_job_directory() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"fake").expect("seed input file");
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;
    let job_dir = dir.path().join("jobs").join(&job_id);
    std::fs::write(job_dir.join("audio.wav"), b"pcm-bytes").expect("seed audio");
    std::fs::write(job_dir.join("thumbnail.jpg"), b"jpg-bytes").expect("seed thumbnail");

    let response = router
        .clone()
        .oneshot(Request::get(format!("/api/media/{job_id}/audio")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.as_ref(), b"pcm-bytes");

    let response = router
        .oneshot(Request::get(format!("/api/media/{job_id}/thumbnail")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    assert_eq!(bytes.as_ref(), b"jpg-bytes");
}

#[tokio::test]
async fn missing_media_file_is_a_bad_request() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"fake").expect("seed input file");
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;
    let response = router
        .oneshot(Request::get(format!("/api/media/{job_id}/audio")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn peaks_default_to_two_thousand_buckets_and_are_cached() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"fake").expect("seed input file");
    state.media.set_peaks(vec![0.1, 0.5, 0.2]);
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;
    let response = router
        .oneshot(Request::get(format!("/api/media/{job_id}/peaks")).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let peaks: Vec<f32> = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(peaks.len(), 2000);
    assert_eq!(&peaks[..3], &[0.1, 0.5, 0.2]);

    let cached = std::fs::read(dir.path().join("jobs").join(&job_id).join("peaks.json")).expect("cache written");
    let cached: Vec<f32> = serde_json::from_slice(&cached).expect("cached json");
    assert_eq!(cached, peaks);
}

#[tokio::test]
async fn an_explicit_samples_query_bypasses_the_cache() {
    let (dir, state) = build();
    std::fs::create_dir_all(dir.path().join("input")).expect("input dir");
    std::fs::write(dir.path().join("input").join("clip.mp4"), b"fake").expect("seed input file");
    state.media.set_peaks(vec![0.1, 0.5, 0.2]);
    let router = router(state);

    let job_id = create_job(&router, "clip.mp4").await;
    let response = router
        .oneshot(
            Request::get(format!("/api/media/{job_id}/peaks?samples=5"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let peaks: Vec<f32> = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(peaks.len(), 5);

    assert!(!dir.path().join("jobs").join(&job_id).join("peaks.json").exists());
}

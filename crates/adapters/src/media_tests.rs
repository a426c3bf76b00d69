// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;

#[test]
fn rms_bucket_splits_evenly_sized_input() {
    let samples: Vec<i16> = vec![i16::MAX, i16::MIN, i16::MAX, i16::MIN];
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    let peaks = rms_bucket(&bytes, 2);
    assert_eq!(peaks.len(), 2);
    assert!((peaks[0] - 1.0).abs() < 1e-3);
}

#[test]
fn rms_bucket_of_empty_input_is_zeroed() {
    let peaks = rms_bucket(&[], 4);
    assert_eq!(peaks, vec![0.0; 4]);
}

#[test]
fn rms_bucket_zero_buckets_requested_yields_empty() {
    assert!(rms_bucket(&[1, 2, 3, 4], 0).is_empty());
}

#[tokio::test]
async fn fake_adapter_writes_placeholder_files_and_records_call() {
    let dir = tempfile::tempdir().unwrap();
    let adapter = FakeMediaAdapter::new();
    let audio_out = dir.path().join("audio.wav");
    let thumb_out = dir.path().join("thumbnail.jpg");

    let out = adapter.extract(Path::new("/in/movie.mp4"), &audio_out, &thumb_out).await.unwrap();
    assert!(audio_out.exists());
    assert!(thumb_out.exists());
    assert_eq!(out.duration_sec, 12.0);
    assert_eq!(adapter.calls().len(), 1);
}

#[tokio::test]
async fn fake_adapter_honors_forced_failure() {
    let adapter = FakeMediaAdapter::new();
    adapter.set_fail(true);
    let err = adapter.extract(Path::new("/in/x"), Path::new("/out/a.wav"), Path::new("/out/t.jpg")).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn fake_adapter_peaks_resized_to_requested_bucket_count() {
    let adapter = FakeMediaAdapter::new();
    adapter.set_peaks(vec![0.1, 0.2]);
    let peaks = adapter.peaks(Path::new("/out/audio.wav"), 5).await.unwrap();
    assert_eq!(peaks.len(), 5);
}

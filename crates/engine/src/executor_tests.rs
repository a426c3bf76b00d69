// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;
use std::sync::Arc;
use tempfile::TempDir;
use tj_adapters::{FakeAlignAdapter, FakeAsrAdapter, FakeMediaAdapter, FakeSeparationAdapter, FakeVadAdapter, RmsLevels};
use tj_core::{FakeClock, Job, JobPaths, PhaseWeights, TranscriptionSettings};
use tj_hub::JobHub;
use tj_storage::ArtifactStore;

type TestExecutor = Executor<FakeMediaAdapter, FakeVadAdapter, FakeAsrAdapter, FakeAlignAdapter, FakeSeparationAdapter, FakeClock>;

struct Harness {
    _dir: TempDir,
    store: Arc<ArtifactStore>,
    #[allow(dead_code)]
    hub: Arc<JobHub>,
    executor: TestExecutor,
    paths: JobPaths,
}

fn build(
    job: &Job,
    media: FakeMediaAdapter,
    vad: FakeVadAdapter,
    asr: FakeAsrAdapter,
    align: FakeAlignAdapter,
    separation: FakeSeparationAdapter,
) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let hub = Arc::new(JobHub::new());
    let paths = JobPaths::new(dir.path(), job.id, &job.filename);
    let executor = Executor::new(media, vad, asr, align, separation, store.clone(), hub.clone(), PhaseWeights::default(), FakeClock::new());
    Harness { _dir: dir, store, hub, executor, paths }
}

fn build_default(job: &Job) -> Harness {
    build(job, FakeMediaAdapter::new(), FakeVadAdapter::new(), FakeAsrAdapter::new(), FakeAlignAdapter::new(), FakeSeparationAdapter::new())
}

fn started_job(settings: TranscriptionSettings) -> Job {
    let mut job = Job::builder("clip.mp4").build();
    job.start(settings, 0);
    job
}

#[tokio::test]
async fn happy_path_completes_with_two_segments() {
    let mut job = started_job(TranscriptionSettings::default());
    let h = build_default(&job);
    let interrupt = Interrupt::new();

    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(job.status, tj_core::JobStatus::Finished);
    assert_eq!(job.percent, 100);
    assert!(h.paths.subtitles_srt().exists());

    let checkpoint = h.store.load_checkpoint(job.id).expect("load ok").expect("checkpoint present");
    assert_eq!(checkpoint.phase, tj_core::Phase::Complete);
    assert_eq!(checkpoint.processed_indices.len(), 2);
}

#[tokio::test]
async fn language_is_set_from_the_first_segment_that_reports_one() {
    let mut job = started_job(TranscriptionSettings::default());
    let asr = FakeAsrAdapter::new();
    asr.push_result(AsrResult {
        text: "bonjour".into(),
        avg_logprob: -0.1,
        no_speech_prob: 0.02,
        words: vec![],
        language: Some("fr".into()),
    });
    let h = build(&job, FakeMediaAdapter::new(), FakeVadAdapter::new(), asr, FakeAlignAdapter::new(), FakeSeparationAdapter::new());
    let interrupt = Interrupt::new();

    assert_eq!(job.language, None);
    h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(job.language.as_deref(), Some("fr"));
}

#[tokio::test]
async fn resumes_from_a_partially_processed_transcribe_checkpoint() {
    let mut job = started_job(TranscriptionSettings::default());
    let h = build_default(&job);

    let mut checkpoint = tj_core::Checkpoint::fresh(0);
    checkpoint.phase = tj_core::Phase::Transcribe;
    checkpoint.duration_sec = 5.0;
    checkpoint.total_segments = 2;
    checkpoint.segments = vec![
        tj_core::Segment {
            index: 0,
            start_sec: 0.0,
            end_sec: 2.0,
            text: Some("existing".into()),
            words: vec![],
            avg_logprob: Some(-0.1),
            no_speech_prob: Some(0.01),
            low_confidence_marker: false,
        },
        tj_core::Segment {
            index: 1,
            start_sec: 2.5,
            end_sec: 5.0,
            text: None,
            words: vec![],
            avg_logprob: None,
            no_speech_prob: None,
            low_confidence_marker: false,
        },
    ];
    checkpoint.processed_indices.insert(0);
    h.store.save_state(&job).expect("save state");
    h.store.save_checkpoint(job.id, &checkpoint).expect("save checkpoint");

    let interrupt = Interrupt::new();
    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Completed);
    let final_checkpoint = h.store.load_checkpoint(job.id).expect("load ok").expect("checkpoint present");
    assert_eq!(final_checkpoint.segments[0].text.as_deref(), Some("existing"));
    assert_eq!(final_checkpoint.processed_indices.len(), 2);
}

#[tokio::test]
async fn cancel_request_stops_the_run_without_marking_failed() {
    let mut job = started_job(TranscriptionSettings::default());
    let h = build_default(&job);
    let interrupt = Interrupt::new();
    interrupt.request_cancel();

    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Canceled);
    assert_eq!(job.status, tj_core::JobStatus::Canceled);
}

#[tokio::test]
async fn pause_request_stops_the_run_without_marking_failed() {
    let mut job = started_job(TranscriptionSettings::default());
    let h = build_default(&job);
    let interrupt = Interrupt::new();
    interrupt.request_pause();

    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Paused);
    assert_eq!(job.status, tj_core::JobStatus::Paused);
}

#[tokio::test]
async fn heavy_bgm_triggers_global_separation() {
    let mut settings = TranscriptionSettings::default();
    settings.demucs.enabled = true;
    settings.demucs.mode = tj_core::DemucsMode::Auto;
    let mut job = started_job(settings);

    let separation = FakeSeparationAdapter::new();
    separation.set_levels(RmsLevels { original_rms: 1.0, vocals_rms: 0.05 });
    let h = build(&job, FakeMediaAdapter::new(), FakeVadAdapter::new(), FakeAsrAdapter::new(), FakeAlignAdapter::new(), separation);
    let interrupt = Interrupt::new();

    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Completed);
    let checkpoint = h.store.load_checkpoint(job.id).expect("load ok").expect("checkpoint present");
    assert_eq!(checkpoint.demucs_state.bgm_level, tj_core::BgmLevel::Heavy);
    assert!(checkpoint.demucs_state.global_separation_done);
    assert!(h.paths.vocals_wav().exists());
}

#[tokio::test]
async fn circuit_breaker_fail_aborts_the_job() {
    let mut settings = TranscriptionSettings::default();
    settings.demucs.enabled = true;
    settings.demucs.mode = tj_core::DemucsMode::OnDemand;
    settings.demucs.retry_threshold_logprob = 0.0;
    settings.demucs.circuit_breaker.consecutive_threshold = 1;
    settings.demucs.auto_escalation = false;
    settings.demucs.max_escalations = 0;
    settings.demucs.on_break = tj_core::OnBreak::Fail;
    let mut job = started_job(settings);
    let h = build_default(&job);
    let interrupt = Interrupt::new();

    let result = h.executor.run(&mut job, &h.paths, &interrupt).await;

    assert!(matches!(result, Err(JobError::CircuitBreakerOpen)));
    assert_eq!(job.status, tj_core::JobStatus::Failed);
    assert!(job.last_error.is_some());
}

#[tokio::test]
async fn escalation_then_continue_marks_segment_low_confidence() {
    let mut settings = TranscriptionSettings::default();
    settings.demucs.enabled = true;
    settings.demucs.mode = tj_core::DemucsMode::OnDemand;
    settings.demucs.retry_threshold_logprob = 0.0;
    settings.demucs.circuit_breaker.consecutive_threshold = 1;
    settings.demucs.auto_escalation = true;
    settings.demucs.max_escalations = 1;
    settings.demucs.on_break = tj_core::OnBreak::Continue;
    let mut job = started_job(settings);
    let h = build_default(&job);
    let interrupt = Interrupt::new();

    let outcome = h.executor.run(&mut job, &h.paths, &interrupt).await.expect("run succeeds");

    assert_eq!(outcome, RunOutcome::Completed);
    let checkpoint = h.store.load_checkpoint(job.id).expect("load ok").expect("checkpoint present");
    assert_eq!(checkpoint.demucs_state.escalation_count, 1);
    assert!(checkpoint.segments[1].low_confidence_marker);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;
use crate::settings::TranscriptionSettings;

#[test]
fn new_job_starts_created_pending() {
    let job = Job::new(JobId::new(), "clip.mp4", 1000);
    assert_eq!(job.status, JobStatus::Created);
    assert_eq!(job.phase, Phase::Pending);
    assert_eq!(job.percent, 0);
    assert!(job.settings.is_none());
}

#[test]
fn start_freezes_settings_and_moves_to_queued() {
    let mut job = Job::new(JobId::new(), "clip.mp4", 1000);
    job.start(TranscriptionSettings::default(), 2000);
    assert_eq!(job.status, JobStatus::Queued);
    assert!(job.settings.is_some());
    assert_eq!(job.updated_at_epoch_ms, 2000);
}

#[test]
fn mark_terminal_finished_forces_percent_100() {
    let mut job = Job::new(JobId::new(), "clip.mp4", 1000);
    job.percent = 40;
    job.mark_terminal(JobStatus::Finished, 3000);
    assert_eq!(job.percent, 100);
    assert!(job.status.is_terminal());
}

#[test]
fn terminal_statuses_are_classified_correctly() {
    assert!(JobStatus::Finished.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
    assert!(JobStatus::Canceled.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
    assert!(!JobStatus::Paused.is_terminal());
    assert!(!JobStatus::Interrupted.is_terminal());
}

#[test]
fn job_paths_are_derived_not_stored() {
    let root = std::path::Path::new("/srv/tj");
    let id = JobId::from_string("job-aaaaaaaaaaaaaaaaaaa");
    let paths = JobPaths::new(root, id, "clip.mp4");
    assert_eq!(paths.state_json(), root.join("jobs/job-aaaaaaaaaaaaaaaaaaa/state.json"));
    assert_eq!(paths.input_path, root.join("input/clip.mp4"));
}

#[test]
fn job_serializes_round_trip() {
    let mut job = Job::new(JobId::new(), "clip.mp4", 1000);
    job.start(TranscriptionSettings::default(), 1500);
    let json = serde_json::to_string(&job).unwrap();
    let back: Job = serde_json::from_str(&json).unwrap();
    assert_eq!(job.id.as_str(), back.id.as_str());
    assert_eq!(job.status, back.status);
    assert_eq!(job.settings, back.settings);
}

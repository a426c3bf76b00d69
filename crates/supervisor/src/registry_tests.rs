// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;
use tempfile::TempDir;
use tj_core::{JobStatus, TranscriptionSettings};

fn registry() -> (TempDir, JobRegistry) {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::new(dir.path()));
    (dir, JobRegistry::new(store))
}

#[test]
fn insert_new_persists_and_is_visible_via_get() {
    let (_dir, registry) = registry();
    let job = Job::builder("clip.mp4").build();
    let id = job.id;
    registry.insert_new(job).expect("insert");

    let fetched = registry.get(id).expect("present");
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.status, JobStatus::Created);
}

#[test]
fn mutate_persists_the_change_and_returns_the_new_snapshot() {
    let (_dir, registry) = registry();
    let mut job = Job::builder("clip.mp4").build();
    job.start(TranscriptionSettings::default(), 10);
    let id = job.id;
    registry.insert_new(job).expect("insert");

    let updated = registry.mutate(id, |j| j.status = JobStatus::Paused).expect("mutate");
    assert_eq!(updated.status, JobStatus::Paused);
    assert_eq!(registry.get(id).expect("present").status, JobStatus::Paused);
}

#[test]
fn mutate_unknown_job_fails() {
    let (_dir, registry) = registry();
    let result = registry.mutate(JobId::new(), |_| {});
    assert!(matches!(result, Err(SupervisorError::JobNotFound(_))));
}

#[test]
fn load_from_disk_reclassifies_processing_jobs_as_interrupted() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let mut job = Job::builder("clip.mp4").build();
    job.status = JobStatus::Processing;
    store.save_state(&job).expect("save");

    let registry = JobRegistry::new(store.clone());
    let jobs = registry.load_from_disk().expect("scan");

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Interrupted);
    assert_eq!(registry.get(job.id).expect("cached").status, JobStatus::Interrupted);
    assert_eq!(store.load_state(job.id).expect("reload").status, JobStatus::Interrupted);
}

#[test]
fn load_from_disk_leaves_terminal_jobs_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let store = Arc::new(ArtifactStore::new(dir.path()));
    let mut job = Job::builder("clip.mp4").build();
    job.mark_terminal(JobStatus::Finished, 10);
    store.save_state(&job).expect("save");

    let registry = JobRegistry::new(store);
    let jobs = registry.load_from_disk().expect("scan");
    assert_eq!(jobs[0].status, JobStatus::Finished);
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;
use tempfile::tempdir;
use tj_core::{Checkpoint, Job, JobId};

fn store() -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempdir().unwrap();
    let store = ArtifactStore::new(dir.path());
    (dir, store)
}

#[test]
fn save_then_load_state_round_trips() {
    let (_dir, store) = store();
    let job = Job::new(JobId::new(), "movie.mp4", 1000);
    store.save_state(&job).unwrap();

    let loaded = store.load_state(job.id).unwrap();
    assert_eq!(loaded.id, job.id);
    assert_eq!(loaded.filename, "movie.mp4");
}

#[test]
fn load_state_for_unknown_job_errors_not_found() {
    let (_dir, store) = store();
    let err = store.load_state(JobId::new()).unwrap_err();
    assert!(matches!(err, ArtifactStoreError::NotFound(_)));
}

#[test]
fn save_checkpoint_rotates_backup_on_second_write() {
    let (_dir, store) = store();
    let id = JobId::new();
    let cp1 = Checkpoint::fresh(1000);
    store.save_checkpoint(id, &cp1).unwrap();

    let mut cp2 = Checkpoint::fresh(2000);
    cp2.total_segments = 5;
    store.save_checkpoint(id, &cp2).unwrap();

    let bak_path = store.checkpoint_path(id).with_extension("bak");
    assert!(bak_path.exists());

    let loaded = store.load_checkpoint(id).unwrap().unwrap();
    assert_eq!(loaded.total_segments, 5);
}

#[test]
fn load_checkpoint_for_job_without_one_is_none() {
    let (_dir, store) = store();
    assert!(store.load_checkpoint(JobId::new()).unwrap().is_none());
}

#[test]
fn register_input_persists_across_store_instances() {
    let (dir, store) = store();
    let id = JobId::new();
    store.register_input(id, dir.path().join("input/movie.mp4")).unwrap();

    let reopened = ArtifactStore::new(dir.path());
    let index = reopened.load_job_index().unwrap();
    assert_eq!(index.get(&id), Some(&dir.path().join("input/movie.mp4")));
}

#[test]
fn deregister_input_removes_the_entry_and_is_a_noop_if_absent() {
    let (dir, store) = store();
    let id = JobId::new();
    store.register_input(id, dir.path().join("input/movie.mp4")).unwrap();

    store.deregister_input(id).unwrap();
    assert!(store.load_job_index().unwrap().get(&id).is_none());

    store.deregister_input(id).unwrap();
}

#[test]
fn scan_jobs_finds_every_persisted_state() {
    let (_dir, store) = store();
    let job_a = Job::new(JobId::new(), "a.mp4", 1000);
    let job_b = Job::new(JobId::new(), "b.mp4", 1000);
    store.save_state(&job_a).unwrap();
    store.save_state(&job_b).unwrap();

    let mut jobs = store.scan_jobs().unwrap();
    jobs.sort_by_key(|j| j.filename.clone());
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].filename, "a.mp4");
    assert_eq!(jobs[1].filename, "b.mp4");
}

#[test]
fn integrity_sweep_drops_entries_with_missing_input() {
    let (dir, store) = store();
    let present_id = JobId::new();
    let missing_id = JobId::new();

    let present_input = dir.path().join("input/present.mp4");
    fs::create_dir_all(present_input.parent().unwrap()).unwrap();
    fs::write(&present_input, b"data").unwrap();
    fs::create_dir_all(store.job_dir(present_id)).unwrap();
    fs::create_dir_all(store.job_dir(missing_id)).unwrap();

    let mut index = IndexMap::new();
    index.insert(present_id, present_input);
    index.insert(missing_id, dir.path().join("input/gone.mp4"));
    store.save_job_index(&index).unwrap();

    let report = store.integrity_sweep().unwrap();
    assert_eq!(report.dropped, vec![missing_id]);

    let remaining = store.load_job_index().unwrap();
    assert!(remaining.contains_key(&present_id));
    assert!(!remaining.contains_key(&missing_id));
}

#[test]
fn integrity_sweep_drops_entries_with_missing_job_dir() {
    let (dir, store) = store();
    let id = JobId::new();
    let input = dir.path().join("input/x.mp4");
    fs::create_dir_all(input.parent().unwrap()).unwrap();
    fs::write(&input, b"data").unwrap();

    let mut index = IndexMap::new();
    index.insert(id, input);
    store.save_job_index(&index).unwrap();

    let report = store.integrity_sweep().unwrap();
    assert_eq!(report.dropped, vec![id]);
}

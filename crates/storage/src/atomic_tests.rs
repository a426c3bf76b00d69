// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;
use tempfile::tempdir;

#[test]
fn write_atomic_creates_parent_dirs_and_final_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("jobs/job-1/state.json");
    write_atomic(&path, b"{}").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    assert!(!path.with_extension("json.tmp").exists());
}

#[test]
fn write_atomic_overwrites_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    write_atomic(&path, b"one").unwrap();
    write_atomic(&path, b"two").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "two");
}

#[test]
fn rotate_bak_path_shifts_existing_backups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checkpoint.json");
    fs::write(path.with_extension("bak"), "gen1").unwrap();
    fs::write(path.with_extension("bak.2"), "gen2").unwrap();

    let next = rotate_bak_path(&path);
    assert_eq!(next, path.with_extension("bak"));
    assert_eq!(fs::read_to_string(path.with_extension("bak.2")).unwrap(), "gen1");
    assert_eq!(fs::read_to_string(path.with_extension("bak.3")).unwrap(), "gen2");
}

#[test]
fn rotate_bak_path_drops_oldest_once_at_capacity() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checkpoint.json");
    fs::write(path.with_extension("bak"), "gen1").unwrap();
    fs::write(path.with_extension("bak.2"), "gen2").unwrap();
    fs::write(path.with_extension("bak.3"), "gen3").unwrap();

    rotate_bak_path(&path);
    assert_eq!(fs::read_to_string(path.with_extension("bak.3")).unwrap(), "gen2");
}

#[test]
fn write_atomic_with_backup_preserves_prior_version() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("checkpoint.json");
    write_atomic(&path, b"v1").unwrap();
    write_atomic_with_backup(&path, b"v2").unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "v2");
    assert_eq!(fs::read_to_string(path.with_extension("bak")).unwrap(), "v1");
}

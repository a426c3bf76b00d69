// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Atomic file writes and backup rotation. Every artifact that must
//! never be observed half-written goes through [`write_atomic`]: write to a
//! sibling `.tmp` file, then `rename` over the target. A crash mid-write
//! leaves the `.tmp` file orphaned and the target untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const MAX_BAK_FILES: u32 = 3;

/// Write `contents` to `path` atomically via a temp file + rename.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(tmp_extension(path));
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{ext}.tmp"),
        None => "tmp".to_string(),
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
/// Keeps up to [`MAX_BAK_FILES`] backups; the oldest is removed once the
/// limit is reached.
pub fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }

    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }

    bak(1)
}

/// Write `contents` atomically, rotating the previous version of `path`
/// into the `.bak` chain first. Used for `checkpoint.json`, which we want
/// to be able to roll back if a write produces a structurally valid but
/// semantically corrupt checkpoint.
pub fn write_atomic_with_backup(path: &Path, contents: &[u8]) -> io::Result<()> {
    if path.exists() {
        let bak = rotate_bak_path(path);
        fs::copy(path, bak)?;
    }
    write_atomic(path, contents)
}

#[cfg(test)]
#[path = "atomic_tests.rs"]
mod tests;

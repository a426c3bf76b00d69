// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `tj doctor`: preflight checks before `serve` — root directory is
//! writable and every configured worker binary resolves on `PATH` (or is an
//! existing file). Runs synchronously, before any server state exists.

use crate::config::TjConfig;
use crate::exit_error::ExitError;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
}

impl DoctorReport {
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|c| c.ok)
    }
}

fn resolves(binary: &Path) -> bool {
    if binary.components().count() > 1 {
        return binary.exists();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(binary).exists()))
        .unwrap_or(false)
}

fn check_root_dir(root_dir: &Path) -> CheckResult {
    let probe = root_dir.join(".tj-doctor-probe");
    let ok = std::fs::create_dir_all(root_dir).and_then(|_| std::fs::write(&probe, b"ok")).is_ok();
    let _ = std::fs::remove_file(&probe);
    CheckResult {
        name: "root_dir writable".to_string(),
        ok,
        detail: root_dir.display().to_string(),
    }
}

fn check_binary(label: &str, path: &Path) -> CheckResult {
    CheckResult { name: format!("{label} resolves"), ok: resolves(path), detail: path.display().to_string() }
}

pub fn run(config: &TjConfig) -> Result<DoctorReport, ExitError> {
    let checks = vec![
        check_root_dir(&config.root_dir),
        check_binary("ffmpeg_path", &config.ffmpeg_path),
        check_binary("ffprobe_path", &config.ffprobe_path),
        check_binary("vad_binary_path", &config.vad_binary_path),
        check_binary("asr_binary_path", &config.asr_binary_path),
        check_binary("align_binary_path", &config.align_binary_path),
        check_binary("separation_binary_path", &config.separation_binary_path),
    ];
    Ok(DoctorReport { checks })
}

pub fn print_text(report: &DoctorReport) {
    for check in &report.checks {
        let marker = if check.ok { "ok  " } else { "FAIL" };
        println!("[{marker}] {} ({})", check.name, check.detail);
    }
}

#[cfg(test)]
#[path = "doctor_tests.rs"]
mod tests;

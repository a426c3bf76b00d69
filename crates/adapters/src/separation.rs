// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `SeparationAdapter`: the vocal-separation primitive behind `bgm_detect`
//! sampling, `demucs_global`, and the per-segment retry in `transcribe`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SeparationError {
    #[error("model load error: {model}: {detail}")]
    ModelLoad { model: String, detail: String },
    #[error("separation process failed: {0}")]
    ProcessFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RmsLevels {
    pub original_rms: f32,
    pub vocals_rms: f32,
}

impl RmsLevels {
    /// `bgm_ratio = 1 - rms(vocals) / rms(original)`, clamped to `[0, 1]`,
    /// the signal `bgm_detect` decides `BgmLevel` from.
    pub fn bgm_ratio(self) -> f32 {
        if self.original_rms <= 0.0 {
            return 0.0;
        }
        (1.0 - self.vocals_rms / self.original_rms).clamp(0.0, 1.0)
    }
}

#[async_trait]
pub trait SeparationAdapter: Send + Sync + 'static {
    /// Run vocal separation over `[start_sec, end_sec)` of `input_path`,
    /// writing the isolated vocals to `output_path` and reporting RMS
    /// levels of both signals for `bgm_ratio` computation.
    async fn separate(
        &self,
        input_path: &Path,
        start_sec: f64,
        end_sec: f64,
        output_path: &Path,
        model: &str,
    ) -> Result<RmsLevels, SeparationError>;
}

/// Shells out to a Demucs-family separation binary.
#[derive(Debug, Clone)]
pub struct ProcessSeparationAdapter {
    pub binary_path: PathBuf,
}

impl ProcessSeparationAdapter {
    pub fn new(binary_path: impl Into<PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[async_trait]
impl SeparationAdapter for ProcessSeparationAdapter {
    async fn separate(
        &self,
        input_path: &Path,
        start_sec: f64,
        end_sec: f64,
        output_path: &Path,
        model: &str,
    ) -> Result<RmsLevels, SeparationError> {
        let output = tokio::process::Command::new(&self.binary_path)
            .arg(input_path)
            .args(["--start", &start_sec.to_string()])
            .args(["--end", &end_sec.to_string()])
            .args(["--model", model])
            .args(["--out", &output_path.to_string_lossy()])
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("checkpoint") || stderr.contains("weights") {
                return Err(SeparationError::ModelLoad { model: model.to_string(), detail: stderr.into_owned() });
            }
            return Err(SeparationError::ProcessFailed(stderr.into_owned()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let (orig_str, vocals_str) = stdout
            .trim()
            .split_once(',')
            .ok_or_else(|| SeparationError::ProcessFailed(format!("malformed RMS line: {stdout:?}")))?;
        let original_rms: f32 = orig_str
            .trim()
            .parse()
            .map_err(|_| SeparationError::ProcessFailed(format!("bad original rms: {orig_str:?}")))?;
        let vocals_rms: f32 = vocals_str
            .trim()
            .parse()
            .map_err(|_| SeparationError::ProcessFailed(format!("bad vocals rms: {vocals_str:?}")))?;
        Ok(RmsLevels { original_rms, vocals_rms })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct FakeSeparateCall {
        pub start_sec: f64,
        pub end_sec: f64,
        pub model: String,
    }

    struct FakeState {
        calls: Vec<FakeSeparateCall>,
        levels: RmsLevels,
    }

    #[derive(Clone)]
    pub struct FakeSeparationAdapter {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeSeparationAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    calls: Vec::new(),
                    levels: RmsLevels { original_rms: 1.0, vocals_rms: 0.8 },
                })),
            }
        }
    }

    impl FakeSeparationAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_levels(&self, levels: RmsLevels) {
            self.inner.lock().levels = levels;
        }

        pub fn calls(&self) -> Vec<FakeSeparateCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl SeparationAdapter for FakeSeparationAdapter {
        async fn separate(
            &self,
            _input_path: &Path,
            start_sec: f64,
            end_sec: f64,
            output_path: &Path,
            model: &str,
        ) -> Result<RmsLevels, SeparationError> {
            let mut state = self.inner.lock();
            state.calls.push(FakeSeparateCall { start_sec, end_sec, model: model.to_string() });
            let levels = state.levels;
            drop(state);
            if let Some(parent) = output_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(output_path, b"FAKEVOCALS")?;
            Ok(levels)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSeparateCall, FakeSeparationAdapter};

#[cfg(test)]
#[path = "separation_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `VadAdapter`: the `split` phase's external call — voice-activity
//! detection over a WAV file, producing ordered, non-overlapping spans.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tj_core::VadConfig;

#[derive(Debug, Error)]
pub enum VadError {
    #[error("VAD process failed: {0}")]
    ProcessFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadSpan {
    pub start_sec: f64,
    pub end_sec: f64,
}

#[async_trait]
pub trait VadAdapter: Send + Sync + 'static {
    async fn detect(&self, audio_path: &Path, config: &VadConfig) -> Result<Vec<VadSpan>, VadError>;
}

/// Shells out to a VAD model binary via `tokio::process::Command`,
/// expecting newline-delimited `start_sec,end_sec` pairs on stdout.
#[derive(Debug, Clone)]
pub struct ProcessVadAdapter {
    pub binary_path: std::path::PathBuf,
}

impl ProcessVadAdapter {
    pub fn new(binary_path: impl Into<std::path::PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[async_trait]
impl VadAdapter for ProcessVadAdapter {
    async fn detect(&self, audio_path: &Path, config: &VadConfig) -> Result<Vec<VadSpan>, VadError> {
        let output = tokio::process::Command::new(&self.binary_path)
            .arg(audio_path)
            .args(["--onset", &config.onset.to_string()])
            .args(["--offset", &config.offset.to_string()])
            .args(["--min-speech-ms", &config.min_speech_ms.to_string()])
            .args(["--min-silence-ms", &config.min_silence_ms.to_string()])
            .output()
            .await?;
        if !output.status.success() {
            return Err(VadError::ProcessFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut spans = Vec::new();
        for line in stdout.lines() {
            let (start, end) = line
                .split_once(',')
                .ok_or_else(|| VadError::ProcessFailed(format!("malformed VAD line: {line:?}")))?;
            let start_sec: f64 =
                start.trim().parse().map_err(|_| VadError::ProcessFailed(format!("bad start: {start:?}")))?;
            let end_sec: f64 =
                end.trim().parse().map_err(|_| VadError::ProcessFailed(format!("bad end: {end:?}")))?;
            spans.push(VadSpan { start_sec, end_sec });
        }
        Ok(spans)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone)]
    pub struct FakeVadAdapter {
        spans: Arc<Mutex<Vec<VadSpan>>>,
    }

    impl Default for FakeVadAdapter {
        fn default() -> Self {
            Self {
                spans: Arc::new(Mutex::new(vec![
                    VadSpan { start_sec: 0.0, end_sec: 2.0 },
                    VadSpan { start_sec: 2.5, end_sec: 5.0 },
                ])),
            }
        }
    }

    impl FakeVadAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_spans(&self, spans: Vec<VadSpan>) {
            *self.spans.lock() = spans;
        }
    }

    #[async_trait]
    impl VadAdapter for FakeVadAdapter {
        async fn detect(&self, _audio_path: &Path, _config: &VadConfig) -> Result<Vec<VadSpan>, VadError> {
            Ok(self.spans.lock().clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeVadAdapter;

#[cfg(test)]
#[path = "vad_tests.rs"]
mod tests;

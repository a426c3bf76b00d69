// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `AsrAdapter`: the `transcribe` phase's external call — one segment of
//! audio in, `{text, avg_logprob, no_speech_prob, words?}` out.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tj_core::{TranscriptionSettings, Word};

#[derive(Debug, Error)]
pub enum AsrError {
    #[error("model load error: {model}: {detail}")]
    ModelLoad { model: String, detail: String },
    #[error("GPU out of memory")]
    GpuOutOfMemory,
    #[error("inference process failed: {0}")]
    ProcessFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AsrResult {
    pub text: String,
    pub avg_logprob: f32,
    pub no_speech_prob: f32,
    pub words: Vec<Word>,
    /// BCP-47-ish language code the model detected for this span (e.g.
    /// `"en"`), when the worker reports one.
    pub language: Option<String>,
}

#[async_trait]
pub trait AsrAdapter: Send + Sync + 'static {
    /// Transcribe the audio span `[start_sec, end_sec)` of `audio_path`
    /// using `settings.model`/`compute_type`/`device`.
    async fn transcribe(
        &self,
        audio_path: &Path,
        start_sec: f64,
        end_sec: f64,
        settings: &TranscriptionSettings,
    ) -> Result<AsrResult, AsrError>;
}

/// Shells out to an inference worker process, passing settings as JSON on
/// stdin and expecting a single JSON `AsrResult`-shaped object on stdout.
#[derive(Debug, Clone)]
pub struct ProcessAsrAdapter {
    pub binary_path: std::path::PathBuf,
}

impl ProcessAsrAdapter {
    pub fn new(binary_path: impl Into<std::path::PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[derive(serde::Deserialize)]
struct RawAsrResult {
    text: String,
    avg_logprob: f32,
    no_speech_prob: f32,
    #[serde(default)]
    words: Vec<Word>,
    #[serde(default)]
    language: Option<String>,
}

#[async_trait]
impl AsrAdapter for ProcessAsrAdapter {
    async fn transcribe(
        &self,
        audio_path: &Path,
        start_sec: f64,
        end_sec: f64,
        settings: &TranscriptionSettings,
    ) -> Result<AsrResult, AsrError> {
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new(&self.binary_path)
            .arg(audio_path)
            .args(["--start", &start_sec.to_string()])
            .args(["--end", &end_sec.to_string()])
            .args(["--model", &settings.model.to_string()])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| AsrError::ProcessFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(settings).unwrap_or_default();
            let _ = stdin.write_all(&payload).await;
        }

        let output = child.wait_with_output().await.map_err(|e| AsrError::ProcessFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("out of memory") || stderr.contains("CUDA_OUT_OF_MEMORY") {
                return Err(AsrError::GpuOutOfMemory);
            }
            return Err(AsrError::ProcessFailed(stderr.into_owned()));
        }

        let raw: RawAsrResult = serde_json::from_slice(&output.stdout)
            .map_err(|e| AsrError::ProcessFailed(format!("malformed worker output: {e}")))?;
        Ok(AsrResult {
            text: raw.text,
            avg_logprob: raw.avg_logprob,
            no_speech_prob: raw.no_speech_prob,
            words: raw.words,
            language: raw.language,
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct FakeTranscribeCall {
        pub start_sec: f64,
        pub end_sec: f64,
    }

    struct FakeState {
        calls: Vec<FakeTranscribeCall>,
        /// Scripted results, popped front-first; falls back to a default
        /// high-quality result once exhausted.
        scripted: VecDeque<AsrResult>,
    }

    #[derive(Clone)]
    pub struct FakeAsrAdapter {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeAsrAdapter {
        fn default() -> Self {
            Self { inner: Arc::new(Mutex::new(FakeState { calls: Vec::new(), scripted: VecDeque::new() })) }
        }
    }

    impl FakeAsrAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a result to be returned on the next call; results are
        /// consumed in FIFO order.
        pub fn push_result(&self, result: AsrResult) {
            self.inner.lock().scripted.push_back(result);
        }

        pub fn calls(&self) -> Vec<FakeTranscribeCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl AsrAdapter for FakeAsrAdapter {
        async fn transcribe(
            &self,
            _audio_path: &Path,
            start_sec: f64,
            end_sec: f64,
            _settings: &TranscriptionSettings,
        ) -> Result<AsrResult, AsrError> {
            let mut state = self.inner.lock();
            state.calls.push(FakeTranscribeCall { start_sec, end_sec });
            Ok(state.scripted.pop_front().unwrap_or(AsrResult {
                text: "fake transcript".to_string(),
                avg_logprob: -0.1,
                no_speech_prob: 0.02,
                words: Vec::new(),
                language: Some("en".to_string()),
            }))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAsrAdapter, FakeTranscribeCall};

#[cfg(test)]
#[path = "asr_tests.rs"]
mod tests;

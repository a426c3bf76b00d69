// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `AlignAdapter`: the `align` phase's external call — forced alignment
//! over the full segment list. Atomic: on failure the whole call re-runs,
//! it is not partially resumable.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tj_core::{Segment, Word};

#[derive(Debug, Error)]
pub enum AlignError {
    #[error("alignment process failed: {0}")]
    ProcessFailed(String),
}

#[async_trait]
pub trait AlignAdapter: Send + Sync + 'static {
    /// Align every segment's text to `audio_path`, returning word-level
    /// timestamps per segment index, in the same order as `segments`.
    async fn align(&self, audio_path: &Path, segments: &[Segment]) -> Result<Vec<Vec<Word>>, AlignError>;
}

/// Shells out to a forced-alignment worker binary.
#[derive(Debug, Clone)]
pub struct ProcessAlignAdapter {
    pub binary_path: std::path::PathBuf,
}

impl ProcessAlignAdapter {
    pub fn new(binary_path: impl Into<std::path::PathBuf>) -> Self {
        Self { binary_path: binary_path.into() }
    }
}

#[derive(serde::Serialize)]
struct AlignRequest<'a> {
    audio_path: &'a Path,
    segments: &'a [Segment],
}

#[async_trait]
impl AlignAdapter for ProcessAlignAdapter {
    async fn align(&self, audio_path: &Path, segments: &[Segment]) -> Result<Vec<Vec<Word>>, AlignError> {
        use tokio::io::AsyncWriteExt;

        let mut child = tokio::process::Command::new(&self.binary_path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(|e| AlignError::ProcessFailed(e.to_string()))?;

        if let Some(mut stdin) = child.stdin.take() {
            let payload = serde_json::to_vec(&AlignRequest { audio_path, segments }).unwrap_or_default();
            let _ = stdin.write_all(&payload).await;
        }

        let output = child.wait_with_output().await.map_err(|e| AlignError::ProcessFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(AlignError::ProcessFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        serde_json::from_slice(&output.stdout)
            .map_err(|e| AlignError::ProcessFailed(format!("malformed worker output: {e}")))
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone)]
    pub struct FakeAlignAdapter {
        fail_once: Arc<Mutex<bool>>,
    }

    impl Default for FakeAlignAdapter {
        fn default() -> Self {
            Self { fail_once: Arc::new(Mutex::new(false)) }
        }
    }

    impl FakeAlignAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes the next `align` call fail once, to exercise the
        /// re-run-whole-phase-on-failure contract.
        pub fn fail_next_call(&self) {
            *self.fail_once.lock() = true;
        }
    }

    #[async_trait]
    impl AlignAdapter for FakeAlignAdapter {
        async fn align(&self, _audio_path: &Path, segments: &[Segment]) -> Result<Vec<Vec<Word>>, AlignError> {
            let mut fail = self.fail_once.lock();
            if *fail {
                *fail = false;
                return Err(AlignError::ProcessFailed("fake: forced failure".into()));
            }
            drop(fail);
            Ok(segments
                .iter()
                .map(|s| vec![Word { text: s.text.clone().unwrap_or_default(), start_sec: s.start_sec, end_sec: s.end_sec }])
                .collect())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAlignAdapter;

#[cfg(test)]
#[path = "align_tests.rs"]
mod tests;

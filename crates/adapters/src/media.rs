// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `MediaAdapter`: the `extract` phase's external call — demux the source
//! into 16 kHz mono PCM WAV, pull a thumbnail from the first frame, and
//! (lazily, from `tj-server::media`) generate waveform peaks.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("source could not be decoded: {0}")]
    Decode(String),
    #[error("encoder process failed: {0}")]
    ProcessFailed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ExtractOutput {
    pub audio_path: PathBuf,
    pub thumbnail_path: PathBuf,
    pub duration_sec: f64,
}

#[async_trait]
pub trait MediaAdapter: Send + Sync + 'static {
    /// Demux `source` to 16 kHz mono PCM WAV at `audio_out`, grab a JPEG
    /// thumbnail of the first frame at `thumbnail_out`.
    async fn extract(
        &self,
        source: &Path,
        audio_out: &Path,
        thumbnail_out: &Path,
    ) -> Result<ExtractOutput, MediaError>;

    /// Downsample `audio_path` into RMS-bucketed peaks in `[-1, 1]`,
    /// `bucket_count` buckets wide.
    async fn peaks(&self, audio_path: &Path, bucket_count: usize) -> Result<Vec<f32>, MediaError>;
}

/// Shells out to `ffmpeg`/`ffprobe` via `tokio::process::Command`.
#[derive(Debug, Clone, Default)]
pub struct FfmpegMediaAdapter {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl FfmpegMediaAdapter {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self { ffmpeg_path: ffmpeg_path.into(), ffprobe_path: ffprobe_path.into() }
    }
}

#[async_trait]
impl MediaAdapter for FfmpegMediaAdapter {
    async fn extract(
        &self,
        source: &Path,
        audio_out: &Path,
        thumbnail_out: &Path,
    ) -> Result<ExtractOutput, MediaError> {
        tracing::info!(source = %source.display(), "extract: probing duration");
        let probe = tokio::process::Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(source)
            .output()
            .await?;
        if !probe.status.success() {
            return Err(MediaError::Decode(String::from_utf8_lossy(&probe.stderr).into_owned()));
        }
        let duration_sec: f64 = String::from_utf8_lossy(&probe.stdout)
            .trim()
            .parse()
            .map_err(|_| MediaError::Decode("ffprobe returned a non-numeric duration".into()))?;

        let audio_status = tokio::process::Command::new(&self.ffmpeg_path)
            .args(["-y", "-i"])
            .arg(source)
            .args(["-ac", "1", "-ar", "16000", "-vn"])
            .arg(audio_out)
            .output()
            .await?;
        if !audio_status.status.success() {
            return Err(MediaError::ProcessFailed(String::from_utf8_lossy(&audio_status.stderr).into_owned()));
        }

        let thumb_status = tokio::process::Command::new(&self.ffmpeg_path)
            .args(["-y", "-i"])
            .arg(source)
            .args(["-frames:v", "1", "-q:v", "3"])
            .arg(thumbnail_out)
            .output()
            .await?;
        if !thumb_status.status.success() {
            return Err(MediaError::ProcessFailed(String::from_utf8_lossy(&thumb_status.stderr).into_owned()));
        }

        Ok(ExtractOutput { audio_path: audio_out.to_path_buf(), thumbnail_path: thumbnail_out.to_path_buf(), duration_sec })
    }

    async fn peaks(&self, audio_path: &Path, bucket_count: usize) -> Result<Vec<f32>, MediaError> {
        let raw = tokio::process::Command::new(&self.ffmpeg_path)
            .args(["-i"])
            .arg(audio_path)
            .args(["-f", "s16le", "-ac", "1", "-ar", "16000", "-"])
            .output()
            .await?;
        if !raw.status.success() {
            return Err(MediaError::ProcessFailed(String::from_utf8_lossy(&raw.stderr).into_owned()));
        }
        Ok(rms_bucket(&raw.stdout, bucket_count))
    }
}

/// RMS-bucket raw little-endian i16 PCM into `bucket_count` peaks in
/// `[-1, 1]`. RMS is used over peak amplitude for visual smoothness.
fn rms_bucket(pcm_bytes: &[u8], bucket_count: usize) -> Vec<f32> {
    if bucket_count == 0 {
        return Vec::new();
    }
    let samples: Vec<i16> =
        pcm_bytes.chunks_exact(2).map(|c| i16::from_le_bytes([c[0], c[1]])).collect();
    if samples.is_empty() {
        return vec![0.0; bucket_count];
    }
    let bucket_len = (samples.len() as f64 / bucket_count as f64).ceil() as usize;
    let bucket_len = bucket_len.max(1);

    samples
        .chunks(bucket_len)
        .map(|chunk| {
            let sum_sq: f64 = chunk.iter().map(|&s| (s as f64 / i16::MAX as f64).powi(2)).sum();
            (sum_sq / chunk.len() as f64).sqrt().clamp(0.0, 1.0) as f32
        })
        .collect()
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Debug, Clone)]
    pub struct FakeExtractCall {
        pub source: PathBuf,
    }

    struct FakeState {
        calls: Vec<FakeExtractCall>,
        duration_sec: f64,
        peaks: Vec<f32>,
        fail: bool,
    }

    /// Scripted double: writes empty placeholder files so downstream code
    /// that merely checks existence works without real media tooling.
    #[derive(Clone)]
    pub struct FakeMediaAdapter {
        inner: Arc<Mutex<FakeState>>,
    }

    impl Default for FakeMediaAdapter {
        fn default() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    calls: Vec::new(),
                    duration_sec: 12.0,
                    peaks: vec![0.1, 0.5, 0.2],
                    fail: false,
                })),
            }
        }
    }

    impl FakeMediaAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_duration_sec(&self, duration_sec: f64) {
            self.inner.lock().duration_sec = duration_sec;
        }

        pub fn set_peaks(&self, peaks: Vec<f32>) {
            self.inner.lock().peaks = peaks;
        }

        pub fn set_fail(&self, fail: bool) {
            self.inner.lock().fail = fail;
        }

        pub fn calls(&self) -> Vec<FakeExtractCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl MediaAdapter for FakeMediaAdapter {
        async fn extract(
            &self,
            source: &Path,
            audio_out: &Path,
            thumbnail_out: &Path,
        ) -> Result<ExtractOutput, MediaError> {
            let mut state = self.inner.lock();
            state.calls.push(FakeExtractCall { source: source.to_path_buf() });
            if state.fail {
                return Err(MediaError::Decode("fake: forced failure".into()));
            }
            let duration_sec = state.duration_sec;
            drop(state);

            if let Some(parent) = audio_out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(audio_out, b"FAKEWAV")?;
            if let Some(parent) = thumbnail_out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(thumbnail_out, b"FAKEJPG")?;

            Ok(ExtractOutput { audio_path: audio_out.to_path_buf(), thumbnail_path: thumbnail_out.to_path_buf(), duration_sec })
        }

        async fn peaks(&self, _audio_path: &Path, bucket_count: usize) -> Result<Vec<f32>, MediaError> {
            let state = self.inner.lock();
            if state.fail {
                return Err(MediaError::Decode("fake: forced failure".into()));
            }
            let mut peaks = state.peaks.clone();
            peaks.resize(bucket_count, 0.0);
            Ok(peaks)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExtractCall, FakeMediaAdapter};

#[cfg(test)]
#[path = "media_tests.rs"]
mod tests;

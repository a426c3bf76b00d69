// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `TjConfig`: one struct loaded from (in priority order) CLI flags >
//! `TJ_*` environment variables > an optional TOML config file > built-in
//! defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tj_core::PhaseWeights;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TjConfig {
    pub root_dir: PathBuf,
    pub bind_addr: String,
    pub auto_resume_on_startup: bool,
    pub sse_heartbeat_seconds: u64,
    pub sse_subscriber_buffer: usize,
    pub default_peaks_samples: usize,
    pub phase_weights: PhaseWeights,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    pub vad_binary_path: PathBuf,
    pub asr_binary_path: PathBuf,
    pub align_binary_path: PathBuf,
    pub separation_binary_path: PathBuf,
}

impl Default for TjConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("./"),
            bind_addr: "127.0.0.1:8787".to_string(),
            auto_resume_on_startup: true,
            sse_heartbeat_seconds: 15,
            sse_subscriber_buffer: 256,
            default_peaks_samples: 2000,
            phase_weights: PhaseWeights::default(),
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            vad_binary_path: PathBuf::from("tj-vad-worker"),
            asr_binary_path: PathBuf::from("tj-asr-worker"),
            align_binary_path: PathBuf::from("tj-align-worker"),
            separation_binary_path: PathBuf::from("tj-separation-worker"),
        }
    }
}

/// Every field optional: `None` means "this layer didn't set it", so a
/// later, lower-priority layer's value survives.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PartialTjConfig {
    pub root_dir: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub auto_resume_on_startup: Option<bool>,
    pub sse_heartbeat_seconds: Option<u64>,
    pub sse_subscriber_buffer: Option<usize>,
    pub default_peaks_samples: Option<usize>,
    pub phase_weights: Option<PhaseWeights>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    pub vad_binary_path: Option<PathBuf>,
    pub asr_binary_path: Option<PathBuf>,
    pub align_binary_path: Option<PathBuf>,
    pub separation_binary_path: Option<PathBuf>,
}

impl TjConfig {
    fn apply(&mut self, over: PartialTjConfig) {
        if let Some(v) = over.root_dir {
            self.root_dir = v;
        }
        if let Some(v) = over.bind_addr {
            self.bind_addr = v;
        }
        if let Some(v) = over.auto_resume_on_startup {
            self.auto_resume_on_startup = v;
        }
        if let Some(v) = over.sse_heartbeat_seconds {
            self.sse_heartbeat_seconds = v;
        }
        if let Some(v) = over.sse_subscriber_buffer {
            self.sse_subscriber_buffer = v;
        }
        if let Some(v) = over.default_peaks_samples {
            self.default_peaks_samples = v;
        }
        if let Some(v) = over.phase_weights {
            self.phase_weights = v;
        }
        if let Some(v) = over.ffmpeg_path {
            self.ffmpeg_path = v;
        }
        if let Some(v) = over.ffprobe_path {
            self.ffprobe_path = v;
        }
        if let Some(v) = over.vad_binary_path {
            self.vad_binary_path = v;
        }
        if let Some(v) = over.asr_binary_path {
            self.asr_binary_path = v;
        }
        if let Some(v) = over.align_binary_path {
            self.align_binary_path = v;
        }
        if let Some(v) = over.separation_binary_path {
            self.separation_binary_path = v;
        }
    }

    /// Build from (lowest to highest priority): built-in defaults, an
    /// optional TOML file, `TJ_*` env vars, then CLI-flag overrides.
    pub fn load(toml_path: Option<&std::path::Path>, cli: PartialTjConfig) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = toml_path {
            if path.exists() {
                let text = std::fs::read_to_string(path)?;
                let from_file: PartialTjConfig = toml::from_str(&text)?;
                config.apply(from_file);
            }
        }

        config.apply(from_env());
        config.apply(cli);
        Ok(config)
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn from_env() -> PartialTjConfig {
    PartialTjConfig {
        root_dir: std::env::var("TJ_ROOT_DIR").ok().map(PathBuf::from),
        bind_addr: std::env::var("TJ_BIND_ADDR").ok(),
        auto_resume_on_startup: env_var("TJ_AUTO_RESUME_ON_STARTUP"),
        sse_heartbeat_seconds: env_var("TJ_SSE_HEARTBEAT_SECONDS"),
        sse_subscriber_buffer: env_var("TJ_SSE_SUBSCRIBER_BUFFER"),
        default_peaks_samples: env_var("TJ_DEFAULT_PEAKS_SAMPLES"),
        phase_weights: None,
        ffmpeg_path: std::env::var("TJ_FFMPEG_PATH").ok().map(PathBuf::from),
        ffprobe_path: std::env::var("TJ_FFPROBE_PATH").ok().map(PathBuf::from),
        vad_binary_path: std::env::var("TJ_VAD_BINARY_PATH").ok().map(PathBuf::from),
        asr_binary_path: std::env::var("TJ_ASR_BINARY_PATH").ok().map(PathBuf::from),
        align_binary_path: std::env::var("TJ_ALIGN_BINARY_PATH").ok().map(PathBuf::from),
        separation_binary_path: std::env::var("TJ_SEPARATION_BINARY_PATH").ok().map(PathBuf::from),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Transcription settings: the one place untyped JSON becomes a frozen,
//! strongly typed config. Per the redesign notes, there is exactly one
//! entry point — [`parse_settings`] — and no dynamically typed config dicts
//! flow past it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelName {
    Tiny,
    Base,
    Small,
    Medium,
    #[serde(rename = "large-v2")]
    LargeV2,
    #[serde(rename = "large-v3")]
    LargeV3,
}

crate::simple_display! {
    ModelName {
        Tiny => "tiny",
        Base => "base",
        Small => "small",
        Medium => "medium",
        LargeV2 => "large-v2",
        LargeV3 => "large-v3",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComputeType {
    Float16,
    Float32,
    Int8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cuda,
    Cpu,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VadConfig {
    pub onset: f32,
    pub offset: f32,
    pub min_speech_ms: u32,
    pub min_silence_ms: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self { onset: 0.65, offset: 0.45, min_speech_ms: 400, min_silence_ms: 400 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemucsMode {
    Auto,
    Always,
    Never,
    OnDemand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnBreak {
    Continue,
    Fallback,
    Fail,
    Pause,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub enabled: bool,
    pub consecutive_threshold: u32,
    pub ratio_threshold: f32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { enabled: true, consecutive_threshold: 3, ratio_threshold: 0.2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemucsSettings {
    pub enabled: bool,
    pub mode: DemucsMode,
    pub weak_model: String,
    pub strong_model: String,
    pub fallback_model: String,
    pub auto_escalation: bool,
    pub max_escalations: u32,
    pub bgm_light_threshold: f32,
    pub bgm_heavy_threshold: f32,
    pub retry_threshold_logprob: f32,
    pub retry_threshold_no_speech: f32,
    pub circuit_breaker: CircuitBreakerConfig,
    pub on_break: OnBreak,
    pub quality_preset: String,
}

impl Default for DemucsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: DemucsMode::Auto,
            weak_model: "htdemucs".to_string(),
            strong_model: "htdemucs_ft".to_string(),
            fallback_model: "htdemucs_ft".to_string(),
            auto_escalation: true,
            max_escalations: 1,
            bgm_light_threshold: 0.3,
            bgm_heavy_threshold: 0.6,
            retry_threshold_logprob: -0.8,
            retry_threshold_no_speech: 0.6,
            circuit_breaker: CircuitBreakerConfig::default(),
            on_break: OnBreak::Continue,
            quality_preset: "balanced".to_string(),
        }
    }
}

impl DemucsSettings {
    /// The breaker never operates when Demucs is disabled entirely,
    /// regardless of the configured `circuit_breaker.enabled`.
    pub fn breaker_active(&self) -> bool {
        self.enabled && self.mode != DemucsMode::Never && self.circuit_breaker.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionSettings {
    pub model: ModelName,
    pub compute_type: ComputeType,
    pub device: Device,
    pub batch_size: u32,
    pub word_timestamps: bool,
    pub vad: VadConfig,
    pub demucs: DemucsSettings,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            model: ModelName::Base,
            compute_type: ComputeType::Float16,
            device: Device::Cpu,
            batch_size: 8,
            word_timestamps: true,
            vad: VadConfig::default(),
            demucs: DemucsSettings::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("unknown model: {0:?}")]
    UnknownModel(String),
    #[error("unknown compute type: {0:?}")]
    UnknownComputeType(String),
    #[error("unknown device: {0:?}")]
    UnknownDevice(String),
    #[error("{field} out of range [{min}, {max}]: got {got}")]
    OutOfRange { field: &'static str, min: f64, max: f64, got: f64 },
    #[error("invalid JSON: {0}")]
    Malformed(String),
}

fn model_from_str(s: &str) -> Result<ModelName, SettingsError> {
    match s {
        "tiny" => Ok(ModelName::Tiny),
        "base" => Ok(ModelName::Base),
        "small" => Ok(ModelName::Small),
        "medium" => Ok(ModelName::Medium),
        "large-v2" => Ok(ModelName::LargeV2),
        "large-v3" => Ok(ModelName::LargeV3),
        other => Err(SettingsError::UnknownModel(other.to_string())),
    }
}

fn compute_type_from_str(s: &str) -> Result<ComputeType, SettingsError> {
    match s {
        "float16" => Ok(ComputeType::Float16),
        "float32" => Ok(ComputeType::Float32),
        "int8" => Ok(ComputeType::Int8),
        other => Err(SettingsError::UnknownComputeType(other.to_string())),
    }
}

fn device_from_str(s: &str) -> Result<Device, SettingsError> {
    match s {
        "cuda" => Ok(Device::Cuda),
        "cpu" => Ok(Device::Cpu),
        other => Err(SettingsError::UnknownDevice(other.to_string())),
    }
}

fn in_range(field: &'static str, got: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    if got < min || got > max {
        Err(SettingsError::OutOfRange { field, min, max, got })
    } else {
        Ok(())
    }
}

/// Parse a `TranscriptionSettings` out of untyped request JSON, applying
/// defaults for every omitted key. This is the only path by which client
/// input becomes a frozen `Settings` value.
pub fn parse_settings(value: &serde_json::Value) -> Result<TranscriptionSettings, SettingsError> {
    let mut settings = TranscriptionSettings::default();
    let obj = value.as_object().ok_or_else(|| SettingsError::Malformed("expected a JSON object".into()))?;

    if let Some(v) = obj.get("model").and_then(|v| v.as_str()) {
        settings.model = model_from_str(v)?;
    }
    if let Some(v) = obj.get("compute_type").and_then(|v| v.as_str()) {
        settings.compute_type = compute_type_from_str(v)?;
    }
    if let Some(v) = obj.get("device").and_then(|v| v.as_str()) {
        settings.device = device_from_str(v)?;
    }
    if let Some(v) = obj.get("batch_size").and_then(|v| v.as_u64()) {
        in_range("batch_size", v as f64, 1.0, 32.0)?;
        settings.batch_size = v as u32;
    }
    if let Some(v) = obj.get("word_timestamps").and_then(|v| v.as_bool()) {
        settings.word_timestamps = v;
    }
    if let Some(vad) = obj.get("vad").and_then(|v| v.as_object()) {
        if let Some(v) = vad.get("onset").and_then(|v| v.as_f64()) {
            in_range("vad.onset", v, 0.0, 1.0)?;
            settings.vad.onset = v as f32;
        }
        if let Some(v) = vad.get("offset").and_then(|v| v.as_f64()) {
            in_range("vad.offset", v, 0.0, 1.0)?;
            settings.vad.offset = v as f32;
        }
        if let Some(v) = vad.get("min_speech_ms").and_then(|v| v.as_u64()) {
            settings.vad.min_speech_ms = v as u32;
        }
        if let Some(v) = vad.get("min_silence_ms").and_then(|v| v.as_u64()) {
            settings.vad.min_silence_ms = v as u32;
        }
    }
    if let Some(demucs) = obj.get("demucs").and_then(|v| v.as_object()) {
        if let Some(v) = demucs.get("enabled").and_then(|v| v.as_bool()) {
            settings.demucs.enabled = v;
        }
        if let Some(v) = demucs.get("mode").and_then(|v| v.as_str()) {
            settings.demucs.mode = match v {
                "auto" => DemucsMode::Auto,
                "always" => DemucsMode::Always,
                "never" => DemucsMode::Never,
                "on_demand" => DemucsMode::OnDemand,
                other => return Err(SettingsError::Malformed(format!("unknown demucs mode: {other:?}"))),
            };
        }
        if let Some(v) = demucs.get("auto_escalation").and_then(|v| v.as_bool()) {
            settings.demucs.auto_escalation = v;
        }
        if let Some(v) = demucs.get("max_escalations").and_then(|v| v.as_u64()) {
            settings.demucs.max_escalations = v as u32;
        }
        if let Some(v) = demucs.get("on_break").and_then(|v| v.as_str()) {
            settings.demucs.on_break = match v {
                "continue" => OnBreak::Continue,
                "fallback" => OnBreak::Fallback,
                "fail" => OnBreak::Fail,
                "pause" => OnBreak::Pause,
                other => return Err(SettingsError::Malformed(format!("unknown on_break: {other:?}"))),
            };
        }
        if let Some(cb) = demucs.get("circuit_breaker").and_then(|v| v.as_object()) {
            if let Some(v) = cb.get("enabled").and_then(|v| v.as_bool()) {
                settings.demucs.circuit_breaker.enabled = v;
            }
            if let Some(v) = cb.get("consecutive_threshold").and_then(|v| v.as_u64()) {
                settings.demucs.circuit_breaker.consecutive_threshold = v as u32;
            }
            if let Some(v) = cb.get("ratio_threshold").and_then(|v| v.as_f64()) {
                in_range("demucs.circuit_breaker.ratio_threshold", v, 0.0, 1.0)?;
                settings.demucs.circuit_breaker.ratio_threshold = v as f32;
            }
        }
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

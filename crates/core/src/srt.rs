// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! SRT subtitle format: parse and serialize.
//!
//! Blocks are separated by a blank line; each block is
//! `index CRLF HH:MM:SS,mmm --> HH:MM:SS,mmm CRLF text CRLF`.
//! Segments marked by the circuit breaker (`on_break = continue`) carry a
//! `[?]` suffix on the text line.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: u32,
    pub start_sec: f64,
    pub end_sec: f64,
    pub text: String,
    pub low_confidence: bool,
}

#[derive(Debug, Error, PartialEq)]
pub enum SrtError {
    #[error("block {0}: malformed timing line")]
    MalformedTiming(u32),
    #[error("block {0}: missing index")]
    MissingIndex(u32),
}

fn format_timestamp(total_sec: f64) -> String {
    let total_ms = (total_sec * 1000.0).round().max(0.0) as u64;
    let ms = total_ms % 1000;
    let total_s = total_ms / 1000;
    let s = total_s % 60;
    let total_m = total_s / 60;
    let m = total_m % 60;
    let h = total_m / 60;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}

fn parse_timestamp(s: &str) -> Option<f64> {
    let (hms, ms) = s.split_once(',')?;
    let mut parts = hms.split(':');
    let h: f64 = parts.next()?.parse().ok()?;
    let m: f64 = parts.next()?.parse().ok()?;
    let sec: f64 = parts.next()?.parse().ok()?;
    let ms: f64 = ms.parse().ok()?;
    Some(h * 3600.0 + m * 60.0 + sec + ms / 1000.0)
}

/// Serialize blocks to SRT text. Appends `[?]` to low-confidence segments.
pub fn serialize(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for (i, block) in blocks.iter().enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(&block.index.to_string());
        out.push_str("\r\n");
        out.push_str(&format_timestamp(block.start_sec));
        out.push_str(" --> ");
        out.push_str(&format_timestamp(block.end_sec));
        out.push_str("\r\n");
        out.push_str(&block.text);
        if block.low_confidence && !block.text.ends_with("[?]") {
            out.push_str(" [?]");
        }
        out.push_str("\r\n");
    }
    out
}

/// Parse SRT text into blocks. Tolerant of `\n`-only line endings on input
/// (many upstream tools emit those), but `serialize` always emits `\r\n`.
pub fn parse(text: &str) -> Result<Vec<SrtBlock>, SrtError> {
    let normalized = text.replace("\r\n", "\n");
    let mut blocks = Vec::new();

    for raw_block in normalized.split("\n\n") {
        let raw_block = raw_block.trim();
        if raw_block.is_empty() {
            continue;
        }
        let mut lines = raw_block.lines();
        let index: u32 = lines.next().and_then(|l| l.trim().parse().ok()).ok_or(SrtError::MissingIndex(0))?;

        let timing_line = lines.next().ok_or(SrtError::MalformedTiming(index))?;
        let (start_str, end_str) =
            timing_line.split_once(" --> ").ok_or(SrtError::MalformedTiming(index))?;
        let start_sec = parse_timestamp(start_str.trim()).ok_or(SrtError::MalformedTiming(index))?;
        let end_sec = parse_timestamp(end_str.trim()).ok_or(SrtError::MalformedTiming(index))?;

        let text_lines: Vec<&str> = lines.collect();
        let mut text = text_lines.join("\r\n");
        let low_confidence = text.trim_end().ends_with("[?]");
        if low_confidence {
            text = text.trim_end().trim_end_matches("[?]").trim_end().to_string();
        }

        blocks.push(SrtBlock { index, start_sec, end_sec, text, low_confidence });
    }

    Ok(blocks)
}

#[cfg(test)]
#[path = "srt_tests.rs"]
mod tests;

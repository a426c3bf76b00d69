// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Pipeline phases and the weight table used to compute global `percent`.

use serde::{Deserialize, Serialize};

/// A named stage of the transcription pipeline. Phases advance monotonically
/// within a run; a checkpoint resume may rewind to an earlier phase but
/// never skips one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Pending,
    Extract,
    BgmDetect,
    DemucsGlobal,
    Split,
    Transcribe,
    Align,
    Srt,
    Complete,
}

crate::simple_display! {
    Phase {
        Pending => "pending",
        Extract => "extract",
        BgmDetect => "bgm_detect",
        DemucsGlobal => "demucs_global",
        Split => "split",
        Transcribe => "transcribe",
        Align => "align",
        Srt => "srt",
        Complete => "complete",
    }
}

impl Phase {
    /// All phases in pipeline order, including the non-weighted bookends.
    pub const ORDER: [Phase; 9] = [
        Phase::Pending,
        Phase::Extract,
        Phase::BgmDetect,
        Phase::DemucsGlobal,
        Phase::Split,
        Phase::Transcribe,
        Phase::Align,
        Phase::Srt,
        Phase::Complete,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|p| *p == self).expect("Phase::ORDER is exhaustive")
    }
}

/// Phase weights used to map `phase_percent` onto the global `percent`.
/// Weights sum to 100 across the seven weighted phases (`pending` and
/// `complete` carry no weight of their own).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseWeights {
    pub extract: u32,
    pub bgm_detect: u32,
    pub demucs_global: u32,
    pub split: u32,
    pub transcribe: u32,
    pub align: u32,
    pub srt: u32,
}

impl Default for PhaseWeights {
    fn default() -> Self {
        Self { extract: 5, bgm_detect: 3, demucs_global: 7, split: 5, transcribe: 50, align: 20, srt: 10 }
    }
}

impl PhaseWeights {
    pub fn total(&self) -> u32 {
        self.extract + self.bgm_detect + self.demucs_global + self.split + self.transcribe + self.align + self.srt
    }

    fn weight_of(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Pending | Phase::Complete => 0,
            Phase::Extract => self.extract,
            Phase::BgmDetect => self.bgm_detect,
            Phase::DemucsGlobal => self.demucs_global,
            Phase::Split => self.split,
            Phase::Transcribe => self.transcribe,
            Phase::Align => self.align,
            Phase::Srt => self.srt,
        }
    }

    /// `percent = sum(weight_of_completed) + weight_of_current * phase_percent/100`,
    /// clamped to `[0, 100]`.
    pub fn percent(&self, current: Phase, phase_percent: u32) -> u32 {
        if current == Phase::Complete {
            return 100;
        }
        let completed: u32 =
            Phase::ORDER.iter().copied().filter(|p| p.index() < current.index()).map(|p| self.weight_of(p)).sum();
        let phase_percent = phase_percent.min(100);
        let current_contribution = self.weight_of(current) * phase_percent / 100;
        (completed + current_contribution).min(100)
    }
}

#[cfg(test)]
#[path = "phase_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! Pure `bgm_detect` decision logic: three sampled ratios in, one
//! `BgmLevel` out. Kept separate from the sampling I/O in
//! `Executor::run_bgm_detect` so the threshold logic is trivially testable.

use tj_core::BgmLevel;

/// `max(ratios) > heavy_threshold -> heavy`, else `> light_threshold ->
/// light`, else `none`. Max rather than mean: a single strong BGM section
/// should upgrade the whole job to global separation.
pub fn decide_bgm_level(ratios: &[f32], light_threshold: f32, heavy_threshold: f32) -> BgmLevel {
    let max = ratios.iter().copied().fold(0.0_f32, f32::max);
    if max > heavy_threshold {
        BgmLevel::Heavy
    } else if max > light_threshold {
        BgmLevel::Light
    } else {
        BgmLevel::None
    }
}

#[cfg(test)]
#[path = "bgm_tests.rs"]
mod tests;

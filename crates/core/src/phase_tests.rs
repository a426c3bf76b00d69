// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use super::*;

#[test]
fn default_weights_sum_to_100() {
    assert_eq!(PhaseWeights::default().total(), 100);
}

#[test]
fn percent_at_pending_is_zero() {
    let w = PhaseWeights::default();
    assert_eq!(w.percent(Phase::Pending, 0), 0);
}

#[test]
fn percent_at_complete_is_always_100() {
    let w = PhaseWeights::default();
    assert_eq!(w.percent(Phase::Complete, 0), 100);
}

#[test]
fn percent_mid_transcribe_sums_completed_plus_partial_current() {
    let w = PhaseWeights::default();
    // extract(5) + bgm_detect(3) + demucs_global(7) + split(5) = 20 completed
    let got = w.percent(Phase::Transcribe, 50);
    assert_eq!(got, 20 + 50 * 50 / 100);
}

#[test]
fn percent_never_exceeds_100() {
    let w = PhaseWeights::default();
    assert_eq!(w.percent(Phase::Srt, 100), 100);
}

#[test]
fn phase_order_is_monotonic_for_index_lookups() {
    assert!(Phase::Extract < Phase::Transcribe);
    assert!(Phase::Transcribe < Phase::Align);
    assert!(Phase::Align < Phase::Complete);
}

#[test]
fn display_matches_wire_names() {
    assert_eq!(Phase::BgmDetect.to_string(), "bgm_detect");
    assert_eq!(Phase::DemucsGlobal.to_string(), "demucs_global");
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! The Phase Executor: drives one `Job` through its pipeline phases,
//! persisting a resumable `Checkpoint` at every phase boundary and after
//! every transcribed segment, and publishing progress over the per-job
//! `JobHub`. The public `run` entry point only adds timing/outcome tracing
//! around the actual state machine in `run_inner`.

use crate::bgm::decide_bgm_level;
use crate::interrupt::{Interrupt, InterruptKind};
use std::path::PathBuf;
use std::sync::Arc;
use tj_adapters::{
    AlignAdapter, AlignError, AsrAdapter, AsrError, AsrResult, MediaAdapter, SeparationAdapter, SeparationError,
    VadAdapter, VadError,
};
use tj_core::{
    breaker, BgmLevel, BreakReason, BreakerDecision, Checkpoint, Clock, DemucsMode, Job, JobError, JobEvent, JobStatus,
    Phase, PhaseWeights, Segment, SegmentQuality, TranscriptionSettings,
};
use tj_hub::{signal_event, JobHub};
use tj_storage::ArtifactStore;

/// Outcome of one [`Executor::run`] call. A cooperative pause/cancel (or a
/// `pause` circuit-breaker action) ends the run without marking the job
/// terminal; the Supervisor decides what happens to the runner slot next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Paused,
    Canceled,
}

/// Drives a single job's pipeline. Generic over the five adapter traits and
/// the clock so tests can wire in fakes without touching production code.
pub struct Executor<M, V, R, L, P, C> {
    media: M,
    vad: V,
    asr: R,
    align: L,
    separation: P,
    store: Arc<ArtifactStore>,
    hub: Arc<JobHub>,
    weights: PhaseWeights,
    clock: C,
}

impl<M, V, R, L, P, C> Executor<M, V, R, L, P, C>
where
    M: MediaAdapter,
    V: VadAdapter,
    R: AsrAdapter,
    L: AlignAdapter,
    P: SeparationAdapter,
    C: Clock,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        media: M,
        vad: V,
        asr: R,
        align: L,
        separation: P,
        store: Arc<ArtifactStore>,
        hub: Arc<JobHub>,
        weights: PhaseWeights,
        clock: C,
    ) -> Self {
        Self { media, vad, asr, align, separation, store, hub, weights, clock }
    }

    /// Drive `job` to completion, a cooperative pause/cancel, or a terminal
    /// failure. `paths` must already exist (the Registry creates the job
    /// directory on `create`).
    pub async fn run(&self, job: &mut Job, paths: &tj_core::JobPaths, interrupt: &Interrupt) -> Result<RunOutcome, JobError> {
        let started = self.clock.now();
        tracing::info!(job_id = %job.id, phase = %job.phase, "executor: run started");
        let result = self.run_inner(job, paths, interrupt).await;
        let elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64;
        match &result {
            Ok(outcome) => tracing::info!(job_id = %job.id, ?outcome, elapsed_ms, "executor: run finished"),
            Err(error) => tracing::error!(job_id = %job.id, %error, elapsed_ms, "executor: run failed"),
        }
        result
    }

    async fn run_inner(
        &self,
        job: &mut Job,
        paths: &tj_core::JobPaths,
        interrupt: &Interrupt,
    ) -> Result<RunOutcome, JobError> {
        let settings = job
            .settings
            .clone()
            .ok_or_else(|| JobError::InputMissing { path: "job has no frozen settings".into() })?;

        let mut checkpoint = match self.store.load_checkpoint(job.id) {
            Ok(Some(cp)) => cp,
            Ok(None) => Checkpoint::fresh(self.clock.epoch_ms()),
            Err(e) => return Err(JobError::CheckpointCorrupt { detail: e.to_string() }),
        };
        if !checkpoint.is_consistent() {
            return Err(JobError::CheckpointCorrupt { detail: "checkpoint failed the ordering/range invariant".into() });
        }

        job.status = JobStatus::Processing;
        job.last_error = None;

        let outcome = self.drive(job, &settings, paths, &mut checkpoint, interrupt).await;

        if let Err(ref error) = outcome {
            job.last_error = Some(error.clone());
            job.mark_terminal(JobStatus::Failed, self.clock.epoch_ms());
            let _ = self.store.save_state(job);
            let _ = self.store.save_checkpoint(job.id, &checkpoint);
            self.hub.publish(job.id, signal_event(JobStatus::Failed, error.to_string()));
        }

        outcome
    }

    async fn drive(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
        interrupt: &Interrupt,
    ) -> Result<RunOutcome, JobError> {
        loop {
            if let Some(outcome) = self.poll_interrupt(job, checkpoint, interrupt)? {
                return Ok(outcome);
            }

            match checkpoint.phase {
                Phase::Pending => {
                    checkpoint.phase = Phase::Extract;
                    self.persist(job, checkpoint)?;
                }
                Phase::Extract => self.run_extract(job, paths, checkpoint).await?,
                Phase::BgmDetect => self.run_bgm_detect(job, settings, paths, checkpoint).await?,
                Phase::DemucsGlobal => self.run_demucs_global(job, settings, paths, checkpoint).await?,
                Phase::Split => self.run_split(job, settings, paths, checkpoint).await?,
                Phase::Transcribe => {
                    if let Some(outcome) = self.run_transcribe_step(job, settings, paths, checkpoint).await? {
                        return Ok(outcome);
                    }
                }
                Phase::Align => self.run_align(job, settings, paths, checkpoint).await?,
                Phase::Srt => self.run_srt(job, paths, checkpoint)?,
                Phase::Complete => {
                    job.mark_terminal(JobStatus::Finished, self.clock.epoch_ms());
                    self.persist(job, checkpoint)?;
                    self.hub.publish(job.id, signal_event(JobStatus::Finished, "transcription complete"));
                    return Ok(RunOutcome::Completed);
                }
            }
        }
    }

    /// Polled at every phase boundary and after every segment.
    fn poll_interrupt(
        &self,
        job: &mut Job,
        checkpoint: &mut Checkpoint,
        interrupt: &Interrupt,
    ) -> Result<Option<RunOutcome>, JobError> {
        match interrupt.check() {
            Some(InterruptKind::Cancel) => {
                job.mark_terminal(JobStatus::Canceled, self.clock.epoch_ms());
                self.persist(job, checkpoint)?;
                self.hub.publish(job.id, signal_event(JobStatus::Canceled, "canceled by request"));
                Ok(Some(RunOutcome::Canceled))
            }
            Some(InterruptKind::Pause) => {
                job.status = JobStatus::Paused;
                job.updated_at_epoch_ms = self.clock.epoch_ms();
                self.persist(job, checkpoint)?;
                self.hub.publish(job.id, signal_event(JobStatus::Paused, "paused by request"));
                Ok(Some(RunOutcome::Paused))
            }
            None => Ok(None),
        }
    }

    fn persist(&self, job: &Job, checkpoint: &Checkpoint) -> Result<(), JobError> {
        self.store.save_state(job).map_err(|e| JobError::TransientIoError { detail: e.to_string() })?;
        self.store
            .save_checkpoint(job.id, checkpoint)
            .map_err(|e| JobError::TransientIoError { detail: e.to_string() })
    }

    fn publish_progress(
        &self,
        job: &mut Job,
        checkpoint: &Checkpoint,
        phase_percent: u32,
        message: impl Into<String>,
    ) -> Result<(), JobError> {
        job.phase = checkpoint.phase;
        job.phase_percent = phase_percent.min(100);
        job.percent = self.weights.percent(checkpoint.phase, job.phase_percent);
        job.message = message.into();
        job.updated_at_epoch_ms = self.clock.epoch_ms();
        self.persist(job, checkpoint)?;
        self.hub.publish(
            job.id,
            JobEvent::Progress {
                phase: job.phase,
                percent: job.percent,
                phase_percent: job.phase_percent,
                message: job.message.clone(),
                processed: checkpoint.processed_indices.len() as u32,
                total: checkpoint.total_segments,
                language: job.language.clone(),
            },
        );
        Ok(())
    }

    /// Resume uses `vocals.wav` once global separation has run and a
    /// `fallback` circuit-breaker action hasn't reverted it.
    fn audio_source(&self, paths: &tj_core::JobPaths, checkpoint: &Checkpoint) -> PathBuf {
        if checkpoint.demucs_state.global_separation_done && checkpoint.circuit_breaker_state.using_separated_vocals {
            paths.vocals_wav()
        } else {
            paths.audio_wav()
        }
    }

    async fn run_extract(&self, job: &mut Job, paths: &tj_core::JobPaths, checkpoint: &mut Checkpoint) -> Result<(), JobError> {
        let out = self
            .media
            .extract(&paths.input_path, &paths.audio_wav(), &paths.thumbnail_jpg())
            .await
            .map_err(|e| JobError::MediaDecodeError { detail: e.to_string() })?;
        checkpoint.duration_sec = out.duration_sec;
        checkpoint.phase = Phase::BgmDetect;
        self.publish_progress(job, checkpoint, 100, "extracted audio and thumbnail")
    }

    /// bgm_detect: sample three 10s windows at 15%/50%/85% of the
    /// timeline, run the separation primitive on each, and decide `BgmLevel`
    /// from the max of the three `bgm_ratio`s. Only runs when Demucs is
    /// enabled and in `auto` mode -- `always`/`never`/`on_demand` skip it.
    async fn run_bgm_detect(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
    ) -> Result<(), JobError> {
        if !(settings.demucs.enabled && settings.demucs.mode == DemucsMode::Auto) {
            checkpoint.phase = Phase::DemucsGlobal;
            return self.publish_progress(job, checkpoint, 100, "background-music detection skipped");
        }

        let duration = checkpoint.duration_sec;
        let mut ratios = Vec::with_capacity(3);
        for (i, fraction) in [0.15_f64, 0.50, 0.85].into_iter().enumerate() {
            let center = duration * fraction;
            let start = (center - 5.0).max(0.0);
            let end = (start + 10.0).min(duration).max(start);
            let sample_out = paths.job_dir.join(format!("bgm_sample_{i}.wav"));
            let levels = self
                .separation
                .separate(&paths.audio_wav(), start, end, &sample_out, &settings.demucs.weak_model)
                .await
                .map_err(|e| map_separation_error(e, "bgm_detect"))?;
            ratios.push(levels.bgm_ratio());
            let _ = std::fs::remove_file(&sample_out);
            self.publish_progress(job, checkpoint, ((i as u32 + 1) * 100) / 3, "sampling for background music")?;
        }

        checkpoint.demucs_state.bgm_ratios = ratios.clone();
        checkpoint.demucs_state.bgm_level =
            decide_bgm_level(&ratios, settings.demucs.bgm_light_threshold, settings.demucs.bgm_heavy_threshold);
        checkpoint.phase = Phase::DemucsGlobal;
        self.hub.publish(
            job.id,
            JobEvent::SeparationStrategy { bgm_level: checkpoint.demucs_state.bgm_level, using_separated_vocals: false },
        );
        self.publish_progress(job, checkpoint, 100, "background-music detection complete")
    }

    /// demucs_global: runs when `BgmLevel::Heavy` was decided (auto
    /// mode) or Demucs is forced on for the whole file (`always` mode).
    async fn run_demucs_global(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
    ) -> Result<(), JobError> {
        let should_run = settings.demucs.enabled
            && match settings.demucs.mode {
                DemucsMode::Always => true,
                DemucsMode::Auto => checkpoint.demucs_state.bgm_level == BgmLevel::Heavy,
                DemucsMode::Never | DemucsMode::OnDemand => false,
            };

        if !should_run {
            checkpoint.phase = Phase::Split;
            return self.publish_progress(job, checkpoint, 100, "global vocal separation skipped");
        }

        let model = checkpoint.demucs_state.current_model.clone().unwrap_or_else(|| settings.demucs.strong_model.clone());
        let vocals_out = paths.vocals_wav();
        self.separation
            .separate(&paths.audio_wav(), 0.0, checkpoint.duration_sec, &vocals_out, &model)
            .await
            .map_err(|e| map_separation_error(e, "demucs_global"))?;

        checkpoint.demucs_state.global_separation_done = true;
        checkpoint.demucs_state.vocals_path = Some(vocals_out.to_string_lossy().into_owned());
        checkpoint.demucs_state.current_model = Some(model);
        checkpoint.circuit_breaker_state.using_separated_vocals = true;
        checkpoint.phase = Phase::Split;
        self.hub.publish(
            job.id,
            JobEvent::SeparationStrategy { bgm_level: checkpoint.demucs_state.bgm_level, using_separated_vocals: true },
        );
        self.publish_progress(job, checkpoint, 100, "global vocal separation complete")
    }

    async fn run_split(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
    ) -> Result<(), JobError> {
        let audio_source = self.audio_source(paths, checkpoint);
        let spans = self.vad.detect(&audio_source, &settings.vad).await.map_err(map_vad_error)?;
        checkpoint.segments = spans
            .into_iter()
            .enumerate()
            .map(|(i, span)| Segment {
                index: i as u32,
                start_sec: span.start_sec,
                end_sec: span.end_sec,
                text: None,
                words: Vec::new(),
                avg_logprob: None,
                no_speech_prob: None,
                low_confidence_marker: false,
            })
            .collect();
        checkpoint.total_segments = checkpoint.segments.len() as u32;
        checkpoint.phase = Phase::Transcribe;
        self.publish_progress(job, checkpoint, 100, "voice activity detection complete")
    }

    /// Processes exactly one unprocessed segment per call, so the outer
    /// `drive` loop's interrupt poll runs between every segment.
    /// Implements the four-step `transcribe` contract.
    async fn run_transcribe_step(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
    ) -> Result<Option<RunOutcome>, JobError> {
        let Some(pos) = checkpoint.segments.iter().position(|s| !checkpoint.processed_indices.contains(&s.index)) else {
            checkpoint.phase = Phase::Align;
            self.publish_progress(job, checkpoint, 100, "transcription complete")?;
            return Ok(None);
        };

        let segment = checkpoint.segments[pos].clone();
        let audio_source = self.audio_source(paths, checkpoint);

        // Step 1 & the initial half of step 2.
        let mut result = self
            .asr
            .transcribe(&audio_source, segment.start_sec, segment.end_sec, settings)
            .await
            .map_err(map_asr_error)?;

        if job.language.is_none() {
            if let Some(language) = &result.language {
                job.language = Some(language.clone());
            }
        }

        if settings.demucs.enabled && !checkpoint.demucs_state.global_separation_done && is_low_quality(&result, settings) {
            if let Some(retried) = self.retry_with_separation(&segment, settings, paths, checkpoint).await? {
                if retried.avg_logprob > result.avg_logprob {
                    result = retried;
                }
            }
        }

        // Step 3: update circuit-breaker counters before evaluating.
        if is_low_quality(&result, settings) {
            breaker::record_retry(&mut checkpoint.circuit_breaker_state);
        } else {
            breaker::record_success(&mut checkpoint.circuit_breaker_state);
        }

        {
            let stored = &mut checkpoint.segments[pos];
            stored.text = Some(result.text);
            stored.words = result.words;
            stored.avg_logprob = Some(result.avg_logprob);
            stored.no_speech_prob = Some(result.no_speech_prob);
        }
        checkpoint.processed_indices.insert(segment.index);

        let decision = if settings.demucs.breaker_active() {
            breaker::evaluate(
                &checkpoint.circuit_breaker_state,
                &settings.demucs.circuit_breaker,
                settings.demucs.on_break,
                settings.demucs.max_escalations,
                settings.demucs.auto_escalation,
            )
        } else {
            BreakerDecision::Proceed
        };

        self.apply_breaker_decision(job, settings, checkpoint, pos, segment.index, decision);

        // Step 4: write checkpoint; publish a `segment` event.
        let phase_percent = (checkpoint.processed_indices.len() as u32 * 100) / checkpoint.total_segments.max(1);
        self.publish_progress(job, checkpoint, phase_percent, format!("transcribed segment {}", segment.index))?;
        self.hub.publish(job.id, JobEvent::Segment { segment: checkpoint.segments[pos].clone() });

        match decision {
            BreakerDecision::Break(BreakReason::Fail) => Err(JobError::CircuitBreakerOpen),
            BreakerDecision::Break(BreakReason::Pause) => {
                job.status = JobStatus::Paused;
                job.updated_at_epoch_ms = self.clock.epoch_ms();
                self.persist(job, checkpoint)?;
                self.hub.publish(job.id, signal_event(JobStatus::Paused, "paused by circuit breaker"));
                Ok(Some(RunOutcome::Paused))
            }
            _ => Ok(None),
        }
    }

    /// Decision priority: escalate wins over act-per-`on_break`,
    /// which wins over proceeding normally. `fail`/`pause` are acted on by
    /// the caller since they change control flow; this only updates state
    /// and emits the informational events.
    fn apply_breaker_decision(
        &self,
        job: &Job,
        settings: &TranscriptionSettings,
        checkpoint: &mut Checkpoint,
        segment_pos: usize,
        segment_index: u32,
        decision: BreakerDecision,
    ) {
        match decision {
            BreakerDecision::Proceed => {}
            BreakerDecision::Escalate => {
                let from_model =
                    checkpoint.demucs_state.current_model.clone().unwrap_or_else(|| settings.demucs.weak_model.clone());
                let to_model = settings.demucs.fallback_model.clone();
                checkpoint.demucs_state.current_model = Some(to_model.clone());
                checkpoint.demucs_state.escalation_count += 1;
                checkpoint.demucs_state.retry_triggered = true;
                checkpoint.circuit_breaker_state.consecutive_retries = 0;
                checkpoint.circuit_breaker_state.escalation_count = checkpoint.demucs_state.escalation_count;
                self.hub.publish(
                    job.id,
                    JobEvent::ModelEscalated {
                        from_model,
                        to_model,
                        escalation_count: checkpoint.demucs_state.escalation_count,
                    },
                );
            }
            BreakerDecision::Break(BreakReason::Continue) => {
                checkpoint.segments[segment_pos].low_confidence_marker = true;
                self.hub.publish(
                    job.id,
                    JobEvent::CircuitBreakerHandled { reason: "continue".into(), segment_index },
                );
            }
            BreakerDecision::Break(BreakReason::Fallback) => {
                checkpoint.circuit_breaker_state.using_separated_vocals = false;
                self.hub.publish(
                    job.id,
                    JobEvent::CircuitBreakerHandled { reason: "fallback".into(), segment_index },
                );
            }
            BreakerDecision::Break(BreakReason::Fail) | BreakerDecision::Break(BreakReason::Pause) => {}
        }
    }

    /// Per-segment retry with a 2s pre/post buffer to preserve speech onset.
    /// Swallows separation/ASR failures -- a failed retry
    /// just means the first-pass result stands.
    async fn retry_with_separation(
        &self,
        segment: &Segment,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &Checkpoint,
    ) -> Result<Option<AsrResult>, JobError> {
        let buffer_start = (segment.start_sec - 2.0).max(0.0);
        let buffer_end = if checkpoint.duration_sec > 0.0 {
            (segment.end_sec + 2.0).min(checkpoint.duration_sec)
        } else {
            segment.end_sec + 2.0
        };
        let model = checkpoint.demucs_state.current_model.clone().unwrap_or_else(|| settings.demucs.weak_model.clone());
        let retry_wav = paths.job_dir.join(format!("segment_{:04}_vocals.wav", segment.index));

        if self.separation.separate(&paths.audio_wav(), buffer_start, buffer_end, &retry_wav, &model).await.is_err() {
            return Ok(None);
        }

        let offset = segment.start_sec - buffer_start;
        let retried =
            self.asr.transcribe(&retry_wav, offset, offset + (segment.end_sec - segment.start_sec), settings).await.ok();
        let _ = std::fs::remove_file(&retry_wav);
        Ok(retried)
    }

    async fn run_align(
        &self,
        job: &mut Job,
        settings: &TranscriptionSettings,
        paths: &tj_core::JobPaths,
        checkpoint: &mut Checkpoint,
    ) -> Result<(), JobError> {
        if !settings.word_timestamps || checkpoint.segments.is_empty() {
            checkpoint.phase = Phase::Srt;
            return self.publish_progress(job, checkpoint, 100, "alignment skipped");
        }

        // Atomic: a failure here leaves `checkpoint.phase` at `Align`, so a
        // resumed run re-does the whole alignment rather than patching it.
        let audio_source = self.audio_source(paths, checkpoint);
        let per_segment_words = self.align.align(&audio_source, &checkpoint.segments).await.map_err(map_align_error)?;

        for (segment, words) in checkpoint.segments.iter_mut().zip(per_segment_words.into_iter()) {
            let words_count = words.len();
            segment.words = words;
            self.hub.publish(job.id, JobEvent::Aligned { index: segment.index, words_count });
        }

        checkpoint.phase = Phase::Srt;
        self.publish_progress(job, checkpoint, 100, "alignment complete")
    }

    fn run_srt(&self, job: &mut Job, paths: &tj_core::JobPaths, checkpoint: &mut Checkpoint) -> Result<(), JobError> {
        let blocks: Vec<tj_core::SrtBlock> = checkpoint
            .segments
            .iter()
            .map(|s| tj_core::SrtBlock {
                index: s.index + 1,
                start_sec: s.start_sec,
                end_sec: s.end_sec,
                text: s.text.clone().unwrap_or_default(),
                low_confidence: s.low_confidence_marker,
            })
            .collect();
        let srt_text = tj_core::srt::serialize(&blocks);
        tj_storage::write_atomic(&paths.subtitles_srt(), srt_text.as_bytes())
            .map_err(|e| JobError::TransientIoError { detail: e.to_string() })?;

        checkpoint.phase = Phase::Complete;
        self.publish_progress(job, checkpoint, 100, "subtitles written")
    }
}

fn is_low_quality(result: &AsrResult, settings: &TranscriptionSettings) -> bool {
    SegmentQuality { avg_logprob: result.avg_logprob, no_speech_prob: result.no_speech_prob }
        .is_low_quality(settings.demucs.retry_threshold_logprob, settings.demucs.retry_threshold_no_speech)
}

fn map_separation_error(err: SeparationError, phase: &str) -> JobError {
    match err {
        SeparationError::ModelLoad { model, detail } => JobError::ModelLoadError { model, detail },
        SeparationError::ProcessFailed(detail) => JobError::TransientIoError { detail: format!("{phase}: {detail}") },
        SeparationError::Io(e) => JobError::TransientIoError { detail: e.to_string() },
    }
}

fn map_vad_error(err: VadError) -> JobError {
    match err {
        VadError::ProcessFailed(detail) => JobError::TransientIoError { detail },
        VadError::Io(e) => JobError::TransientIoError { detail: e.to_string() },
    }
}

fn map_align_error(err: AlignError) -> JobError {
    match err {
        AlignError::ProcessFailed(detail) => JobError::TransientIoError { detail },
    }
}

fn map_asr_error(err: AsrError) -> JobError {
    match err {
        AsrError::ModelLoad { model, detail } => JobError::ModelLoadError { model, detail },
        AsrError::GpuOutOfMemory => JobError::GpuOutOfMemory { phase: "transcribe".into() },
        AsrError::ProcessFailed(detail) => JobError::TransientIoError { detail },
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `tj`: the Transcription Job Orchestrator CLI — `serve` runs the HTTP/SSE
//! API, `doctor` preflights the environment, `status`/`queue` are thin
//! clients against a running server. Every command function returns an
//! [`exit_error::ExitError`] carrying a process exit code; `main` is the
//! only place that calls `std::process::exit`.

mod commands;
mod config;
mod exit_error;
mod output;

use clap::{Parser, Subcommand};
use config::{PartialTjConfig, TjConfig};
use exit_error::{ExitError, EX_OK, EX_USAGE};
use output::OutputFormat;
use std::path::PathBuf;

/// Shared flags for commands that build a full [`TjConfig`] (`serve`,
/// `doctor`). A flag left unset here falls through to `TJ_*` env vars, then
/// the TOML file, then the built-in defaults.
#[derive(clap::Args, Debug, Default)]
struct ConfigArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    root_dir: Option<PathBuf>,
    #[arg(long)]
    bind_addr: Option<String>,
    #[arg(long)]
    auto_resume_on_startup: Option<bool>,
    #[arg(long)]
    sse_heartbeat_seconds: Option<u64>,
    #[arg(long)]
    sse_subscriber_buffer: Option<usize>,
    #[arg(long)]
    default_peaks_samples: Option<usize>,
    #[arg(long)]
    ffmpeg_path: Option<PathBuf>,
    #[arg(long)]
    ffprobe_path: Option<PathBuf>,
    #[arg(long)]
    vad_binary_path: Option<PathBuf>,
    #[arg(long)]
    asr_binary_path: Option<PathBuf>,
    #[arg(long)]
    align_binary_path: Option<PathBuf>,
    #[arg(long)]
    separation_binary_path: Option<PathBuf>,
}

impl ConfigArgs {
    fn resolve(&self) -> Result<TjConfig, ExitError> {
        let cli = PartialTjConfig {
            root_dir: self.root_dir.clone(),
            bind_addr: self.bind_addr.clone(),
            auto_resume_on_startup: self.auto_resume_on_startup,
            sse_heartbeat_seconds: self.sse_heartbeat_seconds,
            sse_subscriber_buffer: self.sse_subscriber_buffer,
            default_peaks_samples: self.default_peaks_samples,
            phase_weights: None,
            ffmpeg_path: self.ffmpeg_path.clone(),
            ffprobe_path: self.ffprobe_path.clone(),
            vad_binary_path: self.vad_binary_path.clone(),
            asr_binary_path: self.asr_binary_path.clone(),
            align_binary_path: self.align_binary_path.clone(),
            separation_binary_path: self.separation_binary_path.clone(),
        };
        TjConfig::load(self.config.as_deref(), cli).map_err(ExitError::from)
    }
}

#[derive(Parser, Debug)]
#[command(name = "tj", version, about = "Transcription Job Orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP/SSE API server.
    Serve {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Check that the root directory and worker binaries are usable.
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print one job's current state.
    Status {
        job_id: String,
        #[arg(long, default_value = "http://127.0.0.1:8787")]
        base_url: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Print the queue and the currently running job.
    Queue {
        #[arg(long, default_value = "http://127.0.0.1:8787")]
        base_url: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

async fn dispatch(cli: Cli) -> Result<(), ExitError> {
    match cli.command {
        Commands::Serve { config } => commands::serve::run(config.resolve()?).await,
        Commands::Doctor { config } => {
            let report = commands::doctor::run(&config.resolve()?)?;
            commands::doctor::print_text(&report);
            if report.all_ok() {
                Ok(())
            } else {
                Err(ExitError::internal("one or more doctor checks failed"))
            }
        }
        Commands::Status { job_id, base_url, format } => commands::status::run(&base_url, &job_id, format).await,
        Commands::Queue { base_url, format } => commands::queue::run(&base_url, format).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            err.print().ok();
            let code = if err.exit_code() == 0 { EX_OK } else { EX_USAGE };
            std::process::exit(code);
        }
    };

    match dispatch(cli).await {
        Ok(()) => std::process::exit(EX_OK),
        Err(err) => {
            tracing::error!(%err, code = err.code, "tj: command failed");
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

//! `tj status <job-id>`: a thin HTTP client against a running `tj serve` —
//! build a request, deserialize the JSON body, print text or JSON per
//! `--format`.

use crate::exit_error::ExitError;
use crate::output::{format_or_json, OutputFormat};
use tj_core::Job;

pub async fn run(base_url: &str, job_id: &str, format: OutputFormat) -> Result<(), ExitError> {
    let url = format!("{}/api/status/{}", base_url.trim_end_matches('/'), job_id);
    let response = reqwest::get(&url).await.map_err(|err| ExitError::internal(err.to_string()))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(ExitError::internal(format!("server returned {status}: {body}")));
    }

    let job: Job = response.json().await.map_err(|err| ExitError::internal(err.to_string()))?;
    format_or_json(format, &job, || {
        println!(
            "{}  status={}  phase={}  percent={}  {}",
            job.id, job.status, job.phase, job.percent, job.message
        );
    })
    .map_err(ExitError::from)
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;

// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Transcription Job Orchestrator Contributors

use crate::config::TjConfig;

#[tokio::test]
async fn binding_to_an_unparsable_address_is_an_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = TjConfig { root_dir: dir.path().to_path_buf(), bind_addr: "not-an-address".to_string(), ..Default::default() };

    let err = super::run(config).await.unwrap_err();
    assert_eq!(err.code, crate::exit_error::EX_SOFTWARE);
}

//! Import command handler.
//!
//! Ingests every manifest under the data directory once.

use super::{build_ingestor, exit_codes};
use crate::config::AppConfig;
use anyhow::{bail, Result};

/// Run one ingestion pass over `config.ingest.data_dir`.
pub fn run_import(config: &AppConfig) -> Result<i32> {
    let data_dir = &config.ingest.data_dir;
    if !data_dir.is_dir() {
        bail!("data directory does not exist: {}", data_dir.display());
    }

    let ingestor = build_ingestor(config)?;
    if !ingestor.client().is_alive() {
        tracing::warn!(
            "Store at {} did not report a healthy node; continuing",
            config.session_config().endpoint
        );
    }

    let report = ingestor.ingest_directory(data_dir);
    report.log_summary();

    if report.has_failures() {
        Ok(exit_codes::INGEST_FAILURES)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}

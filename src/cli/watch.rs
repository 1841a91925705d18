//! CLI handler for the `watch` subcommand.

use super::{build_ingestor, exit_codes};
use crate::config::AppConfig;
use crate::watch::{run_watch_loop, WatchConfig};
use anyhow::Result;

/// Run the watch loop until interrupted (or after one scan with `once`).
pub fn run_watch(config: &AppConfig, watch: &WatchConfig) -> Result<i32> {
    watch.validate()?;
    let ingestor = build_ingestor(config)?;
    let report = run_watch_loop(watch, &ingestor)?;
    report.log_summary();
    Ok(if report.has_failures() {
        exit_codes::INGEST_FAILURES
    } else {
        exit_codes::SUCCESS
    })
}

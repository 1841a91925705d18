//! CLI command handlers.
//!
//! Testable command handlers invoked by `main.rs`. Each returns the process
//! exit code; the caller exits with it when it is non-zero.

mod health;
mod import;
mod normalize;
mod output;
mod watch;

pub use health::run_health;
pub use import::run_import;
pub use normalize::run_normalize;
pub use output::{write_output, OutputTarget};
pub use watch::run_watch;

use crate::config::AppConfig;
use crate::ingest::Ingestor;
use crate::store::{GraphQlSession, MutationClient};
use anyhow::{Context, Result};

/// Exit codes for scripted use
pub mod exit_codes {
    /// Every file was ingested (or the store is healthy)
    pub const SUCCESS: i32 = 0;
    /// At least one manifest failed to ingest
    pub const INGEST_FAILURES: i32 = 1;
    /// The store did not report a healthy node
    pub const STORE_UNAVAILABLE: i32 = 2;
    /// An error occurred
    pub const ERROR: i32 = 3;
}

/// Open a mutation client against the configured store.
pub fn connect(config: &AppConfig) -> Result<MutationClient<GraphQlSession>> {
    let session = GraphQlSession::new(config.session_config())
        .context("failed to create GraphQL session")?;
    Ok(MutationClient::new(session).with_conflict_retries(config.store.conflict_retries))
}

/// Build an ingestor from the configuration.
pub fn build_ingestor(config: &AppConfig) -> Result<Ingestor<GraphQlSession>> {
    Ok(Ingestor::new(connect(config)?, config.ingest_options()))
}

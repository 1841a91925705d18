//! Health command handler.

use super::{connect, exit_codes};
use crate::config::AppConfig;
use anyhow::Result;

/// Probe the store, returning [`exit_codes::STORE_UNAVAILABLE`] when it is not healthy.
pub fn run_health(config: &AppConfig, quiet: bool) -> Result<i32> {
    let client = connect(config)?;
    let endpoint = config.session_config().endpoint;
    if client.is_alive() {
        if !quiet {
            println!("{endpoint}: healthy");
        }
        Ok(exit_codes::SUCCESS)
    } else {
        if !quiet {
            println!("{endpoint}: unavailable");
        }
        Ok(exit_codes::STORE_UNAVAILABLE)
    }
}

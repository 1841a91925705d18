//! Watch configuration and duration parsing.

use super::WatchError;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the watch command.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Directories to monitor for manifests
    pub watch_dirs: Vec<PathBuf>,
    /// Polling interval for file changes
    pub poll_interval: Duration,
    /// Wait this long after detecting a change before queueing it, to
    /// coalesce rapid successive writes
    pub debounce: Duration,
    /// Scan once, ingest what was found, then return
    pub once: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            watch_dirs: Vec::new(),
            poll_interval: Duration::from_secs(5),
            debounce: Duration::from_secs(1),
            once: false,
        }
    }
}

impl WatchConfig {
    /// Check the directories before starting any thread.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.watch_dirs.is_empty() {
            return Err(WatchError::NoDirectories);
        }
        for dir in &self.watch_dirs {
            if !dir.is_dir() {
                return Err(WatchError::DirNotFound(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Parse a human-readable duration string into a [`Duration`].
///
/// Supported suffixes: `ms`, `s`, `m`, `h`, `d`.
///
/// ```ignore
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
/// ```
pub fn parse_duration(s: &str) -> Result<Duration, WatchError> {
    let s = s.trim();
    let invalid = || WatchError::InvalidInterval(s.to_string());

    let (digits, multiplier_ms) = if let Some(stripped) = s.strip_suffix("ms") {
        (stripped, 1)
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 1_000)
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 60_000)
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 3_600_000)
    } else if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 86_400_000)
    } else {
        return Err(invalid());
    };

    let value: u64 = digits.parse().map_err(|_| invalid())?;
    value
        .checked_mul(multiplier_ms)
        .map(Duration::from_millis)
        .ok_or_else(invalid)
}

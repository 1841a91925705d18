//! Configuration types for threat-db operations.
//!
//! Provides structured configuration for the store connection, batch import
//! and the watch loop.

use crate::ingest::{IngestOptions, ManifestFilter, DEFAULT_IGNORE_DIRS, DEFAULT_MANIFEST_SUFFIX};
use crate::store::{graphql_endpoint, GraphQlSessionConfig, DEFAULT_ENDPOINT};
use crate::watch::{parse_duration, WatchConfig, WatchError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default data directory scanned by `import` and `watch`.
pub const DEFAULT_DATA_DIR: &str = "./data";

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// Values from a config file are layered under environment variables and
/// command-line flags, which always win.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Graph store connection
    pub store: StoreConfig,
    /// Manifest discovery and batch ingestion
    pub ingest: IngestConfig,
    /// Watch-mode timing
    pub watch: WatchSettings,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Session configuration for the GraphQL store.
    #[must_use]
    pub fn session_config(&self) -> GraphQlSessionConfig {
        self.store.to_session_config()
    }

    /// Ingestion options for the orchestrator.
    #[must_use]
    pub fn ingest_options(&self) -> IngestOptions {
        self.ingest.to_options()
    }

    /// Watch configuration over the configured data directory.
    pub fn watch_config(&self) -> Result<WatchConfig, WatchError> {
        Ok(WatchConfig {
            watch_dirs: vec![self.ingest.data_dir.clone()],
            poll_interval: parse_duration(&self.watch.interval)?,
            debounce: parse_duration(&self.watch.debounce)?,
            once: false,
        })
    }
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Connection settings for the Dgraph GraphQL endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StoreConfig {
    /// GraphQL host; `/graphql` is appended when missing
    pub endpoint: String,
    /// API key sent as `X-Dgraph-AuthToken`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Dgraph Cloud key sent as a bearer token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_api_key: Option<String>,
    /// ACL access token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acl_key: Option<String>,
    /// Request timeout in seconds
    #[schemars(range(min = 1))]
    pub timeout_secs: u64,
    /// Retries after a connection failure
    pub transport_retries: u32,
    /// Retries after a concurrent-update conflict
    pub conflict_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            cloud_api_key: None,
            acl_key: None,
            timeout_secs: 30,
            transport_retries: 1,
            conflict_retries: 1,
        }
    }
}

impl StoreConfig {
    /// Build the session configuration for this store.
    #[must_use]
    pub fn to_session_config(&self) -> GraphQlSessionConfig {
        GraphQlSessionConfig {
            endpoint: graphql_endpoint(&self.endpoint),
            api_key: self.api_key.clone(),
            cloud_api_key: self.cloud_api_key.clone(),
            acl_key: self.acl_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            transport_retries: self.transport_retries,
            ..GraphQlSessionConfig::default()
        }
    }
}

/// Manifest discovery and ingestion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory searched recursively for manifests
    pub data_dir: PathBuf,
    /// File-name suffix identifying a manifest
    pub suffix: String,
    /// Directory names skipped during discovery (hidden directories are always skipped)
    pub ignore_dirs: Vec<String>,
    /// Delete each manifest after it is accepted by the store
    pub remove_on_success: bool,
    /// Ingest files on a worker pool instead of one at a time
    pub parallel: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            suffix: DEFAULT_MANIFEST_SUFFIX.to_string(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(ToString::to_string).collect(),
            remove_on_success: false,
            parallel: true,
        }
    }
}

impl IngestConfig {
    /// The discovery filter described by these settings.
    #[must_use]
    pub fn filter(&self) -> ManifestFilter {
        ManifestFilter::new(self.suffix.clone(), self.ignore_dirs.iter().cloned())
    }

    /// Build orchestrator options.
    #[must_use]
    pub fn to_options(&self) -> IngestOptions {
        IngestOptions {
            filter: self.filter(),
            remove_on_success: self.remove_on_success,
            parallel: self.parallel,
        }
    }
}

/// Watch loop timing, as human-readable durations (`500ms`, `5s`, `1m`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WatchSettings {
    /// Polling interval
    pub interval: String,
    /// Quiet period before a changed file is ingested
    pub debounce: String,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            interval: "5s".to_string(),
            debounce: "1s".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.store.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ingest.suffix, ".vex.json");
        assert!(config.ingest.parallel);
        assert!(!config.ingest.remove_on_success);
        assert_eq!(config.watch.interval, "5s");
    }

    #[test]
    fn test_session_config_appends_graphql() {
        let mut store = StoreConfig::default();
        store.endpoint = "https://dgraph.example.com/".to_string();
        store.timeout_secs = 7;
        let session = store.to_session_config();
        assert_eq!(session.endpoint, "https://dgraph.example.com/graphql");
        assert_eq!(session.timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_ingest_options_filter() {
        let mut ingest = IngestConfig::default();
        ingest.suffix = ".bom.json".to_string();
        ingest.ignore_dirs = vec!["Cache".to_string()];
        let options = ingest.to_options();
        assert_eq!(options.filter.suffix(), ".bom.json");
        assert!(options.filter.is_ignored_dir("cache"));
        assert!(!options.filter.is_ignored_dir("node_modules"));
    }

    #[test]
    fn test_watch_config_parses_durations() {
        let mut config = AppConfig::default();
        config.watch.interval = "250ms".to_string();
        let watch = config.watch_config().unwrap();
        assert_eq!(watch.poll_interval, Duration::from_millis(250));
        assert_eq!(watch.debounce, Duration::from_secs(1));
        assert_eq!(watch.watch_dirs, vec![PathBuf::from(DEFAULT_DATA_DIR)]);

        config.watch.debounce = "soon".to_string();
        assert!(config.watch_config().is_err());
    }

    #[test]
    fn test_yaml_partial_sections() {
        let config: AppConfig = serde_yaml::from_str("ingest:\n  remove_on_success: true\n").unwrap();
        assert!(config.ingest.remove_on_success);
        assert_eq!(config.store, StoreConfig::default());
    }
}

//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery,
//! then layering environment variables on top.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".threat-db.yaml",
    ".threat-db.yml",
    "threat-db.yaml",
    "threat-db.yml",
];

/// Environment variable naming the GraphQL host.
pub const ENV_HOST: &str = "DGRAPH_GRAPHQL_HOST";
/// Environment variable carrying the Dgraph API key.
pub const ENV_API_KEY: &str = "DGRAPH_API_KEY";
/// Environment variable carrying the Dgraph Cloud key.
pub const ENV_CLOUD_API_KEY: &str = "DGRAPH_CLOUD_API_KEY";
/// Environment variable carrying the ACL access token.
pub const ENV_ACL_KEY: &str = "DGRAPH_ACL_KEY";
/// Environment variable overriding the data directory.
pub const ENV_DATA_DIR: &str = "THREATDB_DATA_DIR";

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. User config directory (~/.config/threat-db/)
/// 4. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    let cwd = std::env::current_dir().ok();
    let user_dir = dirs::config_dir().map(|dir| dir.join("threat-db"));
    let home = dirs::home_dir();

    [cwd, user_dir, home]
        .into_iter()
        .flatten()
        .find_map(|dir| find_config_in_dir(&dir))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Default location for `config init`.
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("threat-db").join("threat-db.yaml"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAMES[0]))
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug)]
pub enum ConfigFileError {
    /// File not found
    NotFound(PathBuf),
    /// IO error reading file
    Io(std::io::Error),
    /// YAML parsing error
    Parse(serde_yaml::Error),
}

impl std::fmt::Display for ConfigFileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Config file not found: {}", path.display()),
            Self::Io(e) => write!(f, "Failed to read config file: {e}"),
            Self::Parse(e) => write!(f, "Failed to parse config file: {e}"),
        }
    }
}

impl std::error::Error for ConfigFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for ConfigFileError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigFileError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse(err)
    }
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(&content)?)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => {
                tracing::debug!("Loaded config from {}", path.display());
                (config, Some(path))
            }
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Environment Overrides
// ============================================================================

impl AppConfig {
    /// Apply environment variables through `lookup`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            self.store.endpoint = host;
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.store.api_key = Some(key);
        }
        if let Some(key) = get(ENV_CLOUD_API_KEY) {
            self.store.cloud_api_key = Some(key);
        }
        if let Some(key) = get(ENV_ACL_KEY) {
            self.store.acl_key = Some(key);
        }
        if let Some(dir) = get(ENV_DATA_DIR) {
            self.ingest.data_dir = PathBuf::from(dir);
        }
    }

    /// Apply the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Load from a discovered file, then layer the environment on top.
    #[must_use]
    pub fn from_file_and_env(explicit_path: Option<&Path>) -> (Self, Option<PathBuf>) {
        let (mut config, path) = load_or_default(explicit_path);
        config.apply_env();
        (config, path)
    }
}

// ============================================================================
// Config File Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    r#"# threat-db configuration
# Place this file at ~/.config/threat-db/threat-db.yaml or as .threat-db.yaml
# in the working directory. Environment variables override these values.

store:
  # Dgraph GraphQL host (DGRAPH_GRAPHQL_HOST)
  endpoint: http://localhost:8080/graphql
  # api_key: ...        # DGRAPH_API_KEY
  # cloud_api_key: ...  # DGRAPH_CLOUD_API_KEY
  # acl_key: ...        # DGRAPH_ACL_KEY
  timeout_secs: 30
  transport_retries: 1
  conflict_retries: 1

ingest:
  # Directory scanned for manifests (THREATDB_DATA_DIR)
  data_dir: ./data
  suffix: .vex.json
  remove_on_success: false
  parallel: true

watch:
  interval: 5s
  debounce: 1s
"#
    .to_string()
}

/// Serialize a config as YAML, listing every field.
pub fn render_config(config: &AppConfig) -> Result<String, ConfigFileError> {
    Ok(serde_yaml::to_string(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(find_config_in_dir(tmp.path()).is_none());

        let config_path = tmp.path().join(".threat-db.yaml");
        std::fs::write(&config_path, "ingest:\n  parallel: false\n").unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_dotfile() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("threat-db.yml"), "").unwrap();
        std::fs::write(tmp.path().join(".threat-db.yml"), "").unwrap();
        let found = find_config_in_dir(tmp.path()).unwrap();
        assert!(found.ends_with(".threat-db.yml"));
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("threat-db.yaml");
        let yaml = "store:\n  endpoint: http://dgraph:8080\n  timeout_secs: 5\nwatch:\n  interval: 30s\n";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.store.endpoint, "http://dgraph:8080");
        assert_eq!(config.store.timeout_secs, 5);
        assert_eq!(config.watch.interval, "30s");
        assert_eq!(config.watch.debounce, "1s");
    }

    #[test]
    fn test_load_missing_and_empty() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope.yaml");
        assert!(matches!(
            load_config_file(&missing),
            Err(ConfigFileError::NotFound(_))
        ));

        let empty = tmp.path().join("empty.yaml");
        std::fs::write(&empty, "\n").unwrap();
        assert_eq!(load_config_file(&empty).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_or_default_with_bad_yaml() {
        let tmp = TempDir::new().unwrap();
        let bad = tmp.path().join("bad.yaml");
        std::fs::write(&bad, "store: [unterminated").unwrap();
        let (config, loaded) = load_or_default(Some(&bad));
        assert!(loaded.is_none());
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_HOST, "http://graph:9000"),
            (ENV_API_KEY, "secret"),
            (ENV_ACL_KEY, ""),
            (ENV_DATA_DIR, "/srv/manifests"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_with(|k| env.get(k).map(|v| (*v).to_string()));

        assert_eq!(config.store.endpoint, "http://graph:9000");
        assert_eq!(config.store.api_key.as_deref(), Some("secret"));
        assert!(config.store.acl_key.is_none());
        assert!(config.store.cloud_api_key.is_none());
        assert_eq!(config.ingest.data_dir, PathBuf::from("/srv/manifests"));
    }

    #[test]
    fn test_example_config_parses() {
        let config: AppConfig = serde_yaml::from_str(&generate_example_config()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_render_round_trips() {
        let mut config = AppConfig::default();
        config.ingest.remove_on_success = true;
        let yaml = render_config(&config).unwrap();
        let back: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}

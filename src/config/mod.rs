//! Configuration module for threat-db.
//!
//! Settings are resolved in layers: built-in defaults, then a YAML config
//! file, then environment variables, then command-line flags.
//!
//! ```rust,ignore
//! use threat_db::config::{AppConfig, Validatable};
//!
//! let (config, loaded_from) = AppConfig::from_file_and_env(None);
//! for error in config.validate() {
//!     eprintln!("{error}");
//! }
//! ```
//!
//! # Configuration File
//!
//! Place a `.threat-db.yaml` file in the working directory or
//! `~/.config/threat-db/threat-db.yaml`:
//!
//! ```yaml
//! store:
//!   endpoint: https://dgraph.internal:8080
//! ingest:
//!   data_dir: /srv/manifests
//!   remove_on_success: true
//! watch:
//!   interval: 30s
//! ```

pub mod file;
mod types;
mod validation;

pub use types::{AppConfig, IngestConfig, StoreConfig, WatchSettings, DEFAULT_DATA_DIR};
pub use validation::{ConfigError, Validatable};

pub use file::{
    default_config_path, discover_config_file, generate_example_config, load_config_file,
    load_or_default, render_config, ConfigFileError, CONFIG_FILE_NAMES,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// Editors can use it for validation and autocompletion of
/// `.threat-db.yaml` files.
pub fn generate_json_schema() -> serde_json::Result<String> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}

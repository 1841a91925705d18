//! Configuration validation for threat-db.

use super::types::{AppConfig, IngestConfig, StoreConfig, WatchSettings};
use crate::watch::parse_duration;

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.store.validate();
        errors.extend(self.ingest.validate());
        errors.extend(self.watch.validate());
        errors
    }
}

impl Validatable for StoreConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let host = self.endpoint.trim();
        if host.is_empty() {
            errors.push(ConfigError::new("store.endpoint", "must not be empty"));
        } else if !(host.starts_with("http://") || host.starts_with("https://")) {
            errors.push(ConfigError::new(
                "store.endpoint",
                format!("'{host}' must start with http:// or https://"),
            ));
        }
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new("store.timeout_secs", "must be at least 1"));
        }
        errors
    }
}

impl Validatable for IngestConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.suffix.is_empty() {
            errors.push(ConfigError::new("ingest.suffix", "must not be empty"));
        }
        if self.data_dir.as_os_str().is_empty() {
            errors.push(ConfigError::new("ingest.data_dir", "must not be empty"));
        }
        errors
    }
}

impl Validatable for WatchSettings {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        match parse_duration(&self.interval) {
            Ok(d) if d.is_zero() => {
                errors.push(ConfigError::new("watch.interval", "must be greater than zero"));
            }
            Ok(_) => {}
            Err(e) => errors.push(ConfigError::new("watch.interval", e.to_string())),
        }
        if let Err(e) = parse_duration(&self.debounce) {
            errors.push(ConfigError::new("watch.debounce", e.to_string()));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AppConfig::default().is_valid());
    }

    #[test]
    fn test_store_validation() {
        let mut store = StoreConfig::default();
        store.endpoint = "dgraph:8080".to_string();
        store.timeout_secs = 0;
        let errors = store.validate();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "store.endpoint");
        assert_eq!(errors[1].field, "store.timeout_secs");
    }

    #[test]
    fn test_ingest_validation() {
        let mut ingest = IngestConfig::default();
        ingest.suffix = String::new();
        let errors = ingest.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("ingest.suffix"));
    }

    #[test]
    fn test_watch_validation() {
        let settings = WatchSettings {
            interval: "0s".to_string(),
            debounce: "later".to_string(),
        };
        let fields: Vec<_> = settings.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["watch.interval", "watch.debounce"]);
    }
}

//! Normalizer trait and parse error types.
//!
//! Parse errors never leave this module's callers: every entry point of
//! [`BomNormalizer`] folds them into [`Normalized::Empty`] after logging.

use crate::model::{EmptyReason, ManifestDocument, Normalized};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while reading a manifest
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("JSON parse error: {0}")]
    JsonError(String),

    #[error("Manifest is {size} bytes, exceeding the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}

impl ParseError {
    /// The empty-result reason this error maps to.
    #[must_use]
    pub fn empty_reason(&self) -> EmptyReason {
        match self {
            Self::JsonError(_) => EmptyReason::InvalidJson,
            Self::IoError(_) | Self::TooLarge { .. } => EmptyReason::Unreadable,
        }
    }
}

impl From<std::io::Error> for ParseError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

/// Converts raw manifests into canonical records.
///
/// Implementors provide [`normalize`](Self::normalize); the byte, string,
/// reader and path entry points decode JSON first and map decode failures
/// to an empty result.
pub trait BomNormalizer {
    /// Normalize an already-decoded manifest.
    fn normalize(&self, document: ManifestDocument) -> Normalized;

    /// Format name, for logs.
    fn format_name(&self) -> &str;

    fn normalize_slice(&self, bytes: &[u8]) -> Normalized {
        match serde_json::from_slice::<ManifestDocument>(bytes) {
            Ok(document) => self.normalize(document),
            Err(err) => recover(&ParseError::from(err), self.format_name(), None),
        }
    }

    fn normalize_str(&self, content: &str) -> Normalized {
        self.normalize_slice(content.as_bytes())
    }

    fn normalize_reader<R: Read>(&self, reader: R) -> Normalized
    where
        Self: Sized,
    {
        match serde_json::from_reader::<_, ManifestDocument>(reader) {
            Ok(document) => self.normalize(document),
            Err(err) => {
                let err = if err.is_io() {
                    ParseError::IoError(err.to_string())
                } else {
                    ParseError::from(err)
                };
                recover(&err, self.format_name(), None)
            }
        }
    }

    /// Read and normalize a manifest file.
    fn normalize_path(&self, path: &Path) -> Normalized {
        match super::read_manifest(path) {
            Ok(bytes) => match serde_json::from_slice::<ManifestDocument>(&bytes) {
                Ok(document) => self.normalize(document),
                Err(err) => recover(&ParseError::from(err), self.format_name(), Some(path)),
            },
            Err(err) => recover(&err, self.format_name(), Some(path)),
        }
    }
}

fn recover(err: &ParseError, format: &str, path: Option<&Path>) -> Normalized {
    match path {
        Some(path) => tracing::warn!(format, path = %path.display(), "{err}"),
        None => tracing::warn!(format, "{err}"),
    }
    Normalized::Empty(err.empty_reason())
}

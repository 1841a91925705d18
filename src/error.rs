//! Unified error types for threat-db.
//!
//! Parse failures inside the normalizer never reach this type: they are
//! folded into [`crate::model::Normalized::Empty`]. What remains here are
//! the failures a caller can actually act on (store rejections, transport
//! problems, IO around config and discovery, bad configuration).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for threat-db operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ThreatDbError {
    /// Errors while reading or decoding a manifest outside the normalizer
    #[error("Failed to parse manifest: {context}")]
    Parse {
        context: String,
        #[source]
        source: ParseErrorKind,
    },

    /// Errors talking to the graph store
    #[error("Store operation failed: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific parse error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    #[error("Invalid JSON structure: {0}")]
    InvalidJson(String),

    #[error("Manifest exceeds the {limit} byte limit ({size} bytes)")]
    TooLarge { size: u64, limit: u64 },

    #[error("Missing required field: {field} in {context}")]
    MissingField { field: String, context: String },
}

/// Specific store error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreErrorKind {
    /// The endpoint could not be reached after all transport retries
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    /// The store answered with an error that is neither transient nor benign
    #[error("Mutation rejected: {0}")]
    Rejected(String),

    #[error("Transaction conflict persisted after {attempts} attempts: {message}")]
    ConflictPersisted { attempts: u32, message: String },

    #[error("Response did not contain the {0} payload")]
    MissingPayload(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for threat-db operations
pub type Result<T> = std::result::Result<T, ThreatDbError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl ThreatDbError {
    /// Create a parse error with context
    pub fn parse(context: impl Into<String>, source: ParseErrorKind) -> Self {
        Self::Parse {
            context: context.into(),
            source,
        }
    }

    /// Create a parse error for missing field
    pub fn missing_field(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::parse(
            "missing required field",
            ParseErrorKind::MissingField {
                field: field.into(),
                context: context.into(),
            },
        )
    }

    /// Create a store error
    pub fn store(context: impl Into<String>, source: StoreErrorKind) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let message = source.to_string();
        Self::Io {
            path: Some(path.into()),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True when the failure is a connectivity problem rather than a
    /// rejection by the store.
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Store {
                source: StoreErrorKind::Connection(_),
                ..
            }
        )
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for ThreatDbError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ThreatDbError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(
            "JSON deserialization",
            ParseErrorKind::InvalidJson(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings chain rather than replace, so an error that travelled
/// through three layers reads `"outer: middle: inner"`.
///
/// ```ignore
/// use threat_db::error::ErrorContext;
///
/// let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on the error path.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<ThreatDbError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: ThreatDbError, new_ctx: &str) -> ThreatDbError {
    match err {
        ThreatDbError::Parse {
            context: existing,
            source,
        } => ThreatDbError::Parse {
            context: chain_context(new_ctx, &existing),
            source,
        },
        ThreatDbError::Store {
            context: existing,
            source,
        } => ThreatDbError::Store {
            context: chain_context(new_ctx, &existing),
            source,
        },
        ThreatDbError::Io {
            path,
            message,
            source,
        } => ThreatDbError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        ThreatDbError::Config(msg) => ThreatDbError::Config(chain_context(new_ctx, &msg)),
        ThreatDbError::Validation(msg) => ThreatDbError::Validation(chain_context(new_ctx, &msg)),
    }
}

/// Returns "`new`: `existing`", or just `new` when nothing precedes it.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a validation error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to a validation error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ThreatDbError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| ThreatDbError::Validation(f().into()))
    }
}

//! **Normalize CycloneDX SBOM/VEX manifests and ingest them into a graph store.**
//!
//! `threat-db` turns loosely-shaped CycloneDX JSON (software bills of materials
//! and vulnerability exchange documents) into one canonical record per manifest
//! and submits it to a Dgraph GraphQL endpoint as a single `addBom` mutation.
//!
//! ## Core Concepts & Modules
//!
//! - **[`parsers`]**: The [`CycloneDxNormalizer`] plus the package-URL parser
//!   ([`parse_purl`]) and license normalization it relies on. Normalizing never
//!   fails: unreadable or incomplete input yields [`Normalized::Empty`].
//! - **[`model`]**: The raw manifest shapes ([`ManifestDocument`]) and the
//!   canonical records ([`CanonicalBom`]) sent to the store.
//! - **[`store`]**: The [`StoreSession`] seam, the HTTP [`GraphQlSession`] and
//!   the [`MutationClient`] that classifies store errors into retry, benign
//!   rejection, or failure.
//! - **[`ingest`]**: The [`Ingestor`], which discovers manifests under a
//!   directory, normalizes and submits each one, and optionally removes files
//!   the store accepted.
//! - **[`watch`]**: A polling directory watcher feeding the ingestor.
//! - **[`config`]**: YAML configuration with environment overrides.
//!
//! ## Getting Started
//!
//! ```no_run
//! use std::path::Path;
//! use threat_db::{BomNormalizer, CycloneDxNormalizer};
//!
//! let normalized = CycloneDxNormalizer::new().normalize_path(Path::new("app.vex.json"));
//! println!(
//!     "{} components, {} vulnerabilities",
//!     normalized.components().len(),
//!     normalized.vulnerabilities().len()
//! );
//! ```
//!
//! ### Ingesting a Directory
//!
//! ```no_run
//! use std::path::Path;
//! use threat_db::{GraphQlSession, GraphQlSessionConfig, IngestOptions, Ingestor, MutationClient};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = GraphQlSession::new(GraphQlSessionConfig::default())?;
//!     let ingestor = Ingestor::new(MutationClient::new(session), IngestOptions::default());
//!
//!     let report = ingestor.ingest_directory(Path::new("./data"));
//!     println!("{} ingested, {} failed", report.succeeded(), report.failed);
//!     Ok(())
//! }
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod store;
pub mod watch;

// Re-export main types for convenience
pub use config::{AppConfig, ConfigError, Validatable};
pub use error::{ErrorContext, OptionContext, Result, ThreatDbError};
pub use ingest::{FileOutcome, IngestOptions, IngestReport, Ingestor, ManifestFilter};
pub use model::{
    CanonicalBom, ComponentRecord, EmptyReason, ManifestDocument, Normalized, PackageDescriptor,
    VulnerabilityRecord,
};
pub use parsers::{parse_purl, BomNormalizer, CycloneDxNormalizer};
pub use store::{
    GraphQlSession, GraphQlSessionConfig, MutationClient, StoreSession, SubmitOutcome,
};
pub use watch::{run_watch_loop, WatchConfig};

//! Manifest ingestion.
//!
//! [`Ingestor`] is the only component that calls both the normalizer and
//! the mutation client. It accepts work from three kinds of callers: a
//! one-shot directory import, the directory watch queue, and in-memory
//! uploads.
//!
//! ```no_run
//! use threat_db::ingest::{IngestOptions, Ingestor};
//! use threat_db::store::{GraphQlSession, GraphQlSessionConfig, MutationClient};
//! use std::path::Path;
//!
//! let session = GraphQlSession::new(GraphQlSessionConfig::default())?;
//! let ingestor = Ingestor::new(MutationClient::new(session), IngestOptions::default());
//! let report = ingestor.ingest_directory(Path::new("/data/reports"));
//! report.log_summary();
//! # Ok::<(), threat_db::error::ThreatDbError>(())
//! ```

mod discovery;
mod orchestrator;
mod report;

pub use discovery::{find_manifests, ManifestFilter, DEFAULT_IGNORE_DIRS, DEFAULT_MANIFEST_SUFFIX};
pub use orchestrator::{IngestOptions, Ingestor};
pub use report::{FileOutcome, IngestReport, MAX_RECORDED_FAILURES};

//! Ingestion orchestrator: discovery, normalization, submission, cleanup.

use super::discovery::{find_manifests, ManifestFilter};
use super::report::{FileOutcome, IngestReport};
use crate::model::Normalized;
use crate::parsers::{BomNormalizer, CycloneDxNormalizer};
use crate::store::{MutationClient, StoreSession, SubmitOutcome};
use rayon::prelude::*;
use std::error::Error;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Orchestrator options.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub filter: ManifestFilter,
    /// Delete a source file once the store holds its document
    pub remove_on_success: bool,
    /// Process discovered files on the rayon pool
    pub parallel: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            filter: ManifestFilter::default(),
            remove_on_success: false,
            parallel: true,
        }
    }
}

/// Drives manifests from disk or memory into the store.
///
/// Every file is handled independently: a failure is recorded and the batch
/// moves on. Nothing here blocks concurrent ingestors; overlapping writes
/// are left to the store's transactions.
pub struct Ingestor<S> {
    client: MutationClient<S>,
    normalizer: CycloneDxNormalizer,
    options: IngestOptions,
}

impl<S: StoreSession> Ingestor<S> {
    pub fn new(client: MutationClient<S>, options: IngestOptions) -> Self {
        Self {
            client,
            normalizer: CycloneDxNormalizer::new(),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    pub fn client(&self) -> &MutationClient<S> {
        &self.client
    }

    /// Manifests under `root` that a directory ingestion would process.
    #[must_use]
    pub fn discover(&self, root: &Path) -> Vec<PathBuf> {
        find_manifests(root, &self.options.filter)
    }

    /// Ingest every manifest under `root`.
    pub fn ingest_directory(&self, root: &Path) -> IngestReport {
        let start = Instant::now();
        let files = self.discover(root);

        let results: Vec<(PathBuf, FileOutcome, bool)> = if self.options.parallel {
            files
                .into_par_iter()
                .map(|path| {
                    let (outcome, removed) = self.process_file(&path);
                    (path, outcome, removed)
                })
                .collect()
        } else {
            files
                .into_iter()
                .map(|path| {
                    let (outcome, removed) = self.process_file(&path);
                    (path, outcome, removed)
                })
                .collect()
        };

        let mut report = IngestReport {
            discovered: results.len(),
            ..IngestReport::default()
        };
        for (path, outcome, removed) in results {
            report.record(path, outcome, removed);
        }
        report.duration = start.elapsed();
        report
    }

    /// Ingest one manifest file, deleting it afterwards when configured to
    /// and the store holds the document.
    pub fn ingest_file(&self, path: &Path) -> FileOutcome {
        self.process_file(path).0
    }

    /// Ingest an in-memory upload. Returns true when the store holds the
    /// document.
    pub fn ingest_stream(&self, bytes: &[u8]) -> bool {
        let normalized = self.normalizer.normalize_slice(bytes);
        self.submit(normalized, "upload").is_success()
    }

    /// Same as [`ingest_stream`](Self::ingest_stream), reading from `reader`.
    pub fn ingest_reader<R: Read>(&self, reader: R) -> bool {
        let normalized = self.normalizer.normalize_reader(reader);
        self.submit(normalized, "upload").is_success()
    }

    /// Outcome plus whether the source file was removed.
    pub(crate) fn process_file(&self, path: &Path) -> (FileOutcome, bool) {
        tracing::debug!("Processing {}", path.display());
        let normalized = self.normalizer.normalize_path(path);
        let outcome = self.submit(normalized, &path.display().to_string());

        let removed = self.options.remove_on_success && outcome.is_success() && remove_quietly(path);
        (outcome, removed)
    }

    fn submit(&self, normalized: Normalized, source: &str) -> FileOutcome {
        let bom = match normalized {
            Normalized::Bom(bom) => bom,
            Normalized::Empty(reason) => {
                tracing::debug!(source, "nothing to ingest: {reason}");
                return FileOutcome::NothingToIngest(reason);
            }
        };

        tracing::info!(
            "Creating Bom with {} components from {}",
            bom.components.len(),
            source
        );
        match self.client.create_bom(&bom) {
            Ok(SubmitOutcome::Created { .. }) => FileOutcome::Created,
            Ok(SubmitOutcome::Unchanged(kind)) => FileOutcome::Unchanged(kind),
            Err(err) => {
                let message = describe(&err);
                if err.is_connectivity() {
                    tracing::warn!(source, "store unavailable: {message}");
                } else {
                    tracing::warn!(source, "{message}");
                }
                FileOutcome::Failed(message)
            }
        }
    }
}

/// The error and its sources, outermost first.
fn describe(err: &dyn Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Best-effort delete; a failure leaves the file for the next scan.
fn remove_quietly(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(err) => {
            tracing::debug!("Could not remove {}: {}", path.display(), err);
            false
        }
    }
}

//! Per-file outcomes and run summaries.

use crate::model::EmptyReason;
use crate::store::BenignRejection;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// What happened to one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The store created the document
    Created,
    /// The store already held it (or an equivalent benign rejection)
    Unchanged(BenignRejection),
    /// Normalization produced nothing to submit
    NothingToIngest(EmptyReason),
    /// Submission failed
    Failed(String),
}

impl FileOutcome {
    /// Created or unchanged: the store holds the document.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::Unchanged(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Unchanged(kind) => write!(f, "unchanged ({kind})"),
            Self::NothingToIngest(reason) => write!(f, "nothing to ingest ({reason})"),
            Self::Failed(message) => write!(f, "failed: {message}"),
        }
    }
}

/// Failure details kept per report. Beyond this only `failed` keeps counting,
/// which bounds memory in a long-running watch.
pub const MAX_RECORDED_FAILURES: usize = 1_000;

/// Summary of one directory ingestion.
#[derive(Debug, Default, Clone)]
pub struct IngestReport {
    /// Manifests found by discovery
    pub discovered: usize,
    pub created: usize,
    pub unchanged: usize,
    pub nothing_to_ingest: usize,
    pub failed: usize,
    /// Source files deleted after a successful submission
    pub removed: usize,
    /// Failed files with their error messages, up to [`MAX_RECORDED_FAILURES`]
    pub failures: Vec<(PathBuf, String)>,
    pub duration: Duration,
}

impl IngestReport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed file.
    pub fn record(&mut self, path: PathBuf, outcome: FileOutcome, removed: bool) {
        match outcome {
            FileOutcome::Created => self.created += 1,
            FileOutcome::Unchanged(_) => self.unchanged += 1,
            FileOutcome::NothingToIngest(_) => self.nothing_to_ingest += 1,
            FileOutcome::Failed(message) => {
                self.failed += 1;
                if self.failures.len() < MAX_RECORDED_FAILURES {
                    self.failures.push((path, message));
                }
            }
        }
        if removed {
            self.removed += 1;
        }
    }

    /// Files the store now holds.
    #[must_use]
    pub const fn succeeded(&self) -> usize {
        self.created + self.unchanged
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Merge another report into this one
    pub fn merge(&mut self, other: Self) {
        self.discovered += other.discovered;
        self.created += other.created;
        self.unchanged += other.unchanged;
        self.nothing_to_ingest += other.nothing_to_ingest;
        self.failed += other.failed;
        self.removed += other.removed;
        let room = MAX_RECORDED_FAILURES.saturating_sub(self.failures.len());
        self.failures.extend(other.failures.into_iter().take(room));
        self.duration += other.duration;
    }

    pub fn log_summary(&self) {
        tracing::info!(
            "Ingestion complete: {} discovered, {} created, {} unchanged, \
             {} with nothing to ingest, {} failed, {} removed in {:?}",
            self.discovered,
            self.created,
            self.unchanged,
            self.nothing_to_ingest,
            self.failed,
            self.removed,
            self.duration
        );

        for (path, message) in &self.failures {
            tracing::warn!("Ingestion failed for {}: {}", path.display(), message);
        }
        let unlisted = self.failed.saturating_sub(self.failures.len());
        if unlisted > 0 {
            tracing::warn!("{unlisted} further failure(s) not listed");
        }
    }
}

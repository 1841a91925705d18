//! File system monitor using mtime-based polling.
//!
//! Scans watched directories for manifests (same suffix and ignore rules as
//! directory ingestion) and detects additions, modifications and removals
//! by comparing mtime and file size.

use crate::ingest::{find_manifests, ManifestFilter};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A detected file change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FileChange {
    Added(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    /// The path to ingest, if this change calls for it.
    pub(crate) fn ingestible(&self) -> Option<&Path> {
        match self {
            Self::Added(p) | Self::Modified(p) => Some(p),
            Self::Removed(_) => None,
        }
    }
}

/// Per-file tracked metadata.
#[derive(Debug, Clone)]
struct FileState {
    mtime: SystemTime,
    size: u64,
    /// xxh3 content hash, only recomputed when mtime or size changes
    content_hash: u64,
}

/// Polls directories for manifest changes.
#[derive(Debug)]
pub(crate) struct FileMonitor {
    tracked: HashMap<PathBuf, FileState>,
    watch_dirs: Vec<PathBuf>,
    filter: ManifestFilter,
}

impl FileMonitor {
    pub(crate) fn new(watch_dirs: Vec<PathBuf>, filter: ManifestFilter) -> Self {
        Self {
            tracked: HashMap::new(),
            watch_dirs,
            filter,
        }
    }

    /// Return the changes since the last poll.
    ///
    /// On the first call every discovered file is reported as
    /// [`FileChange::Added`]. A changed mtime or size triggers a content
    /// hash, and only a different hash counts as a modification.
    pub(crate) fn poll(&mut self) -> Vec<FileChange> {
        let mut changes = Vec::new();
        let mut seen = HashMap::new();

        for dir in &self.watch_dirs {
            for path in find_manifests(dir, &self.filter) {
                if let Some(state) = stat(&path) {
                    seen.insert(path, state);
                }
            }
        }

        for (path, state) in &mut seen {
            match self.tracked.get(path) {
                None => {
                    state.content_hash = hash_file_content(path);
                    changes.push(FileChange::Added(path.clone()));
                }
                Some(prev) if prev.mtime != state.mtime || prev.size != state.size => {
                    state.content_hash = hash_file_content(path);
                    if prev.content_hash != state.content_hash {
                        changes.push(FileChange::Modified(path.clone()));
                    }
                }
                Some(prev) => state.content_hash = prev.content_hash,
            }
        }

        for path in self.tracked.keys() {
            if !seen.contains_key(path) {
                changes.push(FileChange::Removed(path.clone()));
            }
        }

        self.tracked = seen;
        changes
    }

    /// Number of currently tracked files.
    pub(crate) fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}

fn stat(path: &Path) -> Option<FileState> {
    let meta = std::fs::metadata(path).ok()?;
    Some(FileState {
        mtime: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        size: meta.len(),
        content_hash: 0,
    })
}

/// xxh3 hash of file contents; 0 on read failure.
fn hash_file_content(path: &Path) -> u64 {
    match std::fs::read(path) {
        Ok(data) => xxhash_rust::xxh3::xxh3_64(&data),
        Err(_) => 0,
    }
}

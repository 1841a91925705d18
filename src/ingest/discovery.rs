//! Manifest file discovery.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Suffix of manifests picked up by directory ingestion.
pub const DEFAULT_MANIFEST_SUFFIX: &str = ".vex.json";

/// Directory names never descended into.
pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    "venv",
    "site-packages",
    "__pycache__",
    "target",
    "build",
    "dist",
    "vendor",
    "out",
];

/// Which files count as manifests and which directories to skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFilter {
    suffix: String,
    ignore_dirs: HashSet<String>,
}

impl Default for ManifestFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MANIFEST_SUFFIX,
            DEFAULT_IGNORE_DIRS.iter().map(|d| (*d).to_string()),
        )
    }
}

impl ManifestFilter {
    /// Ignore entries are matched case-insensitively.
    pub fn new(suffix: impl Into<String>, ignore_dirs: impl IntoIterator<Item = String>) -> Self {
        Self {
            suffix: suffix.into(),
            ignore_dirs: ignore_dirs.into_iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// True for ignored names and hidden (dot-prefixed) directories.
    #[must_use]
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        name.starts_with('.') || self.ignore_dirs.contains(&name.to_lowercase())
    }

    /// True when the file name ends with the manifest suffix.
    #[must_use]
    pub fn is_manifest(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(&self.suffix))
    }
}

/// Recursively collect manifests under `root`.
///
/// The root itself is never filtered, only directories below it. Order is
/// whatever the file system yields.
pub fn find_manifests(root: &Path, filter: &ManifestFilter) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(root, filter, &mut found);
    tracing::debug!(root = %root.display(), count = found.len(), "discovered manifests");
    found
}

fn walk(dir: &Path, filter: &ManifestFilter, out: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!("Cannot read directory {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            let skip = entry
                .file_name()
                .to_str()
                .map_or(true, |name| filter.is_ignored_dir(name));
            if !skip {
                walk(&path, filter, out);
            }
        } else if filter.is_manifest(&path) {
            out.push(path);
        }
    }
}

//! Normalize command handler.
//!
//! Runs the normalizer offline and prints the submission payload, which is
//! handy for checking what a manifest would write to the store.

use super::{exit_codes, write_output, OutputTarget};
use crate::model::Normalized;
use crate::parsers::{BomNormalizer, CycloneDxNormalizer};
use anyhow::{Context, Result};
use std::path::Path;

/// Normalize one manifest and write the canonical JSON to `target`.
pub fn run_normalize(path: &Path, target: &OutputTarget, quiet: bool) -> Result<i32> {
    let normalizer = CycloneDxNormalizer::new();
    match normalizer.normalize_path(path) {
        Normalized::Bom(bom) => {
            tracing::debug!(
                "{}: {} components, {} services, {} vulnerabilities",
                path.display(),
                bom.components.len(),
                bom.services.len(),
                bom.vulnerabilities.len()
            );
            let json = serde_json::to_string_pretty(&bom)
                .context("failed to serialize normalized manifest")?;
            write_output(&json, target, quiet)?;
        }
        Normalized::Empty(reason) => {
            if !quiet {
                eprintln!("{}: nothing to ingest ({reason})", path.display());
            }
        }
    }
    Ok(exit_codes::SUCCESS)
}

//! License name cleanup.
//!
//! SPDX ids pass through untouched. Free-text names are upper-cased, their
//! slash and ampersand disjunctions become `OR`, and grouping punctuation is
//! dropped, so `"MIT/Apache-2.0"` and `"(mit & apache-2.0)"` land on the same
//! token set.

use crate::model::RawLicenseChoice;
use regex::Regex;
use std::sync::LazyLock;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[(),]").expect("static regex"));

/// Normalize a free-text license name.
///
/// Absent or empty input yields the empty string.
#[must_use]
pub fn normalize_license_name(name: Option<&str>) -> String {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return String::new();
    };
    let rewritten = name
        .replace(" / ", " OR ")
        .replace('/', " OR ")
        .replace(" & ", " OR ")
        .replace('&', " OR ");
    PUNCTUATION.replace_all(&rewritten, "").to_uppercase()
}

/// Resolve a component's license entries into a flat list.
///
/// An entry nested under `license` is unwrapped first. An `id` is kept
/// verbatim, a `name` is normalized, and entries with neither (including
/// bare `expression` entries) are skipped.
#[must_use]
pub fn resolve_licenses(entries: &[RawLicenseChoice]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| {
            let (id, name) = match &entry.license {
                Some(inner) => (inner.id.as_deref(), inner.name.as_deref()),
                None => (entry.id.as_deref(), entry.name.as_deref()),
            };
            match (id.filter(|s| !s.is_empty()), name.filter(|s| !s.is_empty())) {
                (Some(id), _) => Some(id.to_string()),
                (None, Some(name)) => Some(normalize_license_name(Some(name))),
                (None, None) => None,
            }
        })
        .collect()
}

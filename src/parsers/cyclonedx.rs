//! CycloneDX manifest normalizer.
//!
//! Converts a [`ManifestDocument`] into a [`CanonicalBom`]: components get
//! their purl, vendor and licenses resolved, vulnerabilities are
//! deduplicated by reference key (first occurrence wins) and the metadata
//! root component is flagged.

use crate::model::{
    AffectedRef, BomMetadata, BomReference, CanonicalBom, ComponentRecord, EmptyReason,
    ManifestDocument, Normalized, RawComponent, RawVulnerability, ServiceRecord,
    VulnerabilityRecord,
};
use crate::parsers::license::resolve_licenses;
use crate::parsers::purl::parse_purl;
use crate::parsers::traits::BomNormalizer;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Rating method whose severity and score are lifted onto the record.
const CVSS_V31_METHOD: &str = "CVSSv31";

/// Normalizer for CycloneDX JSON manifests
#[derive(Debug, Clone, Copy, Default)]
pub struct CycloneDxNormalizer;

impl CycloneDxNormalizer {
    /// Create a new normalizer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn convert_component(raw: RawComponent, index: usize, serial_number: &str) -> ComponentRecord {
        let descriptor = raw
            .purl
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(parse_purl)
            .unwrap_or_default();
        let vendor = raw.group.clone().unwrap_or_default();
        let licenses = resolve_licenses(&raw.licenses);
        let bom_ref = component_bom_ref(
            raw.reference(),
            raw.purl.as_deref(),
            raw.name.as_deref(),
            raw.version.as_deref(),
            index,
        );

        ComponentRecord {
            bom_ref,
            is_root: false,
            component_type: raw.component_type,
            group: vendor.clone(),
            name: raw.name,
            version: raw.version,
            purl: raw.purl,
            ctype: descriptor.purl_type,
            sub_path: descriptor.subpath,
            repo_url: descriptor.repo_url,
            download_url: descriptor.download_url,
            qualifiers: descriptor.qualifiers,
            vendor,
            licenses,
            appears_in: vec![BomReference {
                serial_number: serial_number.to_string(),
            }],
            extra: without_keys(raw.extra, ComponentRecord::DERIVED_KEYS),
        }
    }

    /// The metadata component, if it carries a purl.
    fn convert_root(raw: RawComponent, serial_number: &str) -> Option<ComponentRecord> {
        if raw.purl.as_deref().map_or(true, str::is_empty) {
            tracing::debug!(serial_number, "metadata component has no purl, not marking a root");
            return None;
        }
        let mut record = Self::convert_component(raw, 0, serial_number);
        record.is_root = true;
        record.ctype = record.component_type.clone().unwrap_or_default();
        Some(record)
    }

    fn convert_vulnerabilities(raw: Vec<RawVulnerability>) -> Vec<VulnerabilityRecord> {
        let mut seen: HashSet<String> = HashSet::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());
        let mut duplicates = 0usize;

        for (index, vuln) in raw.into_iter().enumerate() {
            let Some(key) = vulnerability_key(&vuln) else {
                tracing::warn!(index, "skipping vulnerability with neither bom-ref nor id");
                continue;
            };
            if !seen.insert(key.clone()) {
                duplicates += 1;
                continue;
            }
            records.push(Self::convert_vulnerability(vuln, key));
        }

        if duplicates > 0 {
            tracing::debug!(duplicates, "dropped repeated vulnerability entries");
        }
        records
    }

    fn convert_vulnerability(raw: RawVulnerability, bom_ref: String) -> VulnerabilityRecord {
        let mut affects = Vec::with_capacity(raw.affects.len());
        let mut version = String::new();
        let mut fix_version = String::new();

        for affected in &raw.affects {
            if let Some(reference) = affected.reference.as_deref().filter(|r| !r.is_empty()) {
                affects.push(AffectedRef {
                    purl: reference.to_string(),
                });
            }
            // Later entries override earlier ones.
            for status in &affected.versions {
                let Some(value) = status.version.as_ref().or(status.range.as_ref()) else {
                    continue;
                };
                match status.status.as_deref() {
                    Some("affected") => version = value.clone(),
                    Some("unaffected") => fix_version = value.clone(),
                    _ => {}
                }
            }
        }

        let mut severity = VulnerabilityRecord::DEFAULT_SEVERITY.to_string();
        let mut cvss_score = 0.0;
        for rating in &raw.ratings {
            if rating.method.as_deref() == Some(CVSS_V31_METHOD) {
                if let Some(s) = &rating.severity {
                    severity = s.clone();
                }
                cvss_score = rating.score.unwrap_or(0.0);
            }
        }

        VulnerabilityRecord {
            bom_ref,
            id: raw.id,
            affects,
            version,
            fix_version,
            severity,
            cvss_score,
            ratings: raw.ratings,
            extra: without_keys(raw.extra, VulnerabilityRecord::DERIVED_KEYS),
        }
    }
}

impl BomNormalizer for CycloneDxNormalizer {
    fn normalize(&self, document: ManifestDocument) -> Normalized {
        if document.components.is_empty() {
            tracing::debug!("manifest has no components");
            return Normalized::Empty(EmptyReason::NoComponents);
        }
        let Some(serial_number) = document.serial_number.filter(|s| !s.is_empty()) else {
            tracing::warn!(
                components = document.components.len(),
                "manifest has components but no serial number"
            );
            return Normalized::Empty(EmptyReason::MissingSerialNumber);
        };

        let components: Vec<ComponentRecord> = document
            .components
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Self::convert_component(raw, index, &serial_number))
            .collect();
        let services = document.services.into_iter().map(ServiceRecord).collect();
        let vulnerabilities = Self::convert_vulnerabilities(document.vulnerabilities);

        let raw_metadata = document.metadata.unwrap_or_default();
        let metadata = BomMetadata {
            timestamp: raw_metadata
                .timestamp
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(normalize_timestamp),
            component: raw_metadata
                .component
                .and_then(|raw| Self::convert_root(raw, &serial_number)),
        };

        tracing::debug!(
            serial_number = %serial_number,
            components = components.len(),
            vulnerabilities = vulnerabilities.len(),
            "normalized manifest"
        );

        Normalized::Bom(CanonicalBom {
            serial_number,
            metadata,
            components,
            services,
            vulnerabilities,
        })
    }

    fn format_name(&self) -> &str {
        "CycloneDX"
    }
}

/// Reference key for a component: raw `bom-ref`, then purl, then
/// `name@version`, then a positional placeholder.
fn component_bom_ref(
    bom_ref: Option<&str>,
    purl: Option<&str>,
    name: Option<&str>,
    version: Option<&str>,
    index: usize,
) -> String {
    let non_empty = |s: Option<&str>| s.filter(|v| !v.is_empty()).map(str::to_string);
    non_empty(bom_ref)
        .or_else(|| non_empty(purl))
        .or_else(|| {
            non_empty(name).map(|n| match non_empty(version) {
                Some(v) => format!("{n}@{v}"),
                None => n,
            })
        })
        .unwrap_or_else(|| format!("component-{index}"))
}

fn vulnerability_key(vuln: &RawVulnerability) -> Option<String> {
    vuln.reference()
        .or_else(|| vuln.id.as_deref().filter(|id| !id.is_empty()))
        .map(str::to_string)
}

fn without_keys(mut extra: Map<String, Value>, keys: &[&str]) -> Map<String, Value> {
    for key in keys {
        extra.remove(*key);
    }
    extra
}

/// Render a manifest timestamp zone-naive.
///
/// RFC 3339 values are shifted to UTC first. Anything else only loses a
/// trailing `Z`.
fn normalize_timestamp(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.f")
            .to_string(),
        Err(_) => raw.strip_suffix('Z').unwrap_or(raw).to_string(),
    }
}

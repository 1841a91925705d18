//! Canonical records produced by the normalizer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Back-reference from a component to the document it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BomReference {
    pub serial_number: String,
}

/// A component ready for submission.
///
/// Identifier-derived fields are always present (empty when the purl is
/// missing or unparsable) so the store never sees them omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    pub bom_ref: String,
    pub is_root: bool,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub component_type: Option<String>,
    pub group: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purl: Option<String>,
    /// Ecosystem type from the purl, or the raw `type` for the root component
    pub ctype: String,
    pub sub_path: String,
    pub repo_url: String,
    pub download_url: String,
    pub qualifiers: IndexMap<String, String>,
    pub vendor: String,
    pub licenses: Vec<String>,
    pub appears_in: Vec<BomReference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentRecord {
    /// Keys the record derives itself; raw entries carrying them are shadowed.
    pub const DERIVED_KEYS: &'static [&'static str] = &[
        "bomRef",
        "isRoot",
        "ctype",
        "subPath",
        "repoUrl",
        "downloadUrl",
        "qualifiers",
        "vendor",
        "appearsIn",
    ];
}

/// A service entry, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceRecord(pub Map<String, Value>);

/// One component affected by a vulnerability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedRef {
    pub purl: String,
}

/// A deduplicated vulnerability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VulnerabilityRecord {
    pub bom_ref: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub affects: Vec<AffectedRef>,
    /// Last version observed with status `affected`
    pub version: String,
    /// Last version observed with status `unaffected`
    #[serde(rename = "fix_version")]
    pub fix_version: String,
    pub severity: String,
    #[serde(rename = "cvss_score")]
    pub cvss_score: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ratings: Vec<crate::model::RawRating>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VulnerabilityRecord {
    pub const DERIVED_KEYS: &'static [&'static str] =
        &["bomRef", "version", "fix_version", "severity", "cvss_score"];

    pub const DEFAULT_SEVERITY: &'static str = "none";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomMetadata {
    /// Zone-naive timestamp; `None` when the manifest had none
    pub timestamp: Option<String>,
    pub component: Option<ComponentRecord>,
}

/// The normalized form of one manifest, submitted as a single mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalBom {
    pub serial_number: String,
    pub metadata: BomMetadata,
    pub components: Vec<ComponentRecord>,
    pub services: Vec<ServiceRecord>,
    pub vulnerabilities: Vec<VulnerabilityRecord>,
}

impl CanonicalBom {
    /// The component flagged as root, if the metadata declared one.
    #[must_use]
    pub fn root(&self) -> Option<&ComponentRecord> {
        self.metadata.component.as_ref().filter(|c| c.is_root)
    }
}

/// Why a manifest produced nothing to ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyReason {
    /// The document has no components
    NoComponents,
    /// Components are present but the serial number is missing or empty
    MissingSerialNumber,
    /// The source could not be read
    Unreadable,
    /// The source is not a JSON manifest
    InvalidJson,
}

impl fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::NoComponents => "no components",
            Self::MissingSerialNumber => "missing serial number",
            Self::Unreadable => "unreadable source",
            Self::InvalidJson => "invalid JSON",
        };
        f.write_str(text)
    }
}

/// Result of normalizing one manifest.
///
/// `Empty` is not an error: the orchestrator reads it as "nothing to do".
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Bom(CanonicalBom),
    Empty(EmptyReason),
}

impl Normalized {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Serial number, unset for an empty result.
    #[must_use]
    pub fn serial_number(&self) -> Option<&str> {
        match self {
            Self::Bom(bom) => Some(bom.serial_number.as_str()),
            Self::Empty(_) => None,
        }
    }

    #[must_use]
    pub fn components(&self) -> &[ComponentRecord] {
        match self {
            Self::Bom(bom) => &bom.components,
            Self::Empty(_) => &[],
        }
    }

    #[must_use]
    pub fn services(&self) -> &[ServiceRecord] {
        match self {
            Self::Bom(bom) => &bom.services,
            Self::Empty(_) => &[],
        }
    }

    #[must_use]
    pub fn vulnerabilities(&self) -> &[VulnerabilityRecord] {
        match self {
            Self::Bom(bom) => &bom.vulnerabilities,
            Self::Empty(_) => &[],
        }
    }

    #[must_use]
    pub fn into_bom(self) -> Option<CanonicalBom> {
        match self {
            Self::Bom(bom) => Some(bom),
            Self::Empty(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ComponentRecord {
        ComponentRecord {
            bom_ref: "pkg:npm/lodash@4.17.21".to_string(),
            is_root: false,
            component_type: Some("library".to_string()),
            group: String::new(),
            name: Some("lodash".to_string()),
            version: Some("4.17.21".to_string()),
            purl: Some("pkg:npm/lodash@4.17.21".to_string()),
            ctype: "npm".to_string(),
            sub_path: String::new(),
            repo_url: String::new(),
            download_url: String::new(),
            qualifiers: IndexMap::new(),
            vendor: String::new(),
            licenses: vec!["MIT".to_string()],
            appears_in: vec![BomReference {
                serial_number: "urn:uuid:1".to_string(),
            }],
            extra: Map::new(),
        }
    }

    #[test]
    fn test_component_serializes_camel_case() {
        let value = serde_json::to_value(record()).unwrap();
        assert_eq!(value["bomRef"], "pkg:npm/lodash@4.17.21");
        assert_eq!(value["isRoot"], false);
        assert_eq!(value["type"], "library");
        assert_eq!(value["subPath"], "");
        assert_eq!(value["appearsIn"][0]["serialNumber"], "urn:uuid:1");
        assert!(value.get("bom-ref").is_none());
    }

    #[test]
    fn test_vulnerability_keeps_snake_case_store_fields() {
        let vuln = VulnerabilityRecord {
            bom_ref: "CVE-2021-23337/pkg:npm/lodash@4.17.20".to_string(),
            id: Some("CVE-2021-23337".to_string()),
            affects: vec![AffectedRef {
                purl: "pkg:npm/lodash@4.17.20".to_string(),
            }],
            version: "4.17.20".to_string(),
            fix_version: "4.17.21".to_string(),
            severity: "high".to_string(),
            cvss_score: 7.2,
            ratings: Vec::new(),
            extra: Map::new(),
        };
        let value = serde_json::to_value(vuln).unwrap();
        assert_eq!(value["fix_version"], "4.17.21");
        assert_eq!(value["cvss_score"], 7.2);
        assert_eq!(value["bomRef"], "CVE-2021-23337/pkg:npm/lodash@4.17.20");
        assert!(value.get("ratings").is_none());
    }

    #[test]
    fn test_empty_accessors() {
        let empty = Normalized::Empty(EmptyReason::NoComponents);
        assert!(empty.is_empty());
        assert_eq!(empty.serial_number(), None);
        assert!(empty.components().is_empty());
        assert_eq!(EmptyReason::InvalidJson.to_string(), "invalid JSON");
    }
}

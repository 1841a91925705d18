//! Raw manifest types as read from CycloneDX JSON.
//!
//! Producers disagree on field types, so every field is read leniently: a
//! scalar of the wrong type is coerced where that is unambiguous and dropped
//! otherwise, and a malformed array entry is skipped. One bad value never
//! costs the rest of the document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A raw SBOM/VEX manifest, consumed exactly once by the normalizer.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestDocument {
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial_number: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<RawMetadata>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub components: Vec<RawComponent>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub services: Vec<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub vulnerabilities: Vec<RawVulnerability>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMetadata {
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub component: Option<RawComponent>,
}

/// A component entry. Unknown keys land in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawComponent {
    #[serde(rename = "bom-ref", default, deserialize_with = "lenient_string")]
    pub bom_ref: Option<String>,
    /// Camel-case spelling emitted by some producers
    #[serde(rename = "bomRef", default, deserialize_with = "lenient_string")]
    pub bom_ref_camel: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub component_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub group: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub purl: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub licenses: Vec<RawLicenseChoice>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawComponent {
    /// The entry's reference key; `bom-ref` wins over `bomRef`.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        first_non_empty(self.bom_ref.as_deref(), self.bom_ref_camel.as_deref())
    }
}

/// One element of a component's `licenses` array.
///
/// CycloneDX nests the useful part under `license`; some producers put
/// `id`/`name` at the top level instead, and both shapes are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLicenseChoice {
    #[serde(default, deserialize_with = "lenient")]
    pub license: Option<RawLicense>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLicense {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
}

/// A vulnerability entry. Unknown keys land in `extra`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVulnerability {
    #[serde(rename = "bom-ref", default, deserialize_with = "lenient_string")]
    pub bom_ref: Option<String>,
    #[serde(rename = "bomRef", default, deserialize_with = "lenient_string")]
    pub bom_ref_camel: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub affects: Vec<RawAffects>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub ratings: Vec<RawRating>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawVulnerability {
    /// The entry's reference key; `bom-ref` wins over `bomRef`.
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        first_non_empty(self.bom_ref.as_deref(), self.bom_ref_camel.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAffects {
    #[serde(rename = "ref", default, deserialize_with = "lenient_string")]
    pub reference: Option<String>,
    #[serde(default, deserialize_with = "lenient_seq")]
    pub versions: Vec<RawVersionStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVersionStatus {
    #[serde(default, deserialize_with = "lenient_string")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub range: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
}

/// A rating entry, passed through to the canonical record as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRating {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_string")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_f64")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn first_non_empty<'a>(primary: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    primary
        .filter(|s| !s.is_empty())
        .or_else(|| fallback.filter(|s| !s.is_empty()))
}

// ============================================================================
// Lenient field readers
// ============================================================================

/// Strings pass through; numbers and booleans are rendered as text. Arrays,
/// objects and `null` read as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

/// Numbers and numeric strings; anything else reads as absent.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// A nested object that reads as absent when it has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => {
            tracing::debug!("ignoring malformed object: {err}");
            Ok(None)
        }
    }
}

/// An array read entry by entry. `null` or a non-array is an empty list and
/// entries of the wrong shape are skipped.
fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        _ => {
            tracing::debug!("ignoring non-array value where a list was expected");
            return Ok(Vec::new());
        }
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(index, "skipping malformed entry: {err}");
                None
            }
        })
        .collect())
}

//! Structured package identifiers.
//!
//! A [`PackageDescriptor`] is what the identifier parser extracts from a
//! purl string: the six purl parts plus the repository and download URLs
//! resolved for the ecosystem.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which parsing path produced a descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorSource {
    /// Parsed by the strict purl grammar
    #[default]
    Strict,
    /// Best-effort split of a malformed identifier
    Heuristic,
}

/// A parsed package identifier.
///
/// Every field is a plain value: a part the parser could not infer is the
/// empty string or an empty map, never absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    #[serde(rename = "type")]
    pub purl_type: String,
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub qualifiers: IndexMap<String, String>,
    pub subpath: String,
    pub repo_url: String,
    pub download_url: String,
    #[serde(skip)]
    pub source: DescriptorSource,
}

impl PackageDescriptor {
    #[must_use]
    pub fn ecosystem(&self) -> Ecosystem {
        Ecosystem::from_purl_type(&self.purl_type)
    }

    #[must_use]
    pub fn is_heuristic(&self) -> bool {
        self.source == DescriptorSource::Heuristic
    }
}

/// Ecosystem/package manager type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    Npm,
    PyPi,
    Cargo,
    Maven,
    Golang,
    Nuget,
    RubyGems,
    Composer,
    CocoaPods,
    Hex,
    Pub,
    Hackage,
    Cran,
    GitHub,
    GitLab,
    Bitbucket,
    Deb,
    Rpm,
    Generic,
    Unknown(String),
}

impl Ecosystem {
    /// Parse ecosystem from PURL type
    #[must_use]
    pub fn from_purl_type(purl_type: &str) -> Self {
        match purl_type.to_lowercase().as_str() {
            "npm" => Self::Npm,
            "pypi" => Self::PyPi,
            "cargo" => Self::Cargo,
            "maven" => Self::Maven,
            "golang" | "go" => Self::Golang,
            "nuget" => Self::Nuget,
            "gem" => Self::RubyGems,
            "composer" => Self::Composer,
            "cocoapods" => Self::CocoaPods,
            "hex" => Self::Hex,
            "pub" => Self::Pub,
            "hackage" => Self::Hackage,
            "cran" => Self::Cran,
            "github" => Self::GitHub,
            "gitlab" => Self::GitLab,
            "bitbucket" => Self::Bitbucket,
            "deb" => Self::Deb,
            "rpm" => Self::Rpm,
            "generic" => Self::Generic,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Npm => write!(f, "npm"),
            Self::PyPi => write!(f, "pypi"),
            Self::Cargo => write!(f, "cargo"),
            Self::Maven => write!(f, "maven"),
            Self::Golang => write!(f, "golang"),
            Self::Nuget => write!(f, "nuget"),
            Self::RubyGems => write!(f, "gem"),
            Self::Composer => write!(f, "composer"),
            Self::CocoaPods => write!(f, "cocoapods"),
            Self::Hex => write!(f, "hex"),
            Self::Pub => write!(f, "pub"),
            Self::Hackage => write!(f, "hackage"),
            Self::Cran => write!(f, "cran"),
            Self::GitHub => write!(f, "github"),
            Self::GitLab => write!(f, "gitlab"),
            Self::Bitbucket => write!(f, "bitbucket"),
            Self::Deb => write!(f, "deb"),
            Self::Rpm => write!(f, "rpm"),
            Self::Generic => write!(f, "generic"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ecosystem_from_type_is_case_insensitive() {
        assert_eq!(Ecosystem::from_purl_type("NPM"), Ecosystem::Npm);
        assert_eq!(Ecosystem::from_purl_type("go"), Ecosystem::Golang);
        assert_eq!(
            Ecosystem::from_purl_type("swid"),
            Ecosystem::Unknown("swid".to_string())
        );
    }

    #[test]
    fn test_ecosystem_display_matches_purl_type() {
        for ty in ["npm", "pypi", "gem", "github", "maven", "hackage"] {
            assert_eq!(Ecosystem::from_purl_type(ty).to_string(), ty);
        }
    }

    #[test]
    fn test_descriptor_default_is_all_empty() {
        let d = PackageDescriptor::default();
        assert!(d.name.is_empty());
        assert!(d.qualifiers.is_empty());
        assert!(!d.is_heuristic());
    }
}

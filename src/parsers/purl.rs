//! Package identifier (purl) parsing.
//!
//! [`parse_purl`] tries the strict grammar first and falls back to a
//! best-effort split, so it never fails: a malformed identifier yields a
//! partial descriptor with whatever could be inferred.

use crate::model::{DescriptorSource, Ecosystem, PackageDescriptor};
use indexmap::IndexMap;
use packageurl::PackageUrl;
use std::str::FromStr;

/// Parse a package identifier into a descriptor.
#[must_use]
pub fn parse_purl(text: &str) -> PackageDescriptor {
    match parse_strict(text) {
        Some(descriptor) => descriptor,
        None => {
            tracing::debug!(purl = text, "falling back to heuristic identifier split");
            parse_heuristic(text)
        }
    }
}

/// Parse with the purl grammar only.
#[must_use]
pub fn parse_strict(text: &str) -> Option<PackageDescriptor> {
    if text.is_empty() {
        return None;
    }
    let purl = PackageUrl::from_str(text).ok()?;

    let mut pairs: Vec<(String, String)> = purl
        .qualifiers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    pairs.sort();
    let qualifiers: IndexMap<String, String> = pairs.into_iter().collect();

    let mut descriptor = PackageDescriptor {
        purl_type: purl.ty().to_string(),
        namespace: purl.namespace().unwrap_or_default().to_string(),
        name: purl.name().to_string(),
        version: purl.version().unwrap_or_default().to_string(),
        qualifiers,
        subpath: purl.subpath().unwrap_or_default().to_string(),
        repo_url: String::new(),
        download_url: String::new(),
        source: DescriptorSource::Strict,
    };
    descriptor.repo_url = repo_url(&descriptor);
    descriptor.download_url = download_url(&descriptor);
    Some(descriptor)
}

/// Best-effort split for identifiers the grammar rejects.
///
/// The version suffix after `@` is dropped and the rest split on `/`. A
/// single segment becomes the lower-cased `name`, with `namespace` taken
/// from the text before its first `:`. With more than two segments the
/// second-to-last becomes `namespace`, minus any `scheme:` prefix. Exactly
/// two segments yield nothing.
#[must_use]
pub fn parse_heuristic(text: &str) -> PackageDescriptor {
    let mut descriptor = PackageDescriptor {
        source: DescriptorSource::Heuristic,
        ..PackageDescriptor::default()
    };

    let head = text.split('@').next().unwrap_or_default();
    if head.is_empty() {
        return descriptor;
    }

    let segments: Vec<&str> = head.split('/').collect();
    match segments.len() {
        1 => {
            let segment = segments[0];
            descriptor.name = segment.to_lowercase();
            descriptor.namespace = segment.split(':').next().unwrap_or_default().to_string();
        }
        n if n > 2 => {
            let namespace = segments[n - 2];
            descriptor.namespace = match namespace.rsplit_once(':') {
                Some((_, rest)) => rest.to_string(),
                None => namespace.to_string(),
            };
        }
        _ => {}
    }
    descriptor
}

// ============================================================================
// Ecosystem URL resolution
// ============================================================================

/// `namespace/name`, or just `name` when there is no namespace.
fn qualified_name(d: &PackageDescriptor, sep: char) -> String {
    if d.namespace.is_empty() {
        d.name.clone()
    } else {
        format!("{}{sep}{}", d.namespace, d.name)
    }
}

/// Browsable repository or registry page for the package.
fn repo_url(d: &PackageDescriptor) -> String {
    if let Some(vcs) = d.qualifiers.get("vcs_url") {
        return vcs.strip_prefix("git+").unwrap_or(vcs).to_string();
    }

    let name = &d.name;
    let version = d.version.as_str();
    let has_version = !version.is_empty();
    let has_namespace = !d.namespace.is_empty();

    match d.ecosystem() {
        Ecosystem::Cargo => format!("https://crates.io/crates/{name}"),
        Ecosystem::GitHub if has_namespace => {
            let base = format!("https://github.com/{}/{name}", d.namespace);
            if has_version {
                format!("{base}/tree/{version}")
            } else {
                base
            }
        }
        Ecosystem::GitLab if has_namespace => {
            let base = format!("https://gitlab.com/{}/{name}", d.namespace);
            if has_version {
                format!("{base}/-/tree/{version}")
            } else {
                base
            }
        }
        Ecosystem::Bitbucket if has_namespace => {
            let base = format!("https://bitbucket.org/{}/{name}", d.namespace);
            if has_version {
                format!("{base}/src/{version}")
            } else {
                base
            }
        }
        Ecosystem::RubyGems => {
            let base = format!("https://rubygems.org/gems/{name}");
            if has_version {
                format!("{base}/versions/{version}")
            } else {
                base
            }
        }
        Ecosystem::Npm => {
            let base = format!("https://www.npmjs.com/package/{}", qualified_name(d, '/'));
            if has_version {
                format!("{base}/v/{version}")
            } else {
                base
            }
        }
        Ecosystem::PyPi => {
            if has_version {
                format!("https://pypi.org/project/{name}/{version}/")
            } else {
                format!("https://pypi.org/project/{name}/")
            }
        }
        Ecosystem::Nuget => {
            if has_version {
                format!("https://www.nuget.org/packages/{name}/{version}")
            } else {
                format!("https://www.nuget.org/packages/{name}")
            }
        }
        Ecosystem::Golang => {
            let base = format!("https://pkg.go.dev/{}", qualified_name(d, '/'));
            if has_version {
                format!("{base}@{version}")
            } else {
                base
            }
        }
        Ecosystem::Maven if has_namespace && has_version => format!(
            "https://repo.maven.apache.org/maven2/{}/{name}/{version}",
            d.namespace.replace('.', "/")
        ),
        Ecosystem::Hackage if has_version => {
            format!("https://hackage.haskell.org/package/{name}-{version}")
        }
        Ecosystem::Composer if has_namespace => {
            let base = format!("https://packagist.org/packages/{}/{name}", d.namespace);
            if has_version {
                format!("{base}#{version}")
            } else {
                base
            }
        }
        Ecosystem::Pub => format!("https://pub.dev/packages/{name}"),
        Ecosystem::Hex => {
            let base = format!("https://hex.pm/packages/{name}");
            if has_version {
                format!("{base}/{version}")
            } else {
                base
            }
        }
        Ecosystem::Cran => {
            if has_version {
                format!("https://cran.r-project.org/src/contrib/{name}_{version}.tar.gz")
            } else {
                format!("https://cran.r-project.org/web/packages/{name}")
            }
        }
        Ecosystem::CocoaPods => format!("https://cocoapods.org/pods/{name}"),
        _ => String::new(),
    }
}

/// Direct archive download for the package. Needs a version.
fn download_url(d: &PackageDescriptor) -> String {
    if let Some(url) = d.qualifiers.get("download_url") {
        return url.clone();
    }
    if d.version.is_empty() {
        return String::new();
    }

    let name = &d.name;
    let version = &d.version;
    let has_namespace = !d.namespace.is_empty();

    match d.ecosystem() {
        Ecosystem::Cargo => format!("https://crates.io/api/v1/crates/{name}/{version}/download"),
        Ecosystem::GitHub if has_namespace => format!(
            "https://github.com/{}/{name}/archive/{version}.tar.gz",
            d.namespace
        ),
        Ecosystem::GitLab if has_namespace => format!(
            "https://gitlab.com/{}/{name}/-/archive/{version}/{name}-{version}.tar.gz",
            d.namespace
        ),
        Ecosystem::Bitbucket if has_namespace => format!(
            "https://bitbucket.org/{}/{name}/get/{version}.tar.gz",
            d.namespace
        ),
        Ecosystem::RubyGems => format!("https://rubygems.org/downloads/{name}-{version}.gem"),
        Ecosystem::Npm => format!(
            "https://registry.npmjs.org/{}/-/{name}-{version}.tgz",
            qualified_name(d, '/')
        ),
        Ecosystem::Nuget => format!("https://www.nuget.org/api/v2/package/{name}/{version}"),
        Ecosystem::Golang => format!(
            "https://proxy.golang.org/{}/@v/{version}.zip",
            qualified_name(d, '/')
        ),
        Ecosystem::Maven if has_namespace => format!(
            "https://repo.maven.apache.org/maven2/{}/{name}/{version}/{name}-{version}.jar",
            d.namespace.replace('.', "/")
        ),
        Ecosystem::Hackage => format!(
            "https://hackage.haskell.org/package/{name}-{version}/{name}-{version}.tar.gz"
        ),
        Ecosystem::Pub => format!("https://pub.dev/api/archives/{name}-{version}.tar.gz"),
        Ecosystem::Hex => format!("https://repo.hex.pm/tarballs/{name}-{version}.tar"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_npm_scoped() {
        let d = parse_purl("pkg:npm/%40angular/core@12.0.0");
        assert_eq!(d.source, DescriptorSource::Strict);
        assert_eq!(d.purl_type, "npm");
        assert_eq!(d.namespace, "@angular");
        assert_eq!(d.name, "core");
        assert_eq!(d.version, "12.0.0");
        assert_eq!(d.repo_url, "https://www.npmjs.com/package/@angular/core/v/12.0.0");
        assert_eq!(
            d.download_url,
            "https://registry.npmjs.org/@angular/core/-/core-12.0.0.tgz"
        );
    }

    #[test]
    fn test_strict_qualifiers_sorted_and_subpath() {
        let d = parse_purl("pkg:maven/org.apache.commons/io@1.3.4?type=jar&classifier=sources#src/main");
        let keys: Vec<&str> = d.qualifiers.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["classifier", "type"]);
        assert_eq!(d.subpath, "src/main");
        assert_eq!(
            d.repo_url,
            "https://repo.maven.apache.org/maven2/org/apache/commons/io/1.3.4"
        );
    }

    #[test]
    fn test_github_urls() {
        let d = parse_purl("pkg:github/package-url/purl-spec@244fd47e07d1004");
        assert_eq!(
            d.repo_url,
            "https://github.com/package-url/purl-spec/tree/244fd47e07d1004"
        );
        assert_eq!(
            d.download_url,
            "https://github.com/package-url/purl-spec/archive/244fd47e07d1004.tar.gz"
        );
    }

    #[test]
    fn test_download_url_qualifier_overrides() {
        let d = parse_purl("pkg:generic/openssl@1.1.1?download_url=https%3A%2F%2Fexample.org%2Fopenssl.tgz");
        assert_eq!(d.download_url, "https://example.org/openssl.tgz");
        assert_eq!(d.repo_url, "");
    }

    #[test]
    fn test_unsupported_ecosystem_has_empty_urls() {
        let d = parse_purl("pkg:deb/debian/curl@7.50.3-1?arch=i386");
        assert_eq!(d.purl_type, "deb");
        assert_eq!(d.repo_url, "");
        assert_eq!(d.download_url, "");
    }

    #[test]
    fn test_heuristic_single_segment() {
        let d = parse_purl("Log4J");
        assert_eq!(d.source, DescriptorSource::Heuristic);
        assert_eq!(d.name, "log4j");
        assert_eq!(d.namespace, "Log4J");
        assert!(d.version.is_empty());
        assert!(d.qualifiers.is_empty());
    }

    #[test]
    fn test_heuristic_scheme_prefix_namespace() {
        let d = parse_heuristic("pkg:Foo");
        assert_eq!(d.name, "pkg:foo");
        assert_eq!(d.namespace, "pkg");
    }

    #[test]
    fn test_heuristic_many_segments() {
        let d = parse_heuristic("pkg:acme/tools/widget@1.0");
        assert_eq!(d.namespace, "tools");
        assert!(d.name.is_empty());

        let d = parse_heuristic("pkg:acme/widget/x/y");
        assert_eq!(d.namespace, "x");
    }

    #[test]
    fn test_heuristic_strips_scheme_from_namespace() {
        let d = parse_heuristic("pkg:vendor/a/b");
        assert_eq!(d.namespace, "a");
        let d = parse_heuristic("x/pkg:vendor/b");
        assert_eq!(d.namespace, "vendor");
    }

    #[test]
    fn test_heuristic_two_segments_yield_nothing() {
        let d = parse_heuristic("vendor/name@1.0");
        assert_eq!(d, PackageDescriptor {
            source: DescriptorSource::Heuristic,
            ..PackageDescriptor::default()
        });
    }

    #[test]
    fn test_empty_and_at_only() {
        assert_eq!(parse_purl("").name, "");
        assert_eq!(parse_purl("@1.0").name, "");
    }
}

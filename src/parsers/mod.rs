//! Manifest parsing and normalization.
//!
//! * [`purl`]: package identifier parsing with a heuristic fallback
//! * [`license`]: license name cleanup
//! * [`CycloneDxNormalizer`]: raw manifest to [`CanonicalBom`](crate::model::CanonicalBom)
//!
//! ## Usage
//!
//! ```no_run
//! use threat_db::parsers::{BomNormalizer, CycloneDxNormalizer};
//! use std::path::Path;
//!
//! let normalized = CycloneDxNormalizer::new().normalize_path(Path::new("app.vex.json"));
//! println!("{} components", normalized.components().len());
//! ```

mod cyclonedx;
pub mod license;
pub mod purl;
mod traits;

pub use cyclonedx::CycloneDxNormalizer;
pub use license::{normalize_license_name, resolve_licenses};
pub use purl::parse_purl;
pub use traits::{BomNormalizer, ParseError};

use std::io::Read;
use std::path::Path;

/// Maximum manifest file size (512 MB).
pub const MAX_MANIFEST_FILE_SIZE: u64 = 512 * 1024 * 1024;

/// Read a manifest file, refusing anything above [`MAX_MANIFEST_FILE_SIZE`].
pub fn read_manifest(path: &Path) -> Result<Vec<u8>, ParseError> {
    let file = std::fs::File::open(path)?;
    let size = file.metadata()?.len();
    if size > MAX_MANIFEST_FILE_SIZE {
        return Err(ParseError::TooLarge {
            size,
            limit: MAX_MANIFEST_FILE_SIZE,
        });
    }
    let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
    file.take(MAX_MANIFEST_FILE_SIZE + 1).read_to_end(&mut bytes)?;
    Ok(bytes)
}

//! Data model for manifest ingestion.
//!
//! Two layers live here:
//!
//! * [`ManifestDocument`] and its entries mirror the raw CycloneDX JSON as it
//!   arrives. Fields the pipeline reads are typed; everything else is kept
//!   in a side-map so it can be passed through to the store unchanged.
//! * [`CanonicalBom`] and its records are what the normalizer produces and
//!   the mutation client submits. Serialization mirrors the input shape,
//!   with `bom-ref` renamed to `bomRef` and the derived fields added.
//!
//! ```ignore
//! let normalized = CycloneDxNormalizer::new().normalize_path(&path);
//! if let Normalized::Bom(bom) = normalized {
//!     println!("{} components", bom.components.len());
//! }
//! ```

mod canonical;
mod identifiers;
mod manifest;

pub use canonical::*;
pub use identifiers::*;
pub use manifest::*;

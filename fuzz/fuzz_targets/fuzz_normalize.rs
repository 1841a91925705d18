#![no_main]
use libfuzzer_sys::fuzz_target;
use threat_db::parsers::{BomNormalizer, CycloneDxNormalizer};

const MAX_WRAPPED_INPUT_LEN: usize = 10_000;

/// Fuzz the manifest normalizer.
///
/// Also wraps the input as a component list so fuzzing reaches component
/// and vulnerability conversion instead of stopping at the top-level shape.
fuzz_target!(|data: &[u8]| {
    let normalizer = CycloneDxNormalizer::new();
    let _ = normalizer.normalize_slice(data);

    if let Ok(s) = std::str::from_utf8(data) {
        if s.len() < MAX_WRAPPED_INPUT_LEN {
            let wrapped = format!(r#"{{"serialNumber":"urn:uuid:fuzz","components":[{s}]}}"#);
            let _ = normalizer.normalize_str(&wrapped);
            let wrapped = format!(
                r#"{{"serialNumber":"urn:uuid:fuzz","components":[{{"name":"a"}}],"vulnerabilities":[{s}]}}"#
            );
            let _ = normalizer.normalize_str(&wrapped);
        }
    }
});

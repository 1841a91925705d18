#![no_main]
use libfuzzer_sys::fuzz_target;
use threat_db::parsers::parse_purl;

// Both the strict parser and the heuristic fallback must accept anything.
fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = parse_purl(s);
        let _ = parse_purl(&format!("pkg:{s}"));
    }
});

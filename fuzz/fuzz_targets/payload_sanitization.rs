#![no_main]

//! Fuzz target for payload parsing, scanning, and sanitization.
//!
//! Arbitrary bytes go through the same steps an admitted body does. Parsing
//! may reject, but nothing may panic, and sanitizing twice must equal
//! sanitizing once without changing the tree's shape.

use hookgate_core::PayloadNode;
use hookgate_security::{Sanitizer, SensitiveScanner};
use libfuzzer_sys::fuzz_target;

const MAX_DEPTH: usize = 64;

fuzz_target!(|data: &[u8]| {
    let (Ok(scanner), Ok(sanitizer)) = (SensitiveScanner::new(), Sanitizer::new()) else {
        return;
    };

    let _ = scanner.scan(&String::from_utf8_lossy(data));

    let text = String::from_utf8_lossy(data);
    let once = sanitizer.sanitize_str(&text);
    assert_eq!(sanitizer.sanitize_str(&once), once);

    if let Ok(tree) = PayloadNode::parse(data, MAX_DEPTH) {
        let sanitized = sanitizer.sanitize(&tree);
        assert!(sanitized.same_shape(&tree));
        assert_eq!(sanitizer.sanitize(&sanitized), sanitized);
    }
});

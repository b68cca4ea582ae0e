//! Recursive string neutralization over a payload tree.

use hookgate_core::PayloadNode;
use regex::Regex;

/// Strips executable markup and control characters from string leaves.
///
/// Each string has script blocks removed, then any remaining tags. Stray
/// angle brackets and control characters other than tab, newline and
/// carriage return are dropped next, then `javascript:` schemes, and the
/// result is trimmed. Scheme removal collapses nested occurrences in the
/// same pass, so one pass is already a fixed point and runs in linear time.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    script_block: Regex,
    markup_tag: Regex,
}

const JAVASCRIPT_SCHEME: &[u8] = b"javascript:";

impl Sanitizer {
    /// Compiles the removal patterns.
    ///
    /// # Errors
    ///
    /// Returns the regex error if a pattern fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            script_block: Regex::new(r"(?is)<script[^>]*>.*?</script>")?,
            markup_tag: Regex::new(r"<[^>]*>")?,
        })
    }

    /// Returns a tree of identical shape with every string leaf cleaned.
    pub fn sanitize(&self, node: &PayloadNode) -> PayloadNode {
        match node {
            PayloadNode::Object(map) => PayloadNode::Object(
                map.iter().map(|(k, v)| (k.clone(), self.sanitize(v))).collect(),
            ),
            PayloadNode::Array(items) => {
                PayloadNode::Array(items.iter().map(|v| self.sanitize(v)).collect())
            },
            PayloadNode::String(s) => PayloadNode::String(self.sanitize_str(s)),
            PayloadNode::Scalar(scalar) => PayloadNode::Scalar(scalar.clone()),
        }
    }

    /// Cleans a single string.
    pub fn sanitize_str(&self, input: &str) -> String {
        let s = self.script_block.replace_all(input, "");
        let s = self.markup_tag.replace_all(&s, "");

        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            if matches!(c, '<' | '>') || (c.is_control() && !matches!(c, '\t' | '\n' | '\r')) {
                continue;
            }
            out.push(c);
            if ends_with_scheme(&out) {
                out.truncate(out.len() - JAVASCRIPT_SCHEME.len());
            }
        }
        out.trim().to_string()
    }
}

/// ASCII case-insensitive check; the scheme has no self-overlap, so popping
/// each match as it completes removes nested occurrences too.
fn ends_with_scheme(s: &str) -> bool {
    s.len() >= JAVASCRIPT_SCHEME.len()
        && s.as_bytes()[s.len() - JAVASCRIPT_SCHEME.len()..].eq_ignore_ascii_case(JAVASCRIPT_SCHEME)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::*;

    fn sanitizer() -> Sanitizer {
        Sanitizer::new().unwrap()
    }

    #[test]
    fn script_blocks_are_removed_with_content() {
        let s = sanitizer();
        assert_eq!(s.sanitize_str("hi<script>alert(1)</script>there"), "hithere");
        assert_eq!(s.sanitize_str("a<SCRIPT type=x>\nsteal()\n</Script>b"), "ab");
    }

    #[test]
    fn remaining_tags_are_removed() {
        assert_eq!(sanitizer().sanitize_str("<b>bold</b> <img src=x onerror=y>"), "bold");
    }

    #[test]
    fn javascript_scheme_is_removed() {
        assert_eq!(sanitizer().sanitize_str("JavaScript:alert(1)"), "alert(1)");
    }

    #[test]
    fn control_characters_are_removed_but_whitespace_kept() {
        assert_eq!(sanitizer().sanitize_str("a\u{0}b\u{7f}c\u{85}d\te\nf"), "abcd\te\nf");
    }

    #[test]
    fn spliced_constructs_do_not_survive() {
        let s = sanitizer();
        assert_eq!(s.sanitize_str("java<b>script:</b>x"), "x");
        assert_eq!(s.sanitize_str("java\u{1}script:x"), "x");
        assert_eq!(s.sanitize_str("<\u{1}b>text"), "text");
    }

    #[test]
    fn plain_text_is_trimmed_only() {
        assert_eq!(sanitizer().sanitize_str("  Fix login bug  "), "Fix login bug");
    }

    #[test]
    fn tree_shape_and_scalars_are_preserved() {
        let tree = PayloadNode::from_value(
            json!({
                "title": "<script>x</script>Title",
                "labels": ["<i>bug</i>", " ok "],
                "number": 7,
                "draft": false,
                "body": null
            }),
            16,
        )
        .unwrap();

        let clean = sanitizer().sanitize(&tree);

        assert!(tree.same_shape(&clean));
        assert_eq!(clean.get("title").and_then(PayloadNode::as_str), Some("Title"));
        assert_eq!(
            clean.get("labels"),
            Some(&PayloadNode::Array(vec![
                PayloadNode::String("bug".into()),
                PayloadNode::String("ok".into())
            ]))
        );
        assert_eq!(clean.get("number"), tree.get("number"));
    }

    #[test]
    fn stray_angle_brackets_are_dropped() {
        let s = sanitizer();
        assert_eq!(s.sanitize_str("<<b>script>alert(1)"), "scriptalert(1)");
        assert_eq!(s.sanitize_str("a > b"), "a  b");
    }

    #[test]
    fn nested_schemes_collapse_in_one_pass() {
        let s = sanitizer();
        assert_eq!(s.sanitize_str("javajavascript:script:x"), "x");
        assert_eq!(s.sanitize_str("JAVAjavascript:SCRIPT:alert(1)"), "alert(1)");
    }

    #[test]
    fn megabyte_of_nested_schemes_is_linear() {
        let depth = 95_000;
        let input = format!("{}{}<i>done</i>", "java".repeat(depth), "script:".repeat(depth));
        assert!(input.len() > 1_000_000);

        let s = sanitizer();
        let started = Instant::now();
        let clean = s.sanitize_str(&input);

        assert_eq!(clean, "done");
        assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
        assert_eq!(s.sanitize_str(&clean), clean);
    }

    #[test]
    fn megabyte_of_nested_tags_is_linear() {
        let depth = 100_000;
        let input = format!("{}x{}", "<<b>".repeat(depth), "</b>>".repeat(depth));
        assert!(input.len() > 800_000);

        let started = Instant::now();
        let clean = sanitizer().sanitize_str(&input);

        assert_eq!(clean, "x");
        assert!(started.elapsed() < Duration::from_secs(5), "took {:?}", started.elapsed());
    }

    #[test]
    fn sanitizing_twice_changes_nothing() {
        let s = sanitizer();
        let tree =
            PayloadNode::from_value(json!({"m": " <p>java\u{1}script:go</p> "}), 8).unwrap();
        let once = s.sanitize(&tree);
        assert_eq!(s.sanitize(&once), once);
    }
}

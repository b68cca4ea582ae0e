//! Property-based tests for the security checks.
//!
//! Signature round trips and tamper detection, range membership, and
//! sanitizer idempotence and shape preservation.

#![allow(clippy::unwrap_used)]

use std::net::{IpAddr, Ipv4Addr};

use hookgate_core::{GateError, PayloadNode};
use hookgate_security::{
    sign, AllowList, CidrRange, HmacSha256Verifier, Sanitizer, SignatureVerifier, WebhookSecret,
};
use proptest::{prelude::*, test_runner::Config as ProptestConfig};
use serde_json::{json, Map, Value};

fn proptest_config() -> ProptestConfig {
    ProptestConfig {
        cases: 64,
        timeout: 5000,
        fork: false,
        failure_persistence: None,
        source_file: None,
        ..ProptestConfig::default()
    }
}

fn secret_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{1,64}").unwrap()
}

/// Strings biased toward the constructs the sanitizer removes.
fn hostile_string() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("<script>".to_string()),
            Just("</script>".to_string()),
            Just("<b>".to_string()),
            Just("<".to_string()),
            Just(">".to_string()),
            Just("javascript:".to_string()),
            Just("java".to_string()),
            Just("script:".to_string()),
            Just(" ".to_string()),
            Just("\u{0}".to_string()),
            Just("\u{9f}".to_string()),
            Just("\n".to_string()),
            "[a-zA-Z0-9]{0,6}",
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn tree_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        hostile_string().prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..5).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..5)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn signed_payloads_always_verify(
        body in prop::collection::vec(any::<u8>(), 0..2048),
        secret in secret_strategy(),
    ) {
        let secret = WebhookSecret::new(secret).unwrap();
        let signature = sign(&body, &secret).unwrap();
        prop_assert!(HmacSha256Verifier::new(secret).verify(&body, &signature));
    }

    #[test]
    fn any_single_byte_mutation_fails(
        body in prop::collection::vec(any::<u8>(), 0..512),
        secret in secret_strategy(),
        index in any::<prop::sample::Index>(),
        replacement in any::<u8>(),
    ) {
        let secret = WebhookSecret::new(secret).unwrap();
        let signature = sign(&body, &secret).unwrap();

        let mut mutated = signature.clone().into_bytes();
        let at = index.index(mutated.len());
        prop_assume!(mutated[at] != replacement);
        mutated[at] = replacement;
        let mutated = String::from_utf8_lossy(&mutated).into_owned();

        prop_assert!(!HmacSha256Verifier::new(secret).verify(&body, &mutated));
    }

    #[test]
    fn addresses_inside_a_range_are_admitted(
        base in any::<u32>(),
        prefix in 8u8..=32,
        host in any::<u32>(),
    ) {
        let range = CidrRange::new(IpAddr::V4(Ipv4Addr::from(base)), prefix).unwrap();
        let host_mask = u32::MAX.checked_shr(u32::from(prefix)).unwrap_or(0);
        let IpAddr::V4(network) = range.network() else { unreachable!() };
        let inside = Ipv4Addr::from(u32::from(network) | (host & host_mask));

        let list = AllowList::from_ranges(vec![range], true);
        prop_assert_eq!(list.check(&inside.to_string()), Ok(IpAddr::V4(inside)));
    }

    #[test]
    fn addresses_outside_every_range_are_forbidden(base in any::<u32>(), prefix in 8u8..=32) {
        let range = CidrRange::new(IpAddr::V4(Ipv4Addr::from(base)), prefix).unwrap();
        let IpAddr::V4(network) = range.network() else { unreachable!() };
        // Flipping the last network bit moves the address to the sibling block.
        let outside = Ipv4Addr::from(u32::from(network) ^ (1u32 << (32 - u32::from(prefix))));

        let list = AllowList::from_ranges(vec![range], true);
        prop_assert_eq!(list.check(&outside.to_string()), Err(GateError::ForbiddenOrigin));
    }

    #[test]
    fn invalid_origins_reject_without_panicking(origin in "\\PC{0,40}") {
        let list = AllowList::new::<&str>(&[], true);
        if origin.trim().parse::<IpAddr>().is_err() {
            prop_assert_eq!(list.check(&origin), Err(GateError::InvalidOrigin));
        }
    }

    #[test]
    fn sanitizing_is_idempotent(text in hostile_string()) {
        let sanitizer = Sanitizer::new().unwrap();
        let once = sanitizer.sanitize_str(&text);
        prop_assert_eq!(sanitizer.sanitize_str(&once), once.clone());
        prop_assert!(!once.to_lowercase().contains("javascript:"));
        prop_assert!(!once.contains('\0'));
        prop_assert!(!once.contains('<') && !once.contains('>'));
    }

    #[test]
    fn sanitizing_preserves_tree_shape(value in tree_strategy()) {
        let sanitizer = Sanitizer::new().unwrap();
        let tree = PayloadNode::from_value(value, 64).unwrap();
        let clean = sanitizer.sanitize(&tree);

        prop_assert!(tree.same_shape(&clean));
        prop_assert_eq!(sanitizer.sanitize(&clean), clean);
    }
}

//! Property-based tests for payload tree construction.
//!
//! Checks the nesting guard and shape invariants against generated JSON,
//! entirely in memory.

#![allow(clippy::unwrap_used)]

use hookgate_core::{GateError, PayloadNode};
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

/// Arbitrary JSON up to a handful of levels deep.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 <>/:_-]{0,24}".prop_map(Value::String),
    ];

    leaf.prop_recursive(5, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6)
                .prop_map(|map| Value::Object(map.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Wraps a value in `levels` single-key objects.
fn nest(levels: usize) -> Value {
    (0..levels).fold(json!(1), |inner, _| json!({ "n": inner }))
}

proptest! {
    #![proptest_config(proptest_config())]

    #[test]
    fn conversion_preserves_json(value in json_strategy()) {
        let node = PayloadNode::from_value(value.clone(), 64).unwrap();
        prop_assert_eq!(serde_json::to_value(&node).unwrap(), value);
    }

    #[test]
    fn same_shape_is_reflexive(value in json_strategy()) {
        let node = PayloadNode::from_value(value, 64).unwrap();
        prop_assert!(node.same_shape(&node));
    }

    #[test]
    fn depth_guard_matches_measured_depth(value in json_strategy()) {
        let depth = PayloadNode::from_value(value.clone(), 64).unwrap().depth();

        prop_assert!(PayloadNode::from_value(value.clone(), depth).is_ok());
        if depth > 1 {
            prop_assert_eq!(
                PayloadNode::from_value(value, depth - 1).unwrap_err(),
                GateError::PayloadTooDeep { max_depth: depth - 1 }
            );
        }
    }

    #[test]
    fn nesting_limit_is_exact(levels in 1usize..40) {
        // `levels` objects wrapping a scalar is `levels + 1` deep.
        let value = nest(levels);
        prop_assert!(PayloadNode::from_value(value.clone(), levels + 1).is_ok());
        prop_assert!(PayloadNode::from_value(value, levels).is_err());
    }

    #[test]
    fn parse_never_panics_on_arbitrary_bytes(body in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = PayloadNode::parse(&body, 16);
    }
}

//! Property tests for indexing, set algebra, JSON and formatting

use proptest::prelude::*;
use pyobj::{format, json, FormatArg, Handle, List, Set};
use serde_json::Value;

fn setup() {
    assert!(pyobj::init());
}

fn int_list(values: &[i64]) -> List {
    values.iter().map(|v| Handle::from(*v)).collect()
}

fn int_set(values: &[i64]) -> Set {
    values.iter().copied().collect()
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1e6f64..1e6).prop_map(Value::from),
        "[a-zA-Z0-9 _\\-\"\\\\é]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_negative_index_matches_offset(
        values in prop::collection::vec(any::<i64>(), 1..16),
        offset in 1usize..16,
    ) {
        setup();
        let list = int_list(&values);
        let len = values.len();
        let offset = (offset - 1) % len + 1;
        let negative = -(offset as i64);
        let positive = (len - offset) as i64;
        prop_assert_eq!(list.get(negative).as_i64(), list.get(positive).as_i64());
        prop_assert!(list.get(-(len as i64) - 1).is_null());
        prop_assert!(list.get(len as i64).is_null());
    }

    #[test]
    fn prop_set_laws(
        a in prop::collection::vec(-20i64..20, 0..12),
        b in prop::collection::vec(-20i64..20, 0..12),
    ) {
        setup();
        let (a, b) = (int_set(&a), int_set(&b));
        let union = a.union(&b);
        let intersection = a.intersection(&b);

        prop_assert_eq!(union.len(), b.union(&a).len());
        prop_assert_eq!(union.len() + intersection.len(), a.len() + b.len());
        prop_assert!(intersection.is_subset(&a));
        prop_assert!(intersection.is_subset(&b));
        prop_assert!(union.is_superset(&a));
        prop_assert!(a.difference(&b).is_disjoint(&b));
        prop_assert_eq!(
            a.symmetric_difference(&b).len(),
            union.len() - intersection.len()
        );
    }

    #[test]
    fn prop_json_round_trip(value in json_value()) {
        setup();
        let text = serde_json::to_string(&value).unwrap();
        let decoded = json::decode(&text);
        prop_assert!(!decoded.is_null());
        let encoded = json::encode(&decoded).as_str_lossy();
        let reparsed: Value = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(reparsed, value);
    }

    #[test]
    fn prop_brace_free_template_is_unchanged(template in "[^{}]{0,40}") {
        prop_assert_eq!(format(&template, &[FormatArg::positional("x")]), template);
    }

    #[test]
    fn prop_positional_placeholders_fill_in_order(
        parts in prop::collection::vec("[a-z0-9]{0,6}", 0..8),
    ) {
        let template = vec!["{}"; parts.len()].join("|");
        let args: Vec<FormatArg> = parts.iter().map(|p| FormatArg::positional(p.as_str())).collect();
        prop_assert_eq!(format(&template, &args), parts.join("|"));
    }

    #[test]
    fn prop_clone_counts(copies in 0usize..8) {
        setup();
        let value = Handle::from("counted");
        let clones: Vec<Handle> = (0..copies).map(|_| value.clone()).collect();
        prop_assert_eq!(value.refcount(), copies + 1);
        drop(clones);
        prop_assert_eq!(value.refcount(), 1);
    }
}

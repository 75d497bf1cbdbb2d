//! Property-based tests for the configuration tree.

use super::{Configuration, ValueHolder};
use crate::coerce::coerce;
use crate::value::Value;
use proptest::prelude::*;

// Dotted paths of one to four short segments
fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-d]{1,3}", 1..=4).prop_map(|segments| segments.join("."))
}

fn writes_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec((path_strategy(), "[a-z0-9]{0,8}"), 0..24)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 1000,
        .. ProptestConfig::default()
    })]

    // A value set on a fresh tree reads back unchanged
    #[test]
    fn set_then_get(path in path_strategy(), text in "[a-z0-9 ]{0,16}") {
        let mut config = Configuration::in_memory();
        config.set(&path, text.as_str()).unwrap();
        let mut node = config.get_node(&path).unwrap();
        prop_assert_eq!(node.value(), Value::from(text));
        prop_assert!(node.is_attached());
    }

    // Rebuilding from a snapshot reproduces the same tree
    #[test]
    fn snapshot_rebuild_is_stable(writes in writes_strategy()) {
        let mut config = Configuration::in_memory();
        for (path, text) in &writes {
            let _ = config.set(path, text.as_str());
        }
        let rebuilt = Configuration::from_snapshot(config.snapshot());
        prop_assert_eq!(rebuilt.dump(), config.dump());
        prop_assert_eq!(rebuilt.get_keys(true), config.get_keys(true));
    }

    // A rejected write leaves the tree exactly as it was
    #[test]
    fn failed_set_changes_nothing(writes in writes_strategy(), extra in path_strategy()) {
        let mut config = Configuration::in_memory();
        for (path, text) in &writes {
            let _ = config.set(path, text.as_str());
        }
        let before = config.dump();
        if config.set(&extra, "new").is_err() {
            prop_assert_eq!(config.dump(), before);
        }
    }

    // Every deep key names a reachable node
    #[test]
    fn deep_keys_are_reachable(writes in writes_strategy()) {
        let mut config = Configuration::in_memory();
        for (path, text) in &writes {
            let _ = config.set(path, text.as_str());
        }
        for key in config.get_keys(true) {
            prop_assert!(config.has_node(&key), "missing {}", key);
        }
    }

    // Integers survive a trip through their text form
    #[test]
    fn integer_text_coerces_back(n in any::<i32>()) {
        let text = Value::from(n.to_string());
        prop_assert_eq!(coerce::<i32>(&text), Some(n));
        prop_assert_eq!(coerce::<i64>(&text), Some(i64::from(n)));
    }
}

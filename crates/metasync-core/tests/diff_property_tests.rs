//! Property tests for the diff engine

use metasync_core::{ActionKind, MetadataRecord, ResourceType, diff};
use metasync_test_utils::fixtures::{registry, upstream};
use proptest::prelude::*;
use serde_json::json;

fn resource_type() -> impl Strategy<Value = ResourceType> {
    prop::sample::select(ResourceType::PRECEDENCE.to_vec())
}

fn records() -> impl Strategy<Value = Vec<MetadataRecord>> {
    prop::collection::btree_map("[a-z]{1,6}", (resource_type(), 0u8..4), 0..24).prop_map(|map| {
        map.into_iter()
            .map(|(id, (resource_type, name))| {
                MetadataRecord::new(id, resource_type).with_attribute("name", json!(name))
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn diff_is_deterministic_regardless_of_input_order(
        wanted in records(),
        current in records(),
    ) {
        let mut reversed_wanted = wanted.clone();
        reversed_wanted.reverse();
        let mut reversed_current = current.clone();
        reversed_current.reverse();

        let a = diff(&upstream(wanted), &registry(current), None, false);
        let b = diff(&upstream(reversed_wanted), &registry(reversed_current), None, false);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn batch_respects_dependency_order(wanted in records(), current in records()) {
        let batch = diff(&upstream(wanted), &registry(current), None, false);
        for pair in batch.actions().windows(2) {
            let left = (pair[0].resource_type.precedence(), &pair[0].external_id);
            let right = (pair[1].resource_type.precedence(), &pair[1].external_id);
            prop_assert!(left < right);
        }
    }

    #[test]
    fn exactly_one_action_per_upstream_record(wanted in records(), current in records()) {
        let expected = wanted.len();
        let batch = diff(&upstream(wanted), &registry(current), None, false);
        prop_assert_eq!(batch.len(), expected);
    }

    #[test]
    fn diff_against_itself_is_all_noop(wanted in records()) {
        let batch = diff(&upstream(wanted.clone()), &registry(wanted), None, false);
        prop_assert!(batch.actions().iter().all(|a| a.kind == ActionKind::Noop));
    }
}

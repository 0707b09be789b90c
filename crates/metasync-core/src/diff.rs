//! Diff engine
//!
//! Produces exactly one action per upstream record. Registry-only records are
//! left alone: the engine never deletes.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::model::{DiffAction, ImportBatch, MetadataRecord, Snapshot, is_reserved_key};

/// Pseudo attribute reported when a record changed resource type. Never a
/// real attribute name: the `__` prefix is reserved by the wire shape.
pub const TYPE_KEY: &str = "__type";

/// Compute the reconciliation batch that brings `registry` in line with
/// `upstream`.
///
/// With `compare_to_previous` set and a previous export available, the batch
/// is flagged when upstream is unchanged since that export. The registry diff
/// is computed either way.
pub fn diff(
    upstream: &Snapshot,
    registry: &Snapshot,
    previous: Option<&Snapshot>,
    compare_to_previous: bool,
) -> ImportBatch {
    let registry_index = registry.index();

    let actions = upstream
        .records()
        .iter()
        .map(|wanted| match registry_index.get(wanted.external_id.as_str()) {
            None => DiffAction::create(
                wanted.resource_type,
                &wanted.external_id,
                wanted.wire_attributes(),
            ),
            Some(current) => {
                let changed = changed_keys(wanted, current);
                if changed.is_empty() {
                    DiffAction::noop(wanted.resource_type, &wanted.external_id)
                } else {
                    DiffAction::update(
                        wanted.resource_type,
                        &wanted.external_id,
                        wanted.wire_attributes(),
                        changed,
                    )
                }
            }
        })
        .collect();

    let upstream_unchanged = compare_to_previous
        && previous.is_some_and(|previous| upstream.same_content(previous));

    let batch = ImportBatch::new(actions, upstream_unchanged);
    let counts = batch.counts();
    tracing::debug!(
        upstream = upstream.len(),
        registry = registry.len(),
        create = counts.create,
        update = counts.update,
        noop = counts.noop,
        upstream_unchanged,
        "Computed diff"
    );
    batch
}

/// Attribute keys whose values differ between two records.
///
/// Compares the union of both key sets; a key missing on one side is treated
/// as `null`. Reserved envelope keys are skipped. A resource type change is
/// reported as [`TYPE_KEY`].
pub fn changed_keys(wanted: &MetadataRecord, current: &MetadataRecord) -> BTreeSet<String> {
    let mut changed: BTreeSet<String> = wanted
        .attributes
        .keys()
        .chain(current.attributes.keys())
        .filter(|key| !is_reserved_key(key))
        .filter(|key| {
            !values_equal(
                wanted.attributes.get(*key).unwrap_or(&Value::Null),
                current.attributes.get(*key).unwrap_or(&Value::Null),
            )
        })
        .cloned()
        .collect();

    if wanted.resource_type != current.resource_type {
        changed.insert(TYPE_KEY.to_string());
    }
    changed
}

/// Deep value equality.
///
/// Objects compare by key regardless of order, with absent keys equal to
/// `null`. Numbers compare by value across integer and float representations.
/// Arrays stay order-sensitive.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                match (x.as_f64(), y.as_f64()) {
                    (Some(x), Some(y)) => x == y,
                    _ => false,
                }
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => objects_equal(xs, ys),
        _ => a == b,
    }
}

fn objects_equal(xs: &Map<String, Value>, ys: &Map<String, Value>) -> bool {
    xs.keys().chain(ys.keys()).all(|key| {
        values_equal(
            xs.get(key).unwrap_or(&Value::Null),
            ys.get(key).unwrap_or(&Value::Null),
        )
    })
}

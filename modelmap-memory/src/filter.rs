//! Exact-match record filtering for the in-memory backend.

use bson::{Bson, Document};

/// Whether every field in `query` is present in `record` with an equal value.
pub(crate) fn matches(record: &Document, query: &Document) -> bool {
    query.iter().all(|(key, expected)| {
        record
            .get(key)
            .is_some_and(|actual| values_equal(actual, expected))
    })
}

// Integers and doubles are normalized before comparison so a query written
// with one numeric width still matches records stored with another.
fn values_equal(left: &Bson, right: &Bson) -> bool {
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => left == right,
        _ => left == right,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(value) => Some(*value as f64),
        Bson::Int64(value) => Some(*value as f64),
        Bson::Double(value) => Some(*value),
        _ => None,
    }
}

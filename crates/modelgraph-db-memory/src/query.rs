//! Lookup evaluation and ordering over JSON field values.

use std::cmp::Ordering;

use modelgraph_core::{Lookup, LookupOp, OrderBy, Record};
use serde_json::Value;

/// Compares two stored values for lookup purposes.
///
/// Numbers compare numerically, so `1` matches `1.0`.
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l == r,
            _ => l.as_f64() == r.as_f64(),
        },
        _ => left == right,
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values. Nulls sort first.
pub fn compare_values(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Number(l), Value::Number(r)) => match (l.as_i64(), r.as_i64()) {
            (Some(l), Some(r)) => l.cmp(&r),
            _ => l
                .as_f64()
                .unwrap_or(f64::NAN)
                .total_cmp(&r.as_f64().unwrap_or(f64::NAN)),
        },
        (Value::String(l), Value::String(r)) => l.cmp(r),
        (Value::Array(l), Value::Array(r)) => l
            .iter()
            .zip(r)
            .map(|(l, r)| compare_values(l, r))
            .find(|ord| ord.is_ne())
            .unwrap_or_else(|| l.len().cmp(&r.len())),
        _ => type_rank(left).cmp(&type_rank(right)),
    }
}

fn matches_value(value: &Value, op: &LookupOp) -> bool {
    match op {
        LookupOp::Exact(expected) => values_equal(value, expected),
        LookupOp::In(candidates) => candidates.iter().any(|c| values_equal(value, c)),
    }
}

/// Returns `true` if the record satisfies the lookup. Missing fields are null.
///
/// An array value matches when any of its elements does, so a many-to-many
/// field is filtered by the keys it holds.
pub fn matches_lookup(record: &Record, lookup: &Lookup) -> bool {
    match record.get(&lookup.field).unwrap_or(&Value::Null) {
        Value::Array(items) => items.iter().any(|item| matches_value(item, &lookup.op)),
        value => matches_value(value, &lookup.op),
    }
}

/// Compares two records by the ordering clauses, then by primary key.
pub fn compare_records(left: &Record, right: &Record, order_by: &[OrderBy], pk: &str) -> Ordering {
    let null = Value::Null;
    for clause in order_by {
        let l = left.get(&clause.field).unwrap_or(&null);
        let r = right.get(&clause.field).unwrap_or(&null);
        let ord = compare_values(l, r);
        let ord = if clause.descending { ord.reverse() } else { ord };
        if ord.is_ne() {
            return ord;
        }
    }
    compare_values(
        left.get(pk).unwrap_or(&null),
        right.get(pk).unwrap_or(&null),
    )
}

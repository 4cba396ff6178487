//! Record normalization. Locates the batch-record array inside whatever shape
//! the portal wrapped it in, and maps raw JSON records to domain `BatchRecord`s.
//!
//! This is a structural sniff, not schema validation: an empty result means
//! "no data available" and is never an error.

use crate::domain::BatchRecord;
use serde_json::Value;

/// Keys the portal has been seen to wrap its record array in.
const KNOWN_KEYS: &[&str] = &["yearList", "batchList", "data", "list"];

/// Which wrapper a payload matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordShape {
    /// `{"yearList": [...]}` and friends.
    KeyedObject,
    /// `[[...]]`
    NestedArray,
    /// `[{...}, ...]`
    FlatArray,
    /// `{"whatever": [{...}]}`
    ScannedValues,
}

type ShapeMatcher = fn(&Value) -> Option<&Vec<Value>>;

/// Tried in order; first match wins.
const MATCHERS: &[(RecordShape, ShapeMatcher)] = &[
    (RecordShape::KeyedObject, try_keyed_object),
    (RecordShape::NestedArray, try_nested_array),
    (RecordShape::FlatArray, try_flat_array),
    (RecordShape::ScannedValues, try_scan_values),
];

fn is_array_of_objects(value: &Value) -> bool {
    matches!(value.as_array().and_then(|a| a.first()), Some(Value::Object(_)))
}

fn try_keyed_object(value: &Value) -> Option<&Vec<Value>> {
    let object = value.as_object()?;
    KNOWN_KEYS
        .iter()
        .filter_map(|k| object.get(*k).and_then(Value::as_array))
        .find(|a| !a.is_empty())
}

fn try_nested_array(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()?.first()?.as_array()
}

fn try_flat_array(value: &Value) -> Option<&Vec<Value>> {
    is_array_of_objects(value).then(|| value.as_array()).flatten()
}

fn try_scan_values(value: &Value) -> Option<&Vec<Value>> {
    value
        .as_object()?
        .values()
        .find(|v| is_array_of_objects(v))
        .and_then(Value::as_array)
}

/// Matched shape and the raw items it wraps.
pub fn sniff(value: &Value) -> Option<(RecordShape, &[Value])> {
    MATCHERS
        .iter()
        .find_map(|(shape, matcher)| matcher(value).map(|items| (*shape, items.as_slice())))
}

/// Raw items of the record array; empty when no shape matched.
pub fn extract_raw(value: &Value) -> &[Value] {
    sniff(value).map(|(_, items)| items).unwrap_or_default()
}

/// Object items of the record array as `BatchRecord`s, in upstream order.
pub fn extract(value: &Value) -> Vec<BatchRecord> {
    extract_raw(value)
        .iter()
        .filter_map(batch_record_from_value)
        .collect()
}

/// Batch labels from a payload that is either a list of strings or a list of
/// records exposing `batch`. Order is preserved; callers sort.
pub fn batch_labels(value: &Value) -> Vec<String> {
    let items = match sniff(value) {
        Some((_, items)) => items,
        // A bare array of strings matches no record shape.
        None => value.as_array().map(Vec::as_slice).unwrap_or_default(),
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => text_field(item, "batch"),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Portal fields are sometimes numbers; treat both as text.
fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn batch_record_from_value(value: &Value) -> Option<BatchRecord> {
    if !value.is_object() {
        return None;
    }
    let text = |key| text_field(value, key).unwrap_or_default();
    Some(BatchRecord {
        degree: text("degree"),
        year: text("year"),
        batch: text("batch"),
        semester: text("semester"),
        school_dept: text("school_dept"),
        session: text("session"),
        group_name: text_field(value, "group_name"),
        sub_batch: text_field(value, "sub_batch"),
        status: text("status"),
    })
}

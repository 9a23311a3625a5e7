//! Deterministic JSON serialization for exported translation skeletons.
//!
//! Keys are written in alphabetical order, except generated document ids
//! (20+ lowercase alphanumerics), which follow in first-seen order. Keys starting
//! with `-=` are deletion markers and are never written. Output uses a four space
//! indent and ends with a newline, so two exports of an unchanged pack are
//! byte-identical.

use std::sync::OnceLock;

use indexmap::IndexSet;
use regex::Regex;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Serializer, Value};

use crate::translation::error::{BabeleError, BabeleResult};

const INDENT: &[u8] = b"    ";

fn generated_id_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9]{20,}$").ok())
        .as_ref()
}

/// Whether `key` looks like a generated document id.
pub fn is_generated_id(key: &str) -> bool {
    generated_id_pattern().is_some_and(|pattern| pattern.is_match(key))
}

fn is_deletion_key(key: &str) -> bool {
    key.starts_with("-=")
}

/// Serializes `value` with stable key order, four space indent and a trailing newline.
pub fn to_ordered_string(value: &Value) -> BabeleResult<String> {
    let mut ids = IndexSet::new();
    collect_generated_ids(value, &mut ids);

    let ordered = reorder(value, &ids);

    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(INDENT));
    ordered.serialize(&mut serializer)?;

    let mut output =
        String::from_utf8(buffer).map_err(|e| BabeleError::Serialization(e.to_string()))?;
    output.push('\n');
    Ok(output)
}

fn collect_generated_ids(value: &Value, ids: &mut IndexSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if is_deletion_key(key) {
                    continue;
                }
                if is_generated_id(key) {
                    ids.insert(key.clone());
                }
                collect_generated_ids(child, ids);
            }
        }
        Value::Array(items) => items.iter().for_each(|item| collect_generated_ids(item, ids)),
        _ => {}
    }
}

fn reorder(value: &Value, ids: &IndexSet<String>) -> Value {
    match value {
        Value::Object(map) => {
            let mut named: Vec<&String> = map
                .keys()
                .filter(|k| !is_deletion_key(k) && !is_generated_id(k))
                .collect();
            named.sort();

            let mut generated: Vec<&String> = map.keys().filter(|k| is_generated_id(k)).collect();
            generated.sort_by_key(|k| ids.get_index_of(k.as_str()).unwrap_or(usize::MAX));

            let mut ordered = Map::new();
            for key in named.into_iter().chain(generated) {
                if let Some(child) = map.get(key) {
                    ordered.insert(key.clone(), reorder(child, ids));
                }
            }
            Value::Object(ordered)
        }
        Value::Array(items) => Value::Array(items.iter().map(|item| reorder(item, ids)).collect()),
        other => other.clone(),
    }
}

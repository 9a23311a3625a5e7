//! Dot-path access and merge rules for JSON documents.
//!
//! Conflict rules used everywhere in the crate:
//!
//! - object keys merge recursively
//! - arrays replace wholesale
//! - a key that is absent from the source never touches the target

use serde_json::{Map, Value};

/// Resolves a dot-delimited `path` against `value`.
///
/// Numeric segments index into arrays, so `faces.0.name` works on card data.
pub fn get_property<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }

    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Writes `value` at `path`, creating intermediate objects as needed.
///
/// Intermediate non-object values are replaced by objects.
pub fn set_property(root: &mut Value, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };

        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }

        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Writes `value` at `path` inside an object map.
pub fn set_property_in(map: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set_property(child, rest, value);
        }
    }
}

/// Builds the nested object that `path` describes, holding `value` at the leaf.
///
/// `expand_path("system.description.value", "x")` yields
/// `{"system":{"description":{"value":"x"}}}`.
pub fn expand_path(path: &str, value: Value) -> Value {
    let mut root = Value::Object(Map::new());
    set_property(&mut root, path, value);
    root
}

/// Merges `source` into `target`; values from `source` win.
pub fn deep_merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target_map), Value::Object(source_map)) => {
            for (key, value) in source_map {
                match target_map.get_mut(&key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value);
                    }
                    _ => {
                        target_map.insert(key, value);
                    }
                }
            }
        }
        (target, source) => *target = source,
    }
}

/// Merges `source` into `target`, keeping every value `target` already holds.
///
/// Only keys missing from `target` are filled in; nested objects recurse.
pub fn deep_merge_missing(target: &mut Value, source: Value) {
    let (Value::Object(target_map), Value::Object(source_map)) = (target, source) else {
        return;
    };

    for (key, value) in source_map {
        match target_map.get_mut(&key) {
            Some(existing) if existing.is_object() && value.is_object() => {
                deep_merge_missing(existing, value);
            }
            Some(_) => {}
            None => {
                target_map.insert(key, value);
            }
        }
    }
}

/// Returns a copy of `base` with `overlay` deep-merged over it.
pub fn merged(base: &Value, overlay: Value) -> Value {
    let mut result = base.clone();
    deep_merge(&mut result, overlay);
    result
}

/// Truthiness of a JSON value as the mapping layer sees it.
///
/// `null`, `false`, `0` and `""` are falsy; arrays and objects are always truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Extracts the pack collection from a compendium UUID.
///
/// `Compendium.dnd5e.items.Item.abc` yields `dnd5e.items`. Anything that is not a
/// compendium UUID yields `None`.
pub fn collection_from_uuid(uuid: &str) -> Option<String> {
    let mut parts = uuid.split('.');
    if parts.next()? != "Compendium" {
        return None;
    }
    let package = parts.next().filter(|p| !p.is_empty())?;
    let name = parts.next().filter(|n| !n.is_empty())?;
    Some(format!("{package}.{name}"))
}

/// Source identity of a document: the compendium it was imported from, else its own uuid.
pub fn source_uuid(document: &Value) -> Option<&str> {
    ["flags.core.sourceId", "_stats.compendiumSource", "uuid"]
        .iter()
        .filter_map(|path| get_property(document, path).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_property_walks_objects_and_arrays() {
        let doc = json!({"system": {"description": {"value": "A blade."}}, "faces": [{"name": "Ace"}]});

        assert_eq!(get_property(&doc, "system.description.value"), Some(&json!("A blade.")));
        assert_eq!(get_property(&doc, "faces.0.name"), Some(&json!("Ace")));
        assert_eq!(get_property(&doc, "system.missing.value"), None);
        assert_eq!(get_property(&doc, "faces.x"), None);
    }

    #[test]
    fn test_expand_path_builds_nested_object() {
        assert_eq!(
            expand_path("system.description.value", json!("x")),
            json!({"system": {"description": {"value": "x"}}})
        );
        assert_eq!(expand_path("name", json!("n")), json!({"name": "n"}));
    }

    #[test]
    fn test_set_property_replaces_scalar_parents() {
        let mut doc = json!({"system": "flat"});
        set_property(&mut doc, "system.details.value", json!(1));
        assert_eq!(doc, json!({"system": {"details": {"value": 1}}}));
    }

    #[test]
    fn test_deep_merge_rules() {
        let mut target = json!({"a": {"b": 1, "c": 2}, "list": [1, 2, 3], "keep": true});
        deep_merge(&mut target, json!({"a": {"b": 10}, "list": [9]}));

        assert_eq!(target, json!({"a": {"b": 10, "c": 2}, "list": [9], "keep": true}));
    }

    #[test]
    fn test_deep_merge_missing_keeps_existing_values() {
        let mut target = json!({"name": "first", "nested": {"x": 1}});
        deep_merge_missing(&mut target, json!({"name": "second", "nested": {"x": 2, "y": 3}, "z": 4}));

        assert_eq!(target, json!({"name": "first", "nested": {"x": 1, "y": 3}, "z": 4}));
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(false)));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
        assert!(is_truthy(&json!("text")));
    }

    #[test]
    fn test_collection_from_uuid() {
        assert_eq!(
            collection_from_uuid("Compendium.dnd5e.items.Item.abc123"),
            Some("dnd5e.items".to_string())
        );
        assert_eq!(collection_from_uuid("Actor.abc123"), None);
        assert_eq!(collection_from_uuid("Compendium.dnd5e"), None);
    }

    #[test]
    fn test_source_uuid_prefers_core_flag() {
        let doc = json!({
            "uuid": "Actor.x",
            "flags": {"core": {"sourceId": "Compendium.world.monsters.Actor.y"}}
        });
        assert_eq!(source_uuid(&doc), Some("Compendium.world.monsters.Actor.y"));
        assert_eq!(source_uuid(&json!({"uuid": "Actor.x"})), Some("Actor.x"));
        assert_eq!(source_uuid(&json!({})), None);
    }
}

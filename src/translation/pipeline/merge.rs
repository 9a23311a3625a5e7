//! Priority merge of translation files.
//!
//! Files are merged per collection in ascending priority order; a lower priority
//! number takes precedence. Earlier (higher precedence) values are never
//! overwritten, later files only fill in what is missing, entry by entry and field
//! by field.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value;

use crate::translation::config::constants;
use crate::translation::error::{helpers::parse_error, ErrorStats};
use crate::translation::model::{normalize_entries, Translation};
use crate::utils::deep_merge_missing;

/// Raw translation files grouped by provider priority
pub type PriorityBuckets = BTreeMap<i32, Vec<Value>>;

#[derive(Debug, Default)]
pub struct MergedTranslations {
    pub translations: IndexMap<String, Translation>,
    /// Sidebar folder names from `*_packs-folders` files
    pub system_folders: IndexMap<String, String>,
    pub errors: ErrorStats,
}

pub fn merge_by_priority(buckets: PriorityBuckets) -> MergedTranslations {
    let mut merged: IndexMap<String, Value> = IndexMap::new();
    let mut system_folders = IndexMap::new();
    let mut errors = ErrorStats::default();

    for (priority, files) in buckets {
        for mut file in files {
            normalize_entries(&mut file);

            // An invalid file is dropped on its own, before it can take part in the merge
            let translation = match serde_json::from_value::<Translation>(file.clone()) {
                Ok(translation) => translation,
                Err(e) => {
                    let collection = file.get("collection").and_then(Value::as_str).unwrap_or("?");
                    let error = parse_error(format!("invalid translation for {}: {}", collection, e));
                    tracing::error!(%collection, priority, "{}", error);
                    errors.record_error(&error);
                    continue;
                }
            };

            if translation.collection.is_empty() {
                tracing::warn!(priority, "dropping translation without a collection");
                continue;
            }

            if translation.is_folder_file() {
                merge_folder_names(&mut system_folders, &file);
                continue;
            }

            match merged.get_mut(&translation.collection) {
                Some(existing) => {
                    tracing::debug!(collection = %translation.collection, priority, "merging lower precedence translation");
                    deep_merge_missing(existing, file);
                }
                None => {
                    merged.insert(translation.collection, file);
                }
            }
        }
    }

    let translations = merged
        .into_iter()
        .filter_map(|(collection, value)| match serde_json::from_value::<Translation>(value) {
            Ok(translation) => Some((collection, translation)),
            Err(e) => {
                let error = parse_error(format!("invalid merged translation for {}: {}", collection, e));
                tracing::error!(%collection, "{}", error);
                errors.record_error(&error);
                None
            }
        })
        .collect();

    MergedTranslations {
        translations,
        system_folders,
        errors,
    }
}

fn merge_folder_names(folders: &mut IndexMap<String, String>, file: &Value) {
    let Some(entries) = file.get("entries").and_then(Value::as_object) else {
        return;
    };
    for (name, translated) in entries {
        if let Some(translated) = translated.as_str().filter(|t| !t.is_empty()) {
            folders.entry(name.clone()).or_insert_with(|| translated.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_lower_priority_number_wins_field_by_field() {
        let mut buckets = PriorityBuckets::new();
        buckets.insert(
            100,
            vec![json!({
                "collection": "dnd5e.items",
                "label": "Base",
                "entries": {"Longsword": {"name": "Spada", "description": "Base description"}}
            })],
        );
        buckets.insert(
            50,
            vec![json!({
                "collection": "dnd5e.items",
                "entries": [{"id": "Longsword", "name": "Spada lunga"}]
            })],
        );

        let merged = merge_by_priority(buckets);
        let translation = &merged.translations["dnd5e.items"];
        let entry = &translation.entries["Longsword"];

        assert_eq!(entry["name"].as_text(), Some("Spada lunga"));
        assert_eq!(entry["description"].as_text(), Some("Base description"));
        assert_eq!(translation.label.as_deref(), Some("Base"));
        assert!(merged.errors.is_empty());
    }

    #[test]
    fn test_folder_files_go_to_system_folders() {
        let mut buckets = PriorityBuckets::new();
        buckets.insert(
            100,
            vec![json!({
                "collection": "dnd5e_packs-folders",
                "entries": {"Monsters": "Mostri", "Spells": "Incantesimi"}
            })],
        );
        buckets.insert(10, vec![json!({"collection": "x_packs-folders", "entries": {"Monsters": "Creature"}})]);

        let merged = merge_by_priority(buckets);

        assert!(merged.translations.is_empty());
        assert_eq!(merged.system_folders["Monsters"], "Creature");
        assert_eq!(merged.system_folders["Spells"], "Incantesimi");
    }

    #[test]
    fn test_invalid_translation_is_dropped() {
        let mut buckets = PriorityBuckets::new();
        buckets.insert(
            100,
            vec![
                json!({"collection": "dnd5e.items", "entries": "oops"}),
                json!({"collection": "dnd5e.spells", "entries": {}}),
            ],
        );

        let merged = merge_by_priority(buckets);

        assert_eq!(merged.translations.len(), 1);
        assert!(merged.translations.contains_key("dnd5e.spells"));
        assert_eq!(merged.errors.total_errors, 1);
    }

    #[test]
    fn test_invalid_preferred_file_does_not_shadow_valid_fallback() {
        let mut buckets = PriorityBuckets::new();
        buckets.insert(50, vec![json!({"collection": "dnd5e.items", "entries": "oops"})]);
        buckets.insert(
            100,
            vec![json!({"collection": "dnd5e.items", "entries": {"Rope": {"name": "Corda"}}})],
        );

        let merged = merge_by_priority(buckets);

        assert_eq!(merged.errors.total_errors, 1);
        let translation = &merged.translations["dnd5e.items"];
        assert_eq!(translation.entries["Rope"]["name"].as_text(), Some("Corda"));
    }
}

//! Roll table converters.
//!
//! Result rows are keyed by their range, `"{low}-{high}"`. A row that is not
//! translated directly but points at a document in another pack borrows that
//! document's translated name.

use serde_json::{json, Map, Value};

use super::{copy_translated, nested_entry, Converter, ConverterContext};
use crate::translation::catalog::Catalog;
use crate::translation::model::{EntryValue, TranslationEntry};
use crate::utils::{deep_merge, is_truthy};

/// Translates the `results` of one roll table
#[derive(Debug, Clone, Copy)]
pub struct TableResults;

impl Converter for TableResults {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let Some(results) = source.as_array() else {
            return Some(source.clone());
        };
        let translations = translation.and_then(EntryValue::as_entry);
        Some(Value::Array(translate_results(results, translations, ctx.catalog)))
    }
}

/// Translates whole roll tables embedded in an adventure, keyed by table name
#[derive(Debug, Clone, Copy)]
pub struct TableResultsCollection;

impl Converter for TableResultsCollection {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let (Some(tables), Some(translations)) = (source.as_array(), translation.and_then(EntryValue::as_entry)) else {
            return Some(source.clone());
        };

        let translated = tables
            .iter()
            .map(|table| {
                let name = table.get("name").and_then(Value::as_str).unwrap_or_default();
                let Some(entry) = nested_entry(Some(translations), name) else {
                    return table.clone();
                };

                let mut patch = Map::new();
                copy_translated(&mut patch, entry, "name", "name");
                copy_translated(&mut patch, entry, "description", "description");

                if let Some(results) = table.get("results").and_then(Value::as_array) {
                    // Rows are nested under `results` or sit on the table entry itself.
                    let rows = nested_entry(Some(entry), "results").or(Some(entry));
                    patch.insert(
                        "results".to_string(),
                        Value::Array(translate_results(results, rows, ctx.catalog)),
                    );
                }
                patch.insert("translated".to_string(), Value::Bool(true));

                let mut table = table.clone();
                deep_merge(&mut table, Value::Object(patch));
                table
            })
            .collect();

        Some(Value::Array(translated))
    }
}

fn range_key(result: &Value) -> Option<String> {
    let range = result.get("range")?.as_array()?;
    match range.as_slice() {
        [low, high] => Some(format!("{}-{}", range_bound(low)?, range_bound(high)?)),
        _ => None,
    }
}

fn range_bound(bound: &Value) -> Option<String> {
    match bound {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

pub(crate) fn translate_results(
    results: &[Value],
    translations: Option<&TranslationEntry>,
    catalog: &Catalog,
) -> Vec<Value> {
    results
        .iter()
        .map(|result| {
            let direct = translations
                .zip(range_key(result))
                .and_then(|(entries, key)| entries.get(&key).cloned())
                .filter(EntryValue::is_truthy);

            if let Some(text) = direct {
                let mut result = result.clone();
                deep_merge(&mut result, json!({"text": text.to_value(), "translated": true}));
                return result;
            }

            let collection = result
                .get("documentCollection")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty());

            if let Some(collection) = collection {
                let original = json!({"name": result.get("text").cloned().unwrap_or(Value::Null)});
                if let Some(text) = catalog
                    .translate_field("name", collection, &original)
                    .filter(is_truthy)
                {
                    let mut result = result.clone();
                    deep_merge(&mut result, json!({"text": text, "translated": true}));
                    return result;
                }
            }

            result.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::translation::converters::ConverterRegistry;
    use crate::translation::model::{DocumentType, PackMetadata, Translation, TranslationEntry};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn context<'a>(document: &'a Value, entry: &'a TranslationEntry, catalog: &'a Catalog) -> ConverterContext<'a> {
        ConverterContext {
            document,
            entry,
            compendium: None,
            catalog,
        }
    }

    #[test]
    fn test_results_translated_by_range() {
        let catalog = Catalog::default();
        let (document, entry) = (json!({}), TranslationEntry::new());
        let ctx = context(&document, &entry, &catalog);

        let results = json!([
            {"range": [1, 5], "text": "Nothing happens"},
            {"range": [6, 10], "text": "A dragon appears"}
        ]);
        let translation = EntryValue::from(json!({"1-5": "Non succede nulla"}));

        let translated = TableResults.convert(&results, Some(&translation), &ctx).unwrap();

        assert_eq!(
            translated,
            json!([
                {"range": [1, 5], "text": "Non succede nulla", "translated": true},
                {"range": [6, 10], "text": "A dragon appears"}
            ])
        );
    }

    #[test]
    fn test_collection_substitutes_name_and_rows() {
        let catalog = Catalog::default();
        let (document, entry) = (json!({}), TranslationEntry::new());
        let ctx = context(&document, &entry, &catalog);

        let tables = json!([{
            "name": "Weather",
            "description": "Daily weather",
            "results": [{"range": [1, 1], "text": "Rain"}]
        }]);
        let translation = EntryValue::from(json!({
            "Weather": {"name": "Meteo", "results": {"1-1": "Pioggia"}}
        }));

        let translated = TableResultsCollection
            .convert(&tables, Some(&translation), &ctx)
            .unwrap();

        assert_eq!(translated[0]["name"], json!("Meteo"));
        assert_eq!(translated[0]["description"], json!("Daily weather"));
        assert_eq!(translated[0]["results"][0]["text"], json!("Pioggia"));
        assert_eq!(translated[0]["translated"], json!(true));
    }

    #[test]
    fn test_range_key_format() {
        assert_eq!(range_key(&json!({"range": [1, 20]})), Some("1-20".to_string()));
        assert_eq!(range_key(&json!({"range": [3]})), None);
    }

    #[test]
    fn test_range_key_accepts_string_bounds() {
        assert_eq!(range_key(&json!({"range": ["1", "2"]})), Some("1-2".to_string()));
        assert_eq!(range_key(&json!({"range": [1, "2"]})), Some("1-2".to_string()));
        assert_eq!(range_key(&json!({"range": [null, 2]})), None);
    }

    #[test]
    fn test_untranslated_row_borrows_name_from_document_collection() {
        let translations: IndexMap<String, Translation> = serde_json::from_value(json!({
            "dnd5e.monsters": {"entries": {"Goblin": {"name": "Goblin (de)"}}}
        }))
        .unwrap();
        let catalog = Catalog::build(
            ConverterRegistry::with_defaults(),
            translations,
            HashMap::new(),
            &[PackMetadata::new("dnd5e", "monsters", DocumentType::Actor)],
        );
        let (document, entry) = (json!({}), TranslationEntry::new());
        let ctx = context(&document, &entry, &catalog);

        let results = json!([
            {"range": [1, 1], "text": "Goblin", "documentCollection": "dnd5e.monsters"},
            {"range": [2, 2], "text": "Orc", "documentCollection": "dnd5e.unknown"},
            {"range": [3, 3], "text": "Rain"}
        ]);

        let translated = TableResults.convert(&results, None, &ctx).unwrap();

        assert_eq!(translated[0]["text"], json!("Goblin (de)"));
        assert_eq!(translated[0]["translated"], json!(true));
        assert_eq!(translated[1], results[1]);
        assert_eq!(translated[2], results[2]);
    }
}

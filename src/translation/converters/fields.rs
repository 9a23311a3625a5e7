//! Single-field converters.

use serde_json::{Map, Value};

use super::{Converter, ConverterContext};
use crate::translation::model::EntryValue;
use crate::utils::deep_merge;

/// Uses a literal translation when given one, else the owning compendium's
/// translation of `field`.
///
/// Registered as `name` for prototype token names, which follow the actor name
/// unless the entry overrides them.
#[derive(Debug, Clone)]
pub struct MappedField {
    field: String,
}

impl MappedField {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

impl Converter for MappedField {
    fn convert(
        &self,
        _source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        if let Some(EntryValue::Text(text)) = translation {
            return Some(Value::String(text.clone()));
        }
        ctx.compendium?
            .translate_field(&self.field, ctx.document, ctx.catalog)
    }
}

/// Translates `field` on every item of an array, keyed by the item's current value.
///
/// Registered as `nameCollection` (adventure folders) and `textCollection` (scene
/// drawings and notes).
#[derive(Debug, Clone)]
pub struct FieldCollection {
    field: String,
}

impl FieldCollection {
    pub fn new(field: &str) -> Self {
        Self {
            field: field.to_string(),
        }
    }
}

impl Converter for FieldCollection {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        _ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let (Some(items), Some(translations)) = (source.as_array(), translation.and_then(EntryValue::as_entry)) else {
            return Some(source.clone());
        };

        let translated = items
            .iter()
            .map(|item| {
                let translated = item
                    .get(&self.field)
                    .and_then(Value::as_str)
                    .and_then(|key| translations.get(key))
                    .filter(|t| t.is_truthy());

                match translated {
                    Some(text) => {
                        let mut patch = Map::new();
                        patch.insert(self.field.clone(), text.to_value());
                        patch.insert("translated".to_string(), Value::Bool(true));

                        let mut item = item.clone();
                        deep_merge(&mut item, Value::Object(patch));
                        item
                    }
                    None => item.clone(),
                }
            })
            .collect();

        Some(Value::Array(translated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::catalog::Catalog;
    use crate::translation::model::{EntryValue, TranslationEntry};
    use serde_json::json;

    #[test]
    fn test_field_collection_translates_matching_items() {
        let catalog = Catalog::default();
        let document = json!({});
        let entry = TranslationEntry::new();
        let ctx = ConverterContext {
            document: &document,
            entry: &entry,
            compendium: None,
            catalog: &catalog,
        };

        let notes = json!([{"text": "Door"}, {"text": "Window"}]);
        let translation = EntryValue::from(json!({"Door": "Porta"}));

        let result = FieldCollection::new("text")
            .convert(&notes, Some(&translation), &ctx)
            .unwrap();

        assert_eq!(
            result,
            json!([{"text": "Porta", "translated": true}, {"text": "Window"}])
        );
    }

    #[test]
    fn test_field_collection_passes_through_without_translation() {
        let catalog = Catalog::default();
        let document = json!({});
        let entry = TranslationEntry::new();
        let ctx = ConverterContext {
            document: &document,
            entry: &entry,
            compendium: None,
            catalog: &catalog,
        };

        let folders = json!([{"name": "Monsters"}]);
        let result = FieldCollection::new("name").convert(&folders, None, &ctx);

        assert_eq!(result, Some(folders));
    }

    #[test]
    fn test_mapped_field_prefers_literal_translation() {
        let catalog = Catalog::default();
        let document = json!({"name": "Goblin"});
        let entry = TranslationEntry::new();
        let ctx = ConverterContext {
            document: &document,
            entry: &entry,
            compendium: None,
            catalog: &catalog,
        };

        let converter = MappedField::new("name");
        assert_eq!(
            converter.convert(&json!("Goblin"), Some(&EntryValue::from("Kobold")), &ctx),
            Some(json!("Kobold"))
        );
        assert_eq!(converter.convert(&json!("Goblin"), None, &ctx), None, "no compendium, nothing to ask");
    }
}

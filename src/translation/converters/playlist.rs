use serde_json::{Map, Value};

use super::{copy_translated, nested_entry, Converter, ConverterContext};
use crate::translation::model::EntryValue;
use crate::utils::deep_merge;

/// Playlist sounds, keyed by sound name.
#[derive(Debug, Clone, Copy)]
pub struct PlaylistSounds;

impl Converter for PlaylistSounds {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        _ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let (Some(sounds), Some(translations)) = (source.as_array(), translation.and_then(EntryValue::as_entry)) else {
            return Some(source.clone());
        };

        let translated = sounds
            .iter()
            .map(|sound| {
                let name = sound.get("name").and_then(Value::as_str).unwrap_or_default();
                let Some(entry) = nested_entry(Some(translations), name) else {
                    return sound.clone();
                };

                let mut patch = Map::new();
                copy_translated(&mut patch, entry, "name", "name");
                copy_translated(&mut patch, entry, "description", "description");
                patch.insert("translated".to_string(), Value::Bool(true));

                let mut sound = sound.clone();
                deep_merge(&mut sound, Value::Object(patch));
                sound
            })
            .collect();

        Some(Value::Array(translated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::catalog::Catalog;
    use crate::translation::model::TranslationEntry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn convert(sounds: &Value, translation: Option<&EntryValue>) -> Value {
        let catalog = Catalog::default();
        let (document, entry) = (json!({}), TranslationEntry::new());
        let ctx = ConverterContext {
            document: &document,
            entry: &entry,
            compendium: None,
            catalog: &catalog,
        };
        PlaylistSounds.convert(sounds, translation, &ctx).unwrap()
    }

    #[test]
    fn test_sounds_translated_by_name() {
        let sounds = json!([
            {"name": "Tavern", "description": "Lively chatter", "path": "tavern.ogg"},
            {"name": "Storm", "path": "storm.ogg"}
        ]);
        let translation = EntryValue::from(json!({"Tavern": {"name": "Taverne"}}));

        let translated = convert(&sounds, Some(&translation));

        assert_eq!(
            translated,
            json!([
                {"name": "Taverne", "description": "Lively chatter", "path": "tavern.ogg", "translated": true},
                {"name": "Storm", "path": "storm.ogg"}
            ])
        );
    }

    #[test]
    fn test_missing_translation_returns_sounds_unchanged() {
        let sounds = json!([{"name": "Tavern"}]);

        assert_eq!(convert(&sounds, None), sounds);
        assert_eq!(convert(&json!("not a list"), Some(&EntryValue::from("x"))), json!("not a list"));
    }
}

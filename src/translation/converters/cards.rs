use serde_json::{Map, Value};

use super::{copy_translated, nested_entry, Converter, ConverterContext};
use crate::translation::model::{EntryValue, TranslationEntry};
use crate::utils::deep_merge;

const FACE_FIELDS: [&str; 3] = ["img", "name", "text"];

/// Cards of a deck, keyed by card name.
///
/// Faces are matched by position; faces without a translated counterpart are kept
/// as they are. The shared back face is translated from `back`.
#[derive(Debug, Clone, Copy)]
pub struct DeckCards;

impl Converter for DeckCards {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        _ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let (Some(cards), Some(translations)) = (source.as_array(), translation.and_then(EntryValue::as_entry)) else {
            return Some(source.clone());
        };

        let translated = cards
            .iter()
            .map(|card| {
                let name = card.get("name").and_then(Value::as_str).unwrap_or_default();
                match nested_entry(Some(translations), name) {
                    Some(entry) => translate_card(card, entry),
                    None => card.clone(),
                }
            })
            .collect();

        Some(Value::Array(translated))
    }
}

fn translate_card(card: &Value, entry: &TranslationEntry) -> Value {
    let mut patch = Map::new();
    copy_translated(&mut patch, entry, "name", "name");
    copy_translated(&mut patch, entry, "description", "description");
    copy_translated(&mut patch, entry, "suit", "suit");

    if let (Some(faces), Some(EntryValue::List(face_translations))) =
        (card.get("faces").and_then(Value::as_array), entry.get("faces"))
    {
        let faces = faces
            .iter()
            .enumerate()
            .map(|(index, face)| match face_translations.get(index).and_then(EntryValue::as_entry) {
                Some(face_entry) => {
                    let mut face_patch = Map::new();
                    for field in FACE_FIELDS {
                        copy_translated(&mut face_patch, face_entry, field, field);
                    }
                    let mut face = face.clone();
                    deep_merge(&mut face, Value::Object(face_patch));
                    face
                }
                None => face.clone(),
            })
            .collect();
        patch.insert("faces".to_string(), Value::Array(faces));
    }

    if let Some(back) = nested_entry(Some(entry), "back") {
        for field in FACE_FIELDS {
            copy_translated(&mut patch, back, field, &format!("back.{field}"));
        }
    }

    patch.insert("translated".to_string(), Value::Bool(true));

    let mut card = card.clone();
    deep_merge(&mut card, Value::Object(patch));
    card
}

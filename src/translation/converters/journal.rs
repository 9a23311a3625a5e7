use serde_json::{Map, Value};

use super::{copy_translated, nested_entry, Converter, ConverterContext};
use crate::translation::model::EntryValue;
use crate::utils::deep_merge;

/// Journal pages, keyed by page name.
///
/// Substitutes the page name, image caption, source, text content and video size.
#[derive(Debug, Clone, Copy)]
pub struct Pages;

impl Converter for Pages {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        _ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let (Some(pages), Some(translations)) = (source.as_array(), translation.and_then(EntryValue::as_entry)) else {
            return Some(source.clone());
        };

        let translated = pages
            .iter()
            .map(|page| {
                let name = page.get("name").and_then(Value::as_str).unwrap_or_default();
                let Some(entry) = nested_entry(Some(translations), name) else {
                    return page.clone();
                };

                let mut patch = Map::new();
                copy_translated(&mut patch, entry, "name", "name");
                copy_translated(&mut patch, entry, "caption", "image.caption");
                copy_translated(&mut patch, entry, "src", "src");
                copy_translated(&mut patch, entry, "text", "text.content");
                copy_translated(&mut patch, entry, "width", "video.width");
                copy_translated(&mut patch, entry, "height", "video.height");
                patch.insert("translated".to_string(), Value::Bool(true));

                let mut page = page.clone();
                deep_merge(&mut page, Value::Object(patch));
                page
            })
            .collect();

        Some(Value::Array(translated))
    }
}

//! Embedded document converters.
//!
//! Each embedded document (an actor's items, an adventure's actors and scenes) is
//! translated from an inline entry keyed by its id or name when the translation
//! carries one, and otherwise by whichever translated pack knows the document.
//! Documents nobody translates pass through unchanged.

use serde_json::{json, Value};

use super::{Converter, ConverterContext};
use crate::translation::compendium::TranslateOptions;
use crate::translation::mapping::{CompendiumMapping, MappingScope};
use crate::translation::model::{DocumentType, EntryValue, Mapping, TranslationEntry};
use crate::utils::{deep_merge, merged};

/// Embedded documents translated with an explicit mapping (defaults when `None`).
///
/// Registered as `fromPack` for actor items.
#[derive(Debug, Clone)]
pub struct FromPack {
    mapping: Option<Mapping>,
    document_type: DocumentType,
}

impl FromPack {
    pub fn new(mapping: Option<Mapping>, document_type: DocumentType) -> Self {
        Self { mapping, document_type }
    }
}

impl Converter for FromPack {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let mapping = CompendiumMapping::new(self.document_type, self.mapping.as_ref(), ctx.catalog.converters());
        translate_embedded(
            source,
            translation,
            self.document_type,
            &mapping,
            MappingScope::new(ctx.catalog, None),
        )
    }
}

/// Embedded documents translated with the mapping registered for their type.
///
/// Registered as the `adventure*` converters.
#[derive(Debug, Clone, Copy)]
pub struct FromDefaultMapping {
    document_type: DocumentType,
}

impl FromDefaultMapping {
    pub fn new(document_type: DocumentType) -> Self {
        Self { document_type }
    }
}

impl Converter for FromDefaultMapping {
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        let mapping = CompendiumMapping::new(
            self.document_type,
            ctx.catalog.custom_mapping(self.document_type),
            ctx.catalog.converters(),
        );
        translate_embedded(
            source,
            translation,
            self.document_type,
            &mapping,
            MappingScope::new(ctx.catalog, ctx.compendium),
        )
    }
}

fn inline_entry<'a>(entries: &'a TranslationEntry, document: &Value) -> Option<&'a TranslationEntry> {
    let lookup = |key: &str| {
        document
            .get(key)
            .and_then(Value::as_str)
            .and_then(|value| entries.get(value))
            .filter(|entry| entry.is_truthy())
    };
    lookup("_id").or_else(|| lookup("name")).and_then(EntryValue::as_entry)
}

fn translate_embedded(
    source: &Value,
    translation: Option<&EntryValue>,
    document_type: DocumentType,
    mapping: &CompendiumMapping,
    scope: MappingScope<'_>,
) -> Option<Value> {
    let Some(documents) = source.as_array() else {
        return Some(source.clone());
    };
    let inline = translation.and_then(EntryValue::as_entry);

    let translated = documents
        .iter()
        .filter_map(|document| {
            if let Some(entry) = inline.and_then(|entries| inline_entry(entries, document)) {
                let mut fragment = mapping.map(document, entry, scope);
                deep_merge(&mut fragment, json!({"translated": true}));
                return Some(merged(document, fragment));
            }

            match scope.catalog.find_pack_for(document, document_type) {
                Some(pack) => pack.translate(document, TranslateOptions::document(), scope.catalog),
                None => Some(document.clone()),
            }
        })
        .collect();

    Some(Value::Array(translated))
}

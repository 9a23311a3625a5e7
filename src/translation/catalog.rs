//! Translation catalog
//!
//! One immutable snapshot of everything a load produced: the converter registry,
//! the merged translations and one [`TranslatedCompendium`] per supported pack.
//! The engine rebuilds the whole catalog on every load and swaps it in at once.

use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::compendium::{TranslateOptions, TranslatedCompendium};
use super::converters::ConverterRegistry;
use super::model::{DocumentType, Mapping, PackMetadata, Translation};
use crate::utils::{collection_from_uuid, source_uuid, IndexCollator};

#[derive(Debug, Default)]
pub struct Catalog {
    converters: ConverterRegistry,
    packs: IndexMap<String, TranslatedCompendium>,
    translations: IndexMap<String, Translation>,
    custom_mappings: HashMap<DocumentType, Mapping>,
}

impl Catalog {
    /// Builds one compendium per pack of a supported type.
    ///
    /// Packs of other types are skipped; they are never translated.
    pub fn build(
        converters: ConverterRegistry,
        translations: IndexMap<String, Translation>,
        custom_mappings: HashMap<DocumentType, Mapping>,
        packs: &[PackMetadata],
    ) -> Self {
        let mut compendiums = IndexMap::new();

        for metadata in packs {
            let Some(document_type) = metadata.doc_type() else {
                tracing::debug!(
                    collection = %metadata.collection(),
                    document_type = %metadata.document_type,
                    "skipping pack of unsupported type"
                );
                continue;
            };

            let collection = metadata.collection();
            let compendium = TranslatedCompendium::new(
                metadata.clone(),
                document_type,
                translations.get(&collection),
                custom_mappings.get(&document_type),
                &converters,
            );
            compendiums.insert(collection, compendium);
        }

        Self {
            converters,
            packs: compendiums,
            translations,
            custom_mappings,
        }
    }

    pub fn pack(&self, collection: &str) -> Option<&TranslatedCompendium> {
        self.packs.get(collection)
    }

    /// Compendiums in host order
    pub fn packs(&self) -> impl Iterator<Item = &TranslatedCompendium> {
        self.packs.values()
    }

    pub fn translation(&self, collection: &str) -> Option<&Translation> {
        self.translations.get(collection)
    }

    pub fn translations(&self) -> &IndexMap<String, Translation> {
        &self.translations
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn custom_mapping(&self, document_type: DocumentType) -> Option<&Mapping> {
        self.custom_mappings.get(&document_type)
    }

    /// The compendium `collection` if it would translate `document`
    fn translating_pack(&self, collection: &str, document: &Value) -> Option<&TranslatedCompendium> {
        self.pack(collection).filter(|pack| {
            pack.translated() && (pack.has_translation(document, true, self) || pack.mapping().is_dynamic())
        })
    }

    /// Translates `document` as a full document of `collection`.
    ///
    /// Hands `document` back unchanged when no translated compendium exists for
    /// `collection` or it neither has an entry for the document nor a dynamic mapping.
    pub fn translate(&self, collection: &str, document: &Value) -> Value {
        self.translate_with(collection, document, TranslateOptions::document())
    }

    pub fn translate_with(&self, collection: &str, document: &Value, options: TranslateOptions) -> Value {
        self.translating_pack(collection, document)
            .and_then(|pack| pack.translate(document, options, self))
            .unwrap_or_else(|| document.clone())
    }

    /// Translated value of one field; the original value when the pack would not
    /// translate the document, `None` for an unknown pack
    pub fn translate_field(&self, field: &str, collection: &str, document: &Value) -> Option<Value> {
        let pack = self.pack(collection)?;
        match self.translating_pack(collection, document) {
            Some(pack) => pack.translate_field(field, document, self),
            None => pack.extract_field(field, document),
        }
    }

    pub fn extract(&self, collection: &str, document: &Value) -> Map<String, Value> {
        self.pack(collection)
            .map(|pack| pack.extract(document))
            .unwrap_or_default()
    }

    pub fn extract_field(&self, collection: &str, field: &str, document: &Value) -> Option<Value> {
        self.pack(collection)?.extract_field(field, document)
    }

    /// Translates every index entry and sorts the result by translated name
    pub fn translate_index(&self, collection: &str, entries: &[Value], collator: &IndexCollator) -> Vec<Value> {
        let mut translated: Vec<Value> = entries
            .iter()
            .map(|entry| self.translate_with(collection, entry, TranslateOptions::index()))
            .collect();

        translated.sort_by(|a, b| match (display_name(a), display_name(b)) {
            (Some(a), Some(b)) => collator.compare(a, b),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        translated
    }

    /// Finds a translated pack that translates an embedded document of `document_type`.
    ///
    /// The pack named by the document's source identity is tried first, without the
    /// identity check; otherwise the first translated pack of the same type that
    /// accepts the document.
    pub fn find_pack_for(&self, document: &Value, document_type: DocumentType) -> Option<&TranslatedCompendium> {
        let from_source = source_uuid(document)
            .and_then(collection_from_uuid)
            .and_then(|collection| self.pack(&collection))
            .filter(|pack| pack.translated() && pack.has_translation(document, false, self));

        from_source.or_else(|| {
            self.packs().find(|pack| {
                pack.translated()
                    && pack.document_type() == document_type
                    && pack.has_translation(document, true, self)
            })
        })
    }
}

fn display_name(entry: &Value) -> Option<&str> {
    entry.get("name").and_then(Value::as_str)
}

//! Translated compendium
//!
//! Binds a [`CompendiumMapping`] to the translation data of one pack. A compendium
//! built without a [`Translation`] is untranslated and hands documents back as
//! they are; one built with a Translation is the translation authority for its
//! collection.

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use super::catalog::Catalog;
use super::config::constants;
use super::converters::ConverterRegistry;
use super::mapping::{CompendiumMapping, MappingScope};
use super::model::{merge_mappings, DocumentType, Mapping, PackMetadata, Translation, TranslationEntry};
use crate::utils::{collection_from_uuid, deep_merge, merged, source_uuid};

// ============================================================================
// Options and translation markers
// ============================================================================

/// Where the translation markers are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MarkerPlacement {
    /// Top-level `translated`, `hasTranslation` and `originalName` only
    Index,
    /// Top level plus `flags.babele`
    #[default]
    Document,
}

/// How [`TranslatedCompendium::translate`] shapes its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Return the bare translation fragment instead of the merged document
    pub translations_only: bool,
    pub placement: MarkerPlacement,
}

impl TranslateOptions {
    /// Fragment only, no markers
    pub fn fragment() -> Self {
        Self {
            translations_only: true,
            placement: MarkerPlacement::Document,
        }
    }

    /// Merged index entry
    pub fn index() -> Self {
        Self {
            translations_only: false,
            placement: MarkerPlacement::Index,
        }
    }

    /// Merged full document
    pub fn document() -> Self {
        Self::default()
    }
}

/// Writes the translation markers into `target`
pub fn stamp_translation_metadata(
    target: &mut Value,
    has_translation: bool,
    original_name: Option<&Value>,
    placement: MarkerPlacement,
) {
    let mut markers = Map::new();
    markers.insert("translated".to_string(), Value::Bool(true));
    markers.insert("hasTranslation".to_string(), Value::Bool(has_translation));
    markers.insert(
        "originalName".to_string(),
        original_name.cloned().unwrap_or(Value::Null),
    );

    let mut stamp = Value::Object(markers.clone());
    if placement == MarkerPlacement::Document {
        let mut scoped = Map::new();
        scoped.insert(constants::FLAG_SCOPE.to_string(), Value::Object(markers));
        deep_merge(&mut stamp, json!({ "flags": scoped }));
    }
    deep_merge(target, stamp);
}

/// Whether `document` already carries a translation marker
pub fn is_translated(document: &Value) -> bool {
    let marked = |value: Option<&Value>| value.and_then(Value::as_bool) == Some(true);
    marked(document.get("translated"))
        || marked(
            document
                .get("flags")
                .and_then(|flags| flags.get(constants::FLAG_SCOPE))
                .and_then(|scope| scope.get("translated")),
        )
}

// ============================================================================
// TranslatedCompendium
// ============================================================================

/// Translation authority for one pack
#[derive(Debug, Clone)]
pub struct TranslatedCompendium {
    metadata: PackMetadata,
    collection: String,
    document_type: DocumentType,
    mapping: CompendiumMapping,
    translations: IndexMap<String, TranslationEntry>,
    folders: IndexMap<String, String>,
    references: Vec<String>,
    translated: bool,
}

impl TranslatedCompendium {
    /// Builds the compendium for one pack.
    ///
    /// The mapping is the default for the type, then `custom_mapping` (registered by
    /// translation providers), then the mapping carried by the translation file.
    pub fn new(
        mut metadata: PackMetadata,
        document_type: DocumentType,
        translation: Option<&Translation>,
        custom_mapping: Option<&Mapping>,
        converters: &ConverterRegistry,
    ) -> Self {
        let overrides = match (custom_mapping, translation.and_then(|t| t.mapping.as_ref())) {
            (Some(custom), Some(own)) => Some(merge_mappings(custom, own)),
            (Some(custom), None) => Some(custom.clone()),
            (None, own) => own.cloned(),
        };
        let mapping = CompendiumMapping::new(document_type, overrides.as_ref(), converters);
        let collection = metadata.collection();

        let Some(translation) = translation else {
            return Self {
                metadata,
                collection,
                document_type,
                mapping,
                translations: IndexMap::new(),
                folders: IndexMap::new(),
                references: Vec::new(),
                translated: false,
            };
        };

        if let Some(label) = translation.label.as_ref().filter(|l| !l.is_empty()) {
            metadata.label = label.clone();
        }

        Self {
            metadata,
            collection,
            document_type,
            mapping,
            translations: translation.entries.clone(),
            folders: translation.folders.clone(),
            references: translation.reference.clone(),
            translated: true,
        }
    }

    pub fn metadata(&self) -> &PackMetadata {
        &self.metadata
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Pack label, translated when the translation file supplies one
    pub fn label(&self) -> &str {
        &self.metadata.label
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn mapping(&self) -> &CompendiumMapping {
        &self.mapping
    }

    /// Whether a translation file was supplied for this pack
    pub fn translated(&self) -> bool {
        self.translated
    }

    pub fn translations(&self) -> &IndexMap<String, TranslationEntry> {
        &self.translations
    }

    pub fn folders(&self) -> &IndexMap<String, String> {
        &self.folders
    }

    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Translated name of an embedded folder
    pub fn folder_name(&self, name: &str) -> Option<&str> {
        self.folders.get(name).map(String::as_str).filter(|n| !n.is_empty())
    }

    /// Whether this pack, or one of its references, translates `document`.
    ///
    /// With `check_uuid`, a document whose source identity points at another pack is
    /// never matched, even when an entry of the same name exists here.
    pub fn has_translation(&self, document: &Value, check_uuid: bool, catalog: &Catalog) -> bool {
        self.has_translation_at(document, check_uuid, catalog, 0)
    }

    fn has_translation_at(&self, document: &Value, check_uuid: bool, catalog: &Catalog, depth: usize) -> bool {
        if check_uuid && !self.accepts_source(document) {
            return false;
        }
        self.direct_entry(document).is_some() || self.referenced_pack(document, catalog, depth).is_some()
    }

    /// Translation entry for `document` from this pack's own entries, or an empty entry
    pub fn translations_for(&self, document: &Value, check_uuid: bool) -> TranslationEntry {
        if check_uuid && !self.accepts_source(document) {
            return TranslationEntry::new();
        }
        self.direct_entry(document).cloned().unwrap_or_default()
    }

    /// Entry keyed by the document name, then by its id
    fn direct_entry(&self, document: &Value) -> Option<&TranslationEntry> {
        let key = |field: &str| document.get(field).and_then(Value::as_str);
        key("name")
            .and_then(|name| self.translations.get(name))
            .or_else(|| key("_id").and_then(|id| self.translations.get(id)))
    }

    fn accepts_source(&self, document: &Value) -> bool {
        match source_uuid(document) {
            Some(uuid) => collection_from_uuid(uuid).as_deref() == Some(self.collection.as_str()),
            None => true,
        }
    }

    /// First referenced pack that translates `document`
    fn referenced_pack<'c>(
        &self,
        document: &Value,
        catalog: &'c Catalog,
        depth: usize,
    ) -> Option<&'c TranslatedCompendium> {
        if depth >= constants::MAX_REFERENCE_DEPTH {
            tracing::warn!(collection = %self.collection, "reference chain too deep, stopping lookup");
            return None;
        }

        self.references
            .iter()
            .filter(|reference| **reference != self.collection)
            .filter_map(|reference| catalog.pack(reference))
            .find(|pack| pack.translated && pack.has_translation_at(document, false, catalog, depth + 1))
    }

    /// Translates `document`.
    ///
    /// Returns `None` for a `null` document. A document that is already translated is
    /// returned unchanged. Entries of this pack win over entries inherited from the
    /// first reference that translates the document.
    pub fn translate(&self, document: &Value, options: TranslateOptions, catalog: &Catalog) -> Option<Value> {
        if document.is_null() {
            return None;
        }
        if is_translated(document) {
            return Some(document.clone());
        }

        let has_translation = self.has_translation(document, true, catalog);
        let mut fragment = self.fragment(document, true, catalog, 0);

        if options.translations_only {
            return Some(fragment);
        }

        stamp_translation_metadata(&mut fragment, has_translation, document.get("name"), options.placement);
        Some(merged(document, fragment))
    }

    fn fragment(&self, document: &Value, check_uuid: bool, catalog: &Catalog, depth: usize) -> Value {
        let entry = self.translations_for(document, check_uuid);
        let own = self.mapping.map(document, &entry, MappingScope::new(catalog, Some(self)));

        match self.referenced_pack(document, catalog, depth) {
            Some(reference) => {
                let mut inherited = reference.fragment(document, false, catalog, depth + 1);
                deep_merge(&mut inherited, own);
                inherited
            }
            None => own,
        }
    }

    /// Translated value of one field, or its original value when `document` is
    /// already translated
    pub fn translate_field(&self, field: &str, document: &Value, catalog: &Catalog) -> Option<Value> {
        if document.is_null() {
            return None;
        }
        if is_translated(document) {
            return self.extract_field(field, document);
        }

        let entry = self.translations_for(document, true);
        self.mapping
            .translate_field(field, document, &entry, MappingScope::new(catalog, Some(self)))
    }

    pub fn extract_field(&self, field: &str, document: &Value) -> Option<Value> {
        self.mapping.extract_field(field, document)
    }

    pub fn extract(&self, document: &Value) -> Map<String, Value> {
        self.mapping.extract(document)
    }
}

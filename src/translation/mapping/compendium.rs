use serde_json::{Map, Value};

use super::{default_mapping, FieldMapping, MappingScope};
use crate::translation::config::constants;
use crate::translation::converters::ConverterRegistry;
use crate::translation::model::{merge_mappings, DocumentType, Mapping, TranslationEntry};
use crate::utils::deep_merge;

/// Full field mapping of one document type.
///
/// Built from the default mapping of the type with `overrides` laid over it.
#[derive(Debug, Clone)]
pub struct CompendiumMapping {
    document_type: DocumentType,
    mapping: Mapping,
    fields: Vec<FieldMapping>,
}

impl CompendiumMapping {
    pub fn new(
        document_type: DocumentType,
        overrides: Option<&Mapping>,
        converters: &ConverterRegistry,
    ) -> Self {
        let defaults = default_mapping(document_type);
        let mapping = match overrides {
            Some(overrides) => merge_mappings(&defaults, overrides),
            None => defaults,
        };
        let fields = mapping
            .iter()
            .map(|(field, target)| FieldMapping::new(field, target, converters))
            .collect();

        Self {
            document_type,
            mapping,
            fields,
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// The merged mapping, as written to exported translation files
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn fields(&self) -> &[FieldMapping] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|f| f.field() == name)
    }

    /// Translation fragment for `document`: every mapped field, nested under its path
    pub fn map(&self, document: &Value, entry: &TranslationEntry, scope: MappingScope<'_>) -> Value {
        self.fields
            .iter()
            .fold(Value::Object(Map::new()), |mut acc, field| {
                deep_merge(&mut acc, field.map(document, entry, scope));
                acc
            })
    }

    pub fn translate_field(
        &self,
        name: &str,
        document: &Value,
        entry: &TranslationEntry,
        scope: MappingScope<'_>,
    ) -> Option<Value> {
        self.field(name)?.translate(document, entry, scope)
    }

    pub fn extract_field(&self, name: &str, document: &Value) -> Option<Value> {
        self.field(name)?.extract_value(document).cloned()
    }

    /// Skeleton of the translatable fields of `document`.
    ///
    /// Dynamic fields get the converter placeholder instead of their value; fields
    /// missing from the document are left out.
    pub fn extract(&self, document: &Value) -> Map<String, Value> {
        let mut skeleton = Map::new();
        for field in &self.fields {
            if field.is_dynamic() {
                skeleton.insert(
                    field.field().to_string(),
                    Value::String(constants::CONVERTER_PLACEHOLDER.to_string()),
                );
                continue;
            }
            if let (name, Some(value)) = field.extract(document) {
                if !value.is_null() {
                    skeleton.insert(name, value);
                }
            }
        }
        skeleton
    }

    /// Whether any field is routed through a converter
    pub fn is_dynamic(&self) -> bool {
        self.fields.iter().any(FieldMapping::is_dynamic)
    }
}

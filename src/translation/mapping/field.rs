use std::fmt;
use std::sync::Arc;

use serde_json::{json, Value};

use super::MappingScope;
use crate::translation::converters::{Converter, ConverterContext, ConverterRegistry};
use crate::translation::model::{EntryValue, MappingTarget, TranslationEntry};
use crate::utils::{expand_path, get_property, is_truthy};

/// Maps, translates or extracts the value of one field.
///
/// `FieldMapping::new("description", &"system.description.value".into(), &registry)`
/// reads `system.description.value` from the source document and looks up the
/// translated text under `description` in the translation entry.
#[derive(Clone)]
pub struct FieldMapping {
    field: String,
    path: String,
    converter_name: Option<String>,
    converter: Option<Arc<dyn Converter>>,
}

impl FieldMapping {
    /// Binds the converter named by `target` against `converters`.
    ///
    /// An unknown converter name leaves the field dynamic but without a converter;
    /// such a field never translates.
    pub fn new(field: &str, target: &MappingTarget, converters: &ConverterRegistry) -> Self {
        let converter_name = target.converter().map(str::to_string);
        let converter = converter_name.as_deref().and_then(|name| converters.get(name));

        if let (Some(name), None) = (&converter_name, &converter) {
            tracing::debug!(field, converter = %name, "converter not registered, field will not translate");
        }

        Self {
            field: field.to_string(),
            path: target.path().to_string(),
            converter_name,
            converter,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn converter_name(&self) -> Option<&str> {
        self.converter_name.as_deref()
    }

    /// Whether the mapping names a converter, registered or not
    pub fn is_dynamic(&self) -> bool {
        self.converter_name.is_some()
    }

    /// The value at this field's path in `document`
    pub fn extract_value<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        get_property(document, &self.path)
    }

    /// Translated value for this field, or `None` when there is nothing to write back.
    ///
    /// Converters own the shape of their result. Without a converter only string
    /// values are translated, straight from the entry.
    pub fn translate(
        &self,
        document: &Value,
        entry: &TranslationEntry,
        scope: MappingScope<'_>,
    ) -> Option<Value> {
        let original = self.extract_value(document).filter(|value| is_truthy(value))?;

        if let Some(converter) = &self.converter {
            let ctx = ConverterContext {
                document,
                entry,
                compendium: scope.compendium,
                catalog: scope.catalog,
            };
            return converter.convert(original, entry.get(&self.field), &ctx);
        }

        if self.is_dynamic() || !original.is_string() {
            return None;
        }

        entry.get(&self.field).map(EntryValue::to_value)
    }

    /// The translated value nested under this field's path, or `{}`
    pub fn map(&self, document: &Value, entry: &TranslationEntry, scope: MappingScope<'_>) -> Value {
        match self.translate(document, entry, scope).filter(is_truthy) {
            Some(value) => expand_path(&self.path, value),
            None => json!({}),
        }
    }

    /// `(field, value)` for a translation file skeleton
    pub fn extract(&self, document: &Value) -> (String, Option<Value>) {
        (self.field.clone(), self.extract_value(document).cloned())
    }
}

impl fmt::Debug for FieldMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMapping")
            .field("field", &self.field)
            .field("path", &self.path)
            .field("converter", &self.converter_name)
            .field("bound", &self.converter.is_some())
            .finish()
    }
}

//! Translation file model
//!
//! Wire types for translation files, mappings, pack metadata and provider
//! descriptors. Duck-typed wire shapes (string or object entries, object or array
//! `entries`, string or list `reference`) are resolved here once, at parse time.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::config::constants;
use super::error::{helpers::validation_error, BabeleError};

// ============================================================================
// Document types
// ============================================================================

/// Document types that can be translated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    Adventure,
    Actor,
    Cards,
    Folder,
    Item,
    JournalEntry,
    Macro,
    Playlist,
    RollTable,
    Scene,
}

impl DocumentType {
    pub const ALL: [DocumentType; 10] = [
        DocumentType::Adventure,
        DocumentType::Actor,
        DocumentType::Cards,
        DocumentType::Folder,
        DocumentType::Item,
        DocumentType::JournalEntry,
        DocumentType::Macro,
        DocumentType::Playlist,
        DocumentType::RollTable,
        DocumentType::Scene,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Adventure => "Adventure",
            DocumentType::Actor => "Actor",
            DocumentType::Cards => "Cards",
            DocumentType::Folder => "Folder",
            DocumentType::Item => "Item",
            DocumentType::JournalEntry => "JournalEntry",
            DocumentType::Macro => "Macro",
            DocumentType::Playlist => "Playlist",
            DocumentType::RollTable => "RollTable",
            DocumentType::Scene => "Scene",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = BabeleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BabeleError::UnsupportedDocumentType(s.to_string()))
    }
}

// ============================================================================
// Mappings
// ============================================================================

/// Where a mapped field lives in the source document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingTarget {
    /// Dot-delimited path, substituted literally
    Path(String),
    /// Path whose value is handed to a named converter
    Dynamic { converter: String, path: String },
}

impl MappingTarget {
    pub fn path(&self) -> &str {
        match self {
            MappingTarget::Path(path) => path,
            MappingTarget::Dynamic { path, .. } => path,
        }
    }

    pub fn converter(&self) -> Option<&str> {
        match self {
            MappingTarget::Path(_) => None,
            MappingTarget::Dynamic { converter, .. } => Some(converter),
        }
    }

    pub fn dynamic(converter: impl Into<String>, path: impl Into<String>) -> Self {
        MappingTarget::Dynamic {
            converter: converter.into(),
            path: path.into(),
        }
    }
}

impl From<&str> for MappingTarget {
    fn from(path: &str) -> Self {
        MappingTarget::Path(path.to_string())
    }
}

/// Field name to source location
pub type Mapping = IndexMap<String, MappingTarget>;

/// Layers `overrides` over `base`; override keys replace base keys.
pub fn merge_mappings(base: &Mapping, overrides: &Mapping) -> Mapping {
    let mut merged = base.clone();
    for (field, target) in overrides {
        merged.insert(field.clone(), target.clone());
    }
    merged
}

// ============================================================================
// Translation entries
// ============================================================================

/// Per-document translation: field name to translated value
pub type TranslationEntry = IndexMap<String, EntryValue>;

/// One translated value
#[derive(Debug, Clone, PartialEq)]
pub enum EntryValue {
    /// Literal translated string
    Text(String),
    /// Nested entry, consumed by converters
    Entry(TranslationEntry),
    /// Positional values (card faces, for instance)
    List(Vec<EntryValue>),
    /// Numbers, booleans and null carried through as-is
    Scalar(Value),
}

impl EntryValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntryValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_entry(&self) -> Option<&TranslationEntry> {
        match self {
            EntryValue::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    /// Looks up `key` when this value is a nested entry
    pub fn get(&self, key: &str) -> Option<&EntryValue> {
        self.as_entry().and_then(|entry| entry.get(key))
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            EntryValue::Text(text) => !text.is_empty(),
            EntryValue::Entry(_) | EntryValue::List(_) => true,
            EntryValue::Scalar(value) => crate::utils::is_truthy(value),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            EntryValue::Text(text) => Value::String(text.clone()),
            EntryValue::Entry(entry) => Value::Object(entry_to_map(entry)),
            EntryValue::List(items) => Value::Array(items.iter().map(EntryValue::to_value).collect()),
            EntryValue::Scalar(value) => value.clone(),
        }
    }
}

impl From<Value> for EntryValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => EntryValue::Text(text),
            Value::Object(map) => EntryValue::Entry(entry_from_map(map)),
            Value::Array(items) => EntryValue::List(items.into_iter().map(EntryValue::from).collect()),
            other => EntryValue::Scalar(other),
        }
    }
}

impl From<&str> for EntryValue {
    fn from(text: &str) -> Self {
        EntryValue::Text(text.to_string())
    }
}

impl Serialize for EntryValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(EntryValue::from)
    }
}

/// Converts a JSON object into a translation entry
pub fn entry_from_map(map: Map<String, Value>) -> TranslationEntry {
    map.into_iter().map(|(k, v)| (k, EntryValue::from(v))).collect()
}

/// Converts a translation entry back into a JSON object
pub fn entry_to_map(entry: &TranslationEntry) -> Map<String, Value> {
    entry.iter().map(|(k, v)| (k.clone(), v.to_value())).collect()
}

// ============================================================================
// Translation files
// ============================================================================

/// Parsed translation file for one collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    #[serde(default)]
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Mapping>,
    #[serde(default, deserialize_with = "deserialize_entries", skip_serializing_if = "IndexMap::is_empty")]
    pub entries: IndexMap<String, TranslationEntry>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub folders: IndexMap<String, String>,
    #[serde(default, deserialize_with = "deserialize_reference", skip_serializing_if = "Vec::is_empty")]
    pub reference: Vec<String>,
}

impl Translation {
    /// Whether this file only translates sidebar folder names
    pub fn is_folder_file(&self) -> bool {
        self.collection.ends_with(constants::FOLDERS_SUFFIX)
    }
}

/// Rewrites array-shaped `entries` into the object shape, keyed by each item's `id`.
///
/// Items without a string `id` are dropped. Object-shaped entries are left as they are.
pub fn normalize_entries(translation: &mut Value) {
    let Some(entries) = translation.get_mut("entries") else {
        return;
    };

    if let Value::Array(items) = entries {
        let keyed: Map<String, Value> = std::mem::take(items)
            .into_iter()
            .filter_map(|item| {
                let id = item.get("id")?.as_str()?.to_string();
                Some((id, item))
            })
            .collect();
        *entries = Value::Object(keyed);
    }
}

fn deserialize_entries<'de, D>(deserializer: D) -> Result<IndexMap<String, TranslationEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut wrapper = Value::Object(Map::from_iter([(
        "entries".to_string(),
        Value::deserialize(deserializer)?,
    )]));
    normalize_entries(&mut wrapper);

    match wrapper.get_mut("entries").map(Value::take) {
        Some(Value::Object(map)) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::Object(fields) => Some((key, entry_from_map(fields))),
                _ => None,
            })
            .collect()),
        Some(Value::Null) | None => Ok(IndexMap::new()),
        Some(other) => Err(de::Error::custom(format!(
            "entries must be an object or an array, found {}",
            json_kind(&other)
        ))),
    }
}

fn deserialize_reference<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(reference) => vec![reference],
        OneOrMany::Many(references) => references,
        OneOrMany::Nothing(()) => Vec::new(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Export layout of `entries`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Object keyed by original name
    #[default]
    Object,
    /// Array of `{id, ...}` items
    Legacy,
}

impl FromStr for ExportFormat {
    type Err = BabeleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "object" => Ok(ExportFormat::Object),
            "legacy" | "array" => Ok(ExportFormat::Legacy),
            _ => Err(validation_error(format!(
                "unknown export format '{}', expected object or legacy",
                s
            ))),
        }
    }
}

// ============================================================================
// Packs and providers
// ============================================================================

/// Kind of package that owns a pack
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    World,
    System,
    #[default]
    Module,
}

/// Host-side description of one compendium pack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub package_type: PackageType,
    /// Document type as the host reports it; unsupported types are kept verbatim
    #[serde(rename = "type")]
    pub document_type: String,
}

impl PackMetadata {
    pub fn new(package_name: &str, name: &str, document_type: DocumentType) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            package_name: package_name.to_string(),
            package_type: PackageType::Module,
            document_type: document_type.to_string(),
        }
    }

    /// Collection key: `world.<name>` for world packs, `<package>.<name>` otherwise.
    pub fn collection(&self) -> String {
        match self.package_type {
            PackageType::World => format!("world.{}", self.name),
            _ => format!("{}.{}", self.package_name, self.name),
        }
    }

    /// Supported document type, if any
    pub fn doc_type(&self) -> Option<DocumentType> {
        self.document_type.parse().ok()
    }
}

/// A registered translation provider (usually a module)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    /// Stable id; repeated registrations with the same id coalesce
    #[serde(alias = "module")]
    pub id: String,
    #[serde(default, alias = "dir", deserialize_with = "deserialize_directories")]
    pub directories: Vec<String>,
    #[serde(alias = "language")]
    pub lang: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub zip_file: Option<String>,
    #[serde(default)]
    pub custom_mappings: HashMap<DocumentType, Mapping>,
}

fn default_priority() -> i32 {
    constants::DEFAULT_PRIORITY
}

fn default_active() -> bool {
    true
}

fn deserialize_directories<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_reference(deserializer)
}

impl Provider {
    pub fn new(id: &str, lang: &str) -> Self {
        Self {
            id: id.to_string(),
            directories: Vec::new(),
            lang: lang.to_string(),
            priority: constants::DEFAULT_PRIORITY,
            version: None,
            active: true,
            zip_file: None,
            custom_mappings: HashMap::new(),
        }
    }

    pub fn with_directory(mut self, directory: &str) -> Self {
        self.directories.push(directory.to_string());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_zip_file(mut self, zip_file: &str) -> Self {
        self.zip_file = Some(zip_file.to_string());
        self
    }

    pub fn with_custom_mapping(mut self, doc_type: DocumentType, mapping: Mapping) -> Self {
        self.custom_mappings.insert(doc_type, mapping);
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

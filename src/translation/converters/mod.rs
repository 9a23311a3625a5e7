//! Converters
//!
//! A converter translates one structurally complex field: embedded document
//! arrays, table rows, card faces, journal pages. Converters are registered by
//! name and referenced from mappings as `{"converter": "<name>", "path": "..."}`.
//!
//! Every converter must tolerate missing translation data and hand the source value
//! back unchanged when nothing matches.

pub mod cards;
pub mod embedded;
pub mod fields;
pub mod journal;
pub mod playlist;
pub mod tables;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::translation::catalog::Catalog;
use crate::translation::compendium::TranslatedCompendium;
use crate::translation::model::{DocumentType, EntryValue, TranslationEntry};

pub use cards::DeckCards;
pub use embedded::{FromDefaultMapping, FromPack};
pub use fields::{FieldCollection, MappedField};
pub use journal::Pages;
pub use playlist::PlaylistSounds;
pub use tables::{TableResults, TableResultsCollection};

/// Names of the built-in converters
pub mod names {
    pub const FROM_PACK: &str = "fromPack";
    pub const NAME: &str = "name";
    pub const NAME_COLLECTION: &str = "nameCollection";
    pub const TEXT_COLLECTION: &str = "textCollection";
    pub const TABLE_RESULTS: &str = "tableResults";
    pub const TABLE_RESULTS_COLLECTION: &str = "tableResultsCollection";
    pub const PAGES: &str = "pages";
    pub const DECK_CARDS: &str = "deckCards";
    pub const PLAYLIST_SOUNDS: &str = "playlistSounds";
    pub const ADVENTURE_ITEMS: &str = "adventureItems";
    pub const ADVENTURE_ACTORS: &str = "adventureActors";
    pub const ADVENTURE_CARDS: &str = "adventureCards";
    pub const ADVENTURE_JOURNALS: &str = "adventureJournals";
    pub const ADVENTURE_PLAYLISTS: &str = "adventurePlaylists";
    pub const ADVENTURE_MACROS: &str = "adventureMacros";
    pub const ADVENTURE_SCENES: &str = "adventureScenes";
}

/// Everything a converter may consult besides the field value itself
#[derive(Clone, Copy)]
pub struct ConverterContext<'a> {
    /// The whole source document
    pub document: &'a Value,
    /// The whole translation entry for the document
    pub entry: &'a TranslationEntry,
    /// The compendium the document belongs to, when known
    pub compendium: Option<&'a TranslatedCompendium>,
    /// All loaded compendiums and converters
    pub catalog: &'a Catalog,
}

/// Translates one mapped value
pub trait Converter: Send + Sync {
    /// Returns the translated value, or `None` when there is nothing to write back.
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value>;
}

/// Adapts a closure into a [`Converter`]
pub struct FnConverter<F>(F);

impl<F> Converter for FnConverter<F>
where
    F: Fn(&Value, Option<&EntryValue>, &ConverterContext<'_>) -> Option<Value> + Send + Sync,
{
    fn convert(
        &self,
        source: &Value,
        translation: Option<&EntryValue>,
        ctx: &ConverterContext<'_>,
    ) -> Option<Value> {
        (self.0)(source, translation, ctx)
    }
}

/// Name-keyed converter registry
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
}

impl ConverterRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with every built-in converter
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(names::FROM_PACK, FromPack::new(None, DocumentType::Item));
        registry.register(names::NAME, MappedField::new("name"));
        registry.register(names::NAME_COLLECTION, FieldCollection::new("name"));
        registry.register(names::TEXT_COLLECTION, FieldCollection::new("text"));
        registry.register(names::TABLE_RESULTS, TableResults);
        registry.register(names::TABLE_RESULTS_COLLECTION, TableResultsCollection);
        registry.register(names::PAGES, Pages);
        registry.register(names::DECK_CARDS, DeckCards);
        registry.register(names::PLAYLIST_SOUNDS, PlaylistSounds);
        registry.register(names::ADVENTURE_ITEMS, FromDefaultMapping::new(DocumentType::Item));
        registry.register(names::ADVENTURE_ACTORS, FromDefaultMapping::new(DocumentType::Actor));
        registry.register(names::ADVENTURE_CARDS, FromDefaultMapping::new(DocumentType::Cards));
        registry.register(names::ADVENTURE_JOURNALS, FromDefaultMapping::new(DocumentType::JournalEntry));
        registry.register(names::ADVENTURE_PLAYLISTS, FromDefaultMapping::new(DocumentType::Playlist));
        registry.register(names::ADVENTURE_MACROS, FromDefaultMapping::new(DocumentType::Macro));
        registry.register(names::ADVENTURE_SCENES, FromDefaultMapping::new(DocumentType::Scene));
        registry
    }

    /// Registers `converter` under `name`, replacing any previous one
    pub fn register<C: Converter + 'static>(&mut self, name: impl Into<String>, converter: C) {
        self.converters.insert(name.into(), Arc::new(converter));
    }

    /// Registers a closure under `name`
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value, Option<&EntryValue>, &ConverterContext<'_>) -> Option<Value> + Send + Sync + 'static,
    {
        self.register(name, FnConverter(f));
    }

    /// Adds every entry of `other`; names already present are replaced
    pub fn extend(&mut self, other: ConverterRegistry) {
        self.converters.extend(other.converters);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Converter>> {
        self.converters.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.converters.contains_key(name)
    }

    /// Registered names in alphabetical order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names())
            .finish()
    }
}

/// Translation entry nested under `key`, if `translations` is an entry
pub(crate) fn nested_entry<'a>(
    translations: Option<&'a TranslationEntry>,
    key: &str,
) -> Option<&'a TranslationEntry> {
    translations?
        .get(key)
        .filter(|value| value.is_truthy())
        .and_then(EntryValue::as_entry)
}

/// Copies `entry[from]` into `patch[to]` when the entry carries a value there
pub(crate) fn copy_translated(
    patch: &mut serde_json::Map<String, Value>,
    entry: &TranslationEntry,
    from: &str,
    to: &str,
) {
    if let Some(value) = entry.get(from).filter(|value| !matches!(value, EntryValue::Scalar(Value::Null))) {
        crate::utils::set_property_in(patch, to, value.to_value());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contents() {
        let registry = ConverterRegistry::with_defaults();

        assert_eq!(registry.len(), 16);
        for name in [names::FROM_PACK, names::TABLE_RESULTS_COLLECTION, names::ADVENTURE_SCENES] {
            assert!(registry.contains(name), "missing built-in converter {name}");
        }
    }

    #[test]
    fn test_register_overrides_existing_name() {
        let mut registry = ConverterRegistry::with_defaults();
        registry.register_fn(names::NAME, |_, _, _| Some(Value::String("fixed".to_string())));

        assert_eq!(registry.len(), 16, "override must not add a new name");

        let mut extra = ConverterRegistry::new();
        extra.register_fn("upper", |source, _, _| {
            source.as_str().map(|s| Value::String(s.to_uppercase()))
        });
        registry.extend(extra);

        assert!(registry.contains("upper"));
        assert_eq!(registry.names().first(), Some(&"adventureActors"));
    }
}

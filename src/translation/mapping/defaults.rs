//! Built-in mappings per document type.

use crate::translation::converters::names;
use crate::translation::model::{DocumentType, Mapping, MappingTarget};

fn path(field: &str, path: &str) -> (String, MappingTarget) {
    (field.to_string(), MappingTarget::from(path))
}

fn dynamic(field: &str, path: &str, converter: &str) -> (String, MappingTarget) {
    (field.to_string(), MappingTarget::dynamic(converter, path))
}

/// The mapping used for `doc_type` when nothing overrides it
pub fn default_mapping(doc_type: DocumentType) -> Mapping {
    let fields = match doc_type {
        DocumentType::Adventure => vec![
            path("name", "name"),
            path("description", "description"),
            path("caption", "caption"),
            dynamic("folders", "folders", names::NAME_COLLECTION),
            dynamic("journals", "journal", names::ADVENTURE_JOURNALS),
            dynamic("scenes", "scenes", names::ADVENTURE_SCENES),
            dynamic("macros", "macros", names::ADVENTURE_MACROS),
            dynamic("playlists", "playlists", names::ADVENTURE_PLAYLISTS),
            dynamic("tables", "tables", names::TABLE_RESULTS_COLLECTION),
            dynamic("items", "items", names::ADVENTURE_ITEMS),
            dynamic("actors", "actors", names::ADVENTURE_ACTORS),
            dynamic("cards", "cards", names::ADVENTURE_CARDS),
        ],
        DocumentType::Actor => vec![
            path("name", "name"),
            path("description", "system.details.biography.value"),
            dynamic("items", "items", names::FROM_PACK),
            dynamic("tokenName", "prototypeToken.name", names::NAME),
        ],
        DocumentType::Cards => vec![
            path("name", "name"),
            path("description", "description"),
            dynamic("cards", "cards", names::DECK_CARDS),
        ],
        DocumentType::Folder => vec![],
        DocumentType::Item => vec![
            path("name", "name"),
            path("description", "system.description.value"),
        ],
        DocumentType::JournalEntry => vec![
            path("name", "name"),
            path("description", "content"),
            dynamic("pages", "pages", names::PAGES),
        ],
        DocumentType::Macro => vec![path("name", "name"), path("command", "command")],
        DocumentType::Playlist => vec![
            path("name", "name"),
            path("description", "description"),
            dynamic("sounds", "sounds", names::PLAYLIST_SOUNDS),
        ],
        DocumentType::RollTable => vec![
            path("name", "name"),
            path("description", "description"),
            dynamic("results", "results", names::TABLE_RESULTS),
        ],
        DocumentType::Scene => vec![
            path("name", "name"),
            dynamic("drawings", "drawings", names::TEXT_COLLECTION),
            dynamic("notes", "notes", names::TEXT_COLLECTION),
        ],
    };

    fields.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_default_mapping() {
        let mapping = default_mapping(DocumentType::Item);

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["description"].path(), "system.description.value");
        assert_eq!(mapping["name"].converter(), None);
    }

    #[test]
    fn test_every_type_has_a_mapping() {
        for doc_type in DocumentType::ALL {
            let mapping = default_mapping(doc_type);
            match doc_type {
                DocumentType::Folder => assert!(mapping.is_empty()),
                _ => assert!(mapping.contains_key("name"), "{doc_type} should map its name"),
            }
        }
    }

    #[test]
    fn test_adventure_journals_read_journal_path() {
        let mapping = default_mapping(DocumentType::Adventure);
        assert_eq!(mapping["journals"].path(), "journal");
        assert_eq!(mapping["journals"].converter(), Some(names::ADVENTURE_JOURNALS));
    }
}

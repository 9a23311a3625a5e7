//! Field mappings
//!
//! A [`CompendiumMapping`] holds one [`FieldMapping`] per mapped field of a document
//! type and produces translate/extract results for whole documents.

pub mod compendium;
pub mod defaults;
pub mod field;

pub use compendium::CompendiumMapping;
pub use defaults::default_mapping;
pub use field::FieldMapping;

use crate::translation::catalog::Catalog;
use crate::translation::compendium::TranslatedCompendium;

/// What a mapping may consult while translating: every loaded pack, and the pack
/// the document belongs to when there is one.
#[derive(Clone, Copy)]
pub struct MappingScope<'a> {
    pub catalog: &'a Catalog,
    pub compendium: Option<&'a TranslatedCompendium>,
}

impl<'a> MappingScope<'a> {
    pub fn new(catalog: &'a Catalog, compendium: Option<&'a TranslatedCompendium>) -> Self {
        Self { catalog, compendium }
    }
}

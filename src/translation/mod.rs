//! Compendium translation
//!
//! Translation files map original document names to translated fields. The
//! subsystem is split as follows:
//! - **model**: wire types for translation files, mappings, packs and providers
//! - **mapping**: field paths and per-type mappings
//! - **converters**: translators for structured fields (tables, pages, embedded documents)
//! - **compendium** / **catalog**: per-pack translation authority and the loaded snapshot
//! - **pipeline**: file sources, the concurrent loader and the priority merge
//! - **storage**: persistent cache of provider translations
//! - **core**: the [`Babele`] engine and the host seam
//! - **config** / **error**: settings and the error type
//!
//! # Basic usage
//!
//! ```rust,no_run
//! use babele::translation::{Babele, BabeleConfig, MemoryHost, Provider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut host = MemoryHost::new();
//! host.load_pack_file("packs/items.json".as_ref())?;
//!
//! let mut babele = Babele::new(BabeleConfig::for_lang("de"))?;
//! babele.register(Provider::new("babele-de", "de").with_directory("compendium"));
//!
//! if babele.init(&mut host).await {
//!     let catalog = babele.catalog();
//!     println!("{} packs loaded", catalog.packs().count());
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod catalog;
pub mod compendium;
pub mod config;
pub mod converters;
pub mod core;
pub mod error;
pub mod mapping;
pub mod model;
pub mod pipeline;
pub mod storage;

// ============================================================================
// Public API
// ============================================================================

pub use catalog::Catalog;
pub use compendium::{MarkerPlacement, TranslateOptions, TranslatedCompendium};
pub use config::{constants, BabeleConfig, ConfigManager};
pub use converters::{Converter, ConverterContext, ConverterRegistry};
pub use core::{Babele, CompendiumHost, EmbeddedReport, FolderScope, MemoryHost, PackFile};
pub use error::{BabeleError, BabeleResult, ErrorCategory, ErrorSeverity, ErrorStats};
pub use mapping::{CompendiumMapping, FieldMapping};
pub use model::{
    DocumentType, EntryValue, ExportFormat, Mapping, MappingTarget, PackMetadata, Provider,
    Translation, TranslationEntry,
};
pub use storage::{MemoryStore, RedbStore, StoredProvider, TranslationStore};

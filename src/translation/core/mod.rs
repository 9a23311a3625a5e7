//! Engine core
//!
//! - **engine** (`engine.rs`): the [`Babele`] engine, registries and the load/apply cycle
//! - **host** (`host.rs`): the [`CompendiumHost`] seam and an in-memory host
//!
//! ```text
//! Babele (engine.rs)
//!     ├── TranslationLoader (pipeline/loader.rs)
//!     │       ├── FileSource (pipeline/source.rs)
//!     │       └── TranslationStore (storage/)
//!     ├── Catalog (catalog.rs)
//!     │       └── TranslatedCompendium (compendium.rs)
//!     └── CompendiumHost (host.rs)
//! ```

pub mod engine;
pub mod host;

pub use engine::{Babele, EmbeddedReport, EngineStats};
pub use host::{CompendiumHost, FolderScope, MemoryHost, PackFile};

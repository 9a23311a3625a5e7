//! Loading pipeline
//!
//! Sources produce raw translation files, the loader gathers them per provider and
//! the merge step folds them into one translation per collection.

pub mod archive;
pub mod loader;
pub mod merge;
pub mod source;

pub use loader::{LoadRequest, LoadedTranslations, TranslationLoader};
pub use merge::{merge_by_priority, MergedTranslations, PriorityBuckets};
#[cfg(feature = "http")]
pub use source::HttpSource;
pub use source::{FileSource, LocalSource};

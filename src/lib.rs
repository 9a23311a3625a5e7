//! # Babele
//!
//! Localization overlay for compendium documents. Translation files supplied by
//! any number of providers are merged by priority and applied on top of documents,
//! pack indices and folder names without changing the originals.
//!
//! ## Modules
//!
//! - `translation` - the engine, loader, mappings and converters
//! - `utils` - JSON path, merge, collation and ordered serialization helpers
//! - `env` - typed environment variables

pub mod env;
pub mod translation;
pub mod utils;

pub use translation::{Babele, BabeleConfig, BabeleError, BabeleResult};

//! # Utility module
//!
//! Helpers shared by the mapping, loader and export code:
//!
//! - `object` - dot-path lookup/assignment, deep merge and truthiness on JSON values
//! - `ordered_json` - deterministic serialization used for translation skeletons
//! - `collation` - locale-aware string comparison for index sorting
//!
//! The deep-merge rules live here because mapping, reference fallback and the
//! provider merge all depend on the same conflict semantics.

pub mod collation;
pub mod object;
pub mod ordered_json;

// Re-export commonly used items for convenience
pub use collation::IndexCollator;
pub use object::{
    collection_from_uuid, deep_merge, deep_merge_missing, expand_path, get_property, is_truthy,
    merged, set_property, set_property_in, source_uuid,
};
pub use ordered_json::{is_generated_id, to_ordered_string};

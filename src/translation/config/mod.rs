//! Configuration
//!
//! File, environment and default layers for the engine settings.

pub mod manager;

pub use manager::{BabeleConfig, ConfigManager};

/// Configuration constants
pub mod constants {
    /// Priority of providers that do not declare one; lower numbers win.
    pub const DEFAULT_PRIORITY: i32 = 100;

    /// Collection suffix of files that only translate folder names.
    pub const FOLDERS_SUFFIX: &str = "_packs-folders";

    /// Written by `extract` in place of values owned by a converter.
    pub const CONVERTER_PLACEHOLDER: &str = "{{converter}}";

    /// Flag namespace holding translation markers.
    pub const FLAG_SCOPE: &str = "babele";

    pub const DEFAULT_LANG: &str = "en";
    pub const DEFAULT_FALLBACK_LOCALE: &str = "en";
    pub const DEFAULT_DATA_DIR: &str = ".";
    pub const DEFAULT_CACHE_PATH: &str = "~/.cache/babele/translations.redb";

    /// Upper bound on reference chain hops.
    pub const MAX_REFERENCE_DEPTH: usize = 8;

    // Searched in order; the first existing file wins.
    pub const CONFIG_PATHS: &[&str] = &["babele.toml", ".babele.toml", "~/.config/babele/config.toml"];

    pub const ENV_FILES: &[&str] = &[".env.local", ".env"];
}


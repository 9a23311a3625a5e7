//! Configuration manager
//!
//! Loads `BabeleConfig` from the first config file found, applies environment
//! overrides, then validates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{helpers::config_error, BabeleError, BabeleResult};
use crate::translation::model::ExportFormat;

/// Engine configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BabeleConfig {
    /// Active language
    pub lang: String,
    /// Collation locale used when `lang` has no rules
    pub fallback_locale: String,

    /// Root that `modules/`, `systems/` and `directory` resolve against
    pub data_dir: String,
    /// Base URL for remote translation files; overrides `data_dir` when set
    pub remote_base_url: Option<String>,
    /// User translation directory
    pub directory: Option<String>,

    pub system_id: String,
    pub world_id: String,
    /// Translation directory shipped by the game system
    pub system_translations_dir: Option<String>,

    pub cache_enabled: bool,
    pub cache_path: String,

    /// Whether the host lets us list directories
    pub can_browse_files: bool,
    /// File list remembered from the last listing, used when browsing is not allowed
    pub translation_files: Vec<String>,

    pub export_format: ExportFormat,
}

impl Default for BabeleConfig {
    fn default() -> Self {
        Self {
            lang: constants::DEFAULT_LANG.to_string(),
            fallback_locale: constants::DEFAULT_FALLBACK_LOCALE.to_string(),
            data_dir: constants::DEFAULT_DATA_DIR.to_string(),
            remote_base_url: None,
            directory: None,
            system_id: String::new(),
            world_id: String::new(),
            system_translations_dir: None,
            cache_enabled: true,
            cache_path: constants::DEFAULT_CACHE_PATH.to_string(),
            can_browse_files: true,
            translation_files: Vec::new(),
            export_format: ExportFormat::Object,
        }
    }
}

impl BabeleConfig {
    /// Default configuration for one language
    pub fn for_lang(lang: &str) -> Self {
        Self {
            lang: lang.to_string(),
            ..Self::default()
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> BabeleResult<()> {
        if self.lang.trim().is_empty() {
            return Err(config_error("lang cannot be empty"));
        }

        if self.cache_enabled && self.cache_path.trim().is_empty() {
            return Err(config_error("cache_path is required when the cache is enabled"));
        }

        if self.data_dir.trim().is_empty() {
            return Err(config_error("data_dir cannot be empty"));
        }

        Ok(())
    }

    /// Applies environment overrides
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{babele, cache, EnvVar};

        match babele::Lang::get_set() {
            Some(Ok(lang)) => self.lang = lang,
            Some(Err(e)) => tracing::warn!("ignoring override: {}", e),
            None => {}
        }

        match babele::FallbackLocale::get_set() {
            Some(Ok(locale)) => self.fallback_locale = locale,
            Some(Err(e)) => tracing::warn!("ignoring override: {}", e),
            None => {}
        }

        if let Some(Ok(directory)) = babele::Directory::get_set() {
            tracing::info!("translation directory overridden from environment: {}", directory);
            self.directory = Some(directory);
        }

        if let Some(Ok(data_dir)) = babele::DataDir::get_set() {
            self.data_dir = data_dir;
        }

        match cache::Enabled::get_set() {
            Some(Ok(enabled)) => self.cache_enabled = enabled,
            Some(Err(e)) => tracing::warn!("ignoring override: {}", e),
            None => {}
        }

        if let Some(Ok(path)) = cache::Path::get_set() {
            self.cache_path = path;
        }
    }

    /// Cache location with `~` expanded
    pub fn resolved_cache_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.cache_path).as_ref())
    }

    /// Data root with `~` expanded
    pub fn resolved_data_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).as_ref())
    }
}

/// Configuration manager
pub struct ConfigManager {
    config: BabeleConfig,
}

impl ConfigManager {
    /// Loads from `path`, or from the default search paths when `None`
    pub fn load(path: Option<&Path>) -> BabeleResult<Self> {
        Self::load_dotenv();

        let source = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = match &source {
            Some(path) => {
                tracing::info!("loading configuration from {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                tracing::info!("no configuration file found, using defaults");
                BabeleConfig::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    pub fn into_config(self) -> BabeleConfig {
        self.config
    }

    fn find_config_file() -> Option<PathBuf> {
        constants::CONFIG_PATHS
            .iter()
            .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()))
            .find(|path| path.exists())
    }

    fn load_from_file(path: &Path) -> BabeleResult<BabeleConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BabeleError::Config(format!("cannot read {}: {}", path.display(), e)))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| BabeleError::Config(format!("invalid JSON config: {}", e)))
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    fn load_dotenv() {
        for env_file in constants::ENV_FILES {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("loaded environment file {}", env_file);
                break;
            }
        }
    }

    /// Writes a config file holding the defaults
    pub fn generate_example_config(path: &Path) -> BabeleResult<()> {
        let content = toml::to_string_pretty(&BabeleConfig::default())?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

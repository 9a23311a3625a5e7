//! Translation loader
//!
//! Gathers translation files from every provider concurrently: the user directory,
//! the system translation directory, and each registered provider (from the cache
//! when its entry is valid, else from its directories or archive). A failing file
//! or provider never aborts the others.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use indexmap::IndexMap;
use serde_json::Value;

use super::archive::extract_json_files;
use super::merge::{merge_by_priority, PriorityBuckets};
use super::source::FileSource;
use crate::translation::config::constants;
use crate::translation::error::{helpers, BabeleError, BabeleResult, ErrorStats};
use crate::translation::model::{DocumentType, PackMetadata, Provider, Translation};
use crate::translation::storage::TranslationStore;

/// Result of a successful load
#[derive(Debug, Default)]
pub struct LoadedTranslations {
    /// Merged translations by collection
    pub translations: IndexMap<String, Translation>,
    /// Sidebar folder names
    pub system_folders: IndexMap<String, String>,
    /// Every file listed during the load, for hosts that remember the list
    pub files: Vec<String>,
    pub errors: ErrorStats,
}

/// Loader settings for one load
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    pub lang: String,
    pub system_id: String,
    pub world_id: String,
    /// User translation directory
    pub directory: Option<String>,
    /// Translation directory shipped by the system, relative to `systems/<id>/`
    pub system_translations_dir: Option<String>,
    /// Registered providers; only active ones for `lang` are loaded
    pub providers: Vec<Provider>,
    /// Remembered file list, used when the source cannot browse
    pub cached_files: Vec<String>,
}

#[derive(Debug, Clone)]
enum JobTarget {
    Directory(String),
    Archive(String),
}

#[derive(Debug, Clone)]
struct LoadJob {
    provider: Option<Provider>,
    priority: i32,
    target: JobTarget,
}

#[derive(Debug, Default)]
struct JobOutcome {
    provider: Option<Provider>,
    priority: i32,
    translations: Vec<Value>,
    files: Vec<String>,
    errors: ErrorStats,
}

pub struct TranslationLoader {
    source: Arc<dyn FileSource>,
    store: Option<Arc<dyn TranslationStore>>,
    /// Supported document type by collection, for every pack the host exposes
    packs: HashMap<String, DocumentType>,
}

impl TranslationLoader {
    pub fn new(source: Arc<dyn FileSource>, packs: &[PackMetadata]) -> Self {
        let packs = packs
            .iter()
            .filter_map(|metadata| Some((metadata.collection(), metadata.doc_type()?)))
            .collect();
        Self {
            source,
            store: None,
            packs,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn TranslationStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Loads and merges every translation for `request.lang`.
    ///
    /// Returns `None` when no provider yielded a single translation file.
    pub async fn load(&self, request: &LoadRequest) -> Option<LoadedTranslations> {
        let start = Instant::now();
        let mut buckets = PriorityBuckets::new();
        let mut errors = ErrorStats::default();
        let mut jobs = Vec::new();

        if let Some(directory) = request.directory.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            let directory = self.user_directory(directory, &request.lang, &request.cached_files).await;
            jobs.push(LoadJob {
                provider: None,
                priority: constants::DEFAULT_PRIORITY,
                target: JobTarget::Directory(directory),
            });
        }

        if let Some(dir) = request.system_translations_dir.as_deref() {
            jobs.push(LoadJob {
                provider: None,
                priority: constants::DEFAULT_PRIORITY,
                target: JobTarget::Directory(format!("systems/{}/{}/{}", request.system_id, dir, request.lang)),
            });
        }

        for provider in request.providers.iter().filter(|p| p.active && p.lang == request.lang) {
            if let Some(cached) = self.cached(&request.system_id, &provider.id) {
                tracing::info!(provider = %provider.id, files = cached.len(), "using cached translations");
                buckets.entry(provider.priority).or_default().extend(cached);
                continue;
            }

            for dir in &provider.directories {
                jobs.push(LoadJob {
                    provider: Some(provider.clone()),
                    priority: provider.priority,
                    target: JobTarget::Directory(format!("modules/{}/{}", provider.id, dir.trim_matches('/'))),
                });
            }
            if let Some(zip_file) = &provider.zip_file {
                jobs.push(LoadJob {
                    provider: Some(provider.clone()),
                    priority: provider.priority,
                    target: JobTarget::Archive(format!("modules/{}/{}", provider.id, zip_file.trim_matches('/'))),
                });
            }
        }

        let outcomes = join_all(jobs.into_iter().map(|job| self.run_job(job, &request.cached_files))).await;

        let mut files = Vec::new();
        let mut fresh: IndexMap<String, (Provider, Vec<Value>)> = IndexMap::new();
        for outcome in outcomes {
            files.extend(outcome.files);
            errors.absorb(outcome.errors);
            if let Some(provider) = outcome.provider {
                fresh
                    .entry(provider.id.clone())
                    .or_insert_with(|| (provider, Vec::new()))
                    .1
                    .extend(outcome.translations.iter().cloned());
            }
            buckets.entry(outcome.priority).or_default().extend(outcome.translations);
        }

        for (provider, translations) in fresh.into_values() {
            self.save(request, &provider, translations);
        }

        let total: usize = buckets.values().map(Vec::len).sum();
        if total == 0 {
            tracing::info!(lang = %request.lang, "no translations found");
            return None;
        }

        let merged = merge_by_priority(buckets);
        errors.absorb(merged.errors);

        tracing::info!(
            lang = %request.lang,
            files = total,
            collections = merged.translations.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "translations loaded"
        );

        Some(LoadedTranslations {
            translations: merged.translations,
            system_folders: merged.system_folders,
            files,
            errors,
        })
    }

    /// `<directory>/<lang>` when it holds files, else `<directory>`
    async fn user_directory(&self, directory: &str, lang: &str, cached_files: &[String]) -> String {
        let localized = format!("{}/{}", directory.trim_end_matches('/'), lang);
        let has_files = if self.source.can_browse() {
            self.source.list(&localized).await.is_ok_and(|files| !files.is_empty())
        } else {
            let prefix = format!("{}/", localized);
            cached_files.iter().any(|f| f.starts_with(&prefix))
        };

        if has_files {
            localized
        } else {
            directory.trim_end_matches('/').to_string()
        }
    }

    fn cached(&self, system_id: &str, provider_id: &str) -> Option<Vec<Value>> {
        let store = self.store.as_ref()?;
        match store.load(system_id, provider_id) {
            Ok(entry) => entry.map(|entry| entry.translations),
            Err(e) => {
                tracing::warn!(provider = provider_id, "cache read failed, loading from source: {}", e);
                None
            }
        }
    }

    fn save(&self, request: &LoadRequest, provider: &Provider, translations: Vec<Value>) {
        let Some(store) = &self.store else {
            return;
        };
        let Some(version) = provider.version.as_deref() else {
            tracing::debug!(provider = %provider.id, "provider has no version, not caching");
            return;
        };
        if translations.is_empty() {
            return;
        }

        if let Err(e) = store.save(&request.system_id, &request.world_id, &provider.id, version, translations) {
            tracing::warn!(provider = %provider.id, "cache write failed: {}", e);
        }
    }

    async fn run_job(&self, job: LoadJob, cached_files: &[String]) -> JobOutcome {
        let mut outcome = JobOutcome {
            provider: job.provider,
            priority: job.priority,
            ..JobOutcome::default()
        };

        match job.target {
            JobTarget::Directory(directory) => {
                tracing::info!(%directory, priority = job.priority, "fetching translation files");
                match self.list_directory(&directory, cached_files).await {
                    Ok(files) => {
                        let results = join_all(files.iter().map(|file| self.load_file(file))).await;
                        for result in results {
                            match result {
                                Ok(Some(translation)) => outcome.translations.push(translation),
                                Ok(None) => {}
                                Err(e) => {
                                    helpers::log_error(&e);
                                    outcome.errors.record_error(&e);
                                }
                            }
                        }
                        outcome.files = files;
                    }
                    Err(e) => {
                        helpers::log_error(&e);
                        outcome.errors.record_error(&e);
                    }
                }
            }
            JobTarget::Archive(path) => {
                tracing::info!(%path, priority = job.priority, "fetching translation archive");
                match self.load_archive(&path).await {
                    Ok(translations) => {
                        outcome.translations = translations;
                        outcome.files.push(path);
                    }
                    Err(e) => {
                        helpers::log_error(&e);
                        outcome.errors.record_error(&e);
                    }
                }
            }
        }

        outcome
    }

    async fn list_directory(&self, directory: &str, cached_files: &[String]) -> BabeleResult<Vec<String>> {
        if self.source.can_browse() {
            return self.source.list(directory).await;
        }
        let prefix = format!("{}/", directory.trim_end_matches('/'));
        Ok(cached_files
            .iter()
            .filter(|file| file.starts_with(&prefix))
            .cloned()
            .collect())
    }

    /// Collection name for a file, if the file should be loaded at all
    fn accepted_collection(&self, path: &str) -> Option<String> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let collection = Path::new(file_name).file_stem()?.to_str()?;
        let is_json = Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if !is_json {
            return None;
        }
        if collection.ends_with(constants::FOLDERS_SUFFIX) || self.packs.contains_key(collection) {
            Some(collection.to_string())
        } else {
            tracing::debug!(collection, "skipping translation for unknown or unsupported pack");
            None
        }
    }

    async fn load_file(&self, path: &str) -> BabeleResult<Option<Value>> {
        let Some(collection) = self.accepted_collection(path) else {
            return Ok(None);
        };
        let bytes = self.source.fetch(path).await?;
        parse_translation(&collection, &bytes).map(Some)
    }

    async fn load_archive(&self, path: &str) -> BabeleResult<Vec<Value>> {
        let bytes = self.source.fetch(path).await?;
        let mut translations = Vec::new();
        for (name, contents) in extract_json_files(&bytes).map_err(|e| e.with_context(path))? {
            let Some(collection) = self.accepted_collection(&name) else {
                continue;
            };
            match parse_translation(&collection, &contents) {
                Ok(translation) => translations.push(translation),
                Err(e) => helpers::log_error(&e.with_context(path)),
            }
        }
        Ok(translations)
    }
}

/// Parses one translation file and defaults its `collection`
fn parse_translation(collection: &str, bytes: &[u8]) -> BabeleResult<Value> {
    let mut value: Value = serde_json::from_slice(bytes)
        .map_err(|e| BabeleError::Parse(format!("error parsing file for {}: {}", collection, e)))?;

    let Some(object) = value.as_object_mut() else {
        return Err(BabeleError::Parse(format!(
            "translation for {} is not a JSON object",
            collection
        )));
    };

    let has_collection = object
        .get("collection")
        .and_then(Value::as_str)
        .is_some_and(|c| !c.is_empty());
    if !has_collection {
        object.insert("collection".to_string(), Value::String(collection.to_string()));
    }

    tracing::debug!(collection, "loaded translation");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::pipeline::source::LocalSource;
    use crate::translation::storage::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str, value: Value) {
        let path = root.join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, serde_json::to_vec(&value).unwrap()).unwrap();
    }

    fn packs() -> Vec<PackMetadata> {
        vec![PackMetadata::new("dnd5e", "items", DocumentType::Item)]
    }

    #[tokio::test]
    async fn test_provider_files_are_loaded_and_cached() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "modules/babele-it/compendium/dnd5e.items.json",
            json!({"entries": {"Longsword": {"name": "Spada lunga"}}}),
        );
        write(dir.path(), "modules/babele-it/compendium/unknown.pack.json", json!({}));
        fs::write(dir.path().join("modules/babele-it/compendium/broken.json"), "{").unwrap();

        let store = Arc::new(MemoryStore::new());
        let loader = TranslationLoader::new(Arc::new(LocalSource::new(dir.path())), &packs())
            .with_store(store.clone());
        let request = LoadRequest {
            lang: "it".to_string(),
            system_id: "dnd5e".to_string(),
            world_id: "w1".to_string(),
            providers: vec![Provider::new("babele-it", "it")
                .with_directory("compendium")
                .with_version("1.0.0")],
            ..LoadRequest::default()
        };

        let loaded = loader.load(&request).await.unwrap();

        assert_eq!(loaded.translations.len(), 1);
        assert_eq!(loaded.translations["dnd5e.items"].collection, "dnd5e.items");
        assert_eq!(loaded.files.len(), 3);

        let cached = store.load("dnd5e", "babele-it").unwrap().unwrap();
        assert_eq!(cached.translations.len(), 1);
    }

    #[tokio::test]
    async fn test_nothing_found_is_none() {
        let dir = TempDir::new().unwrap();
        let loader = TranslationLoader::new(Arc::new(LocalSource::new(dir.path())), &packs());
        let request = LoadRequest {
            lang: "de".to_string(),
            providers: vec![Provider::new("babele-it", "it").with_directory("compendium")],
            ..LoadRequest::default()
        };

        assert!(loader.load(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_user_directory_prefers_language_subdirectory() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "translations/de/dnd5e.items.json", json!({"label": "Gegenstände"}));
        write(dir.path(), "translations/dnd5e.items.json", json!({"label": "Items"}));

        let loader = TranslationLoader::new(Arc::new(LocalSource::new(dir.path())), &packs());
        let request = LoadRequest {
            lang: "de".to_string(),
            directory: Some("translations".to_string()),
            ..LoadRequest::default()
        };

        let loaded = loader.load(&request).await.unwrap();
        assert_eq!(loaded.translations["dnd5e.items"].label.as_deref(), Some("Gegenstände"));
    }

    #[tokio::test]
    async fn test_cached_file_list_used_without_browsing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "modules/babele-de/packs/dnd5e.items.json", json!({"label": "Gegenstände"}));

        let source = LocalSource::new(dir.path()).without_browsing();
        let loader = TranslationLoader::new(Arc::new(source), &packs());
        let request = LoadRequest {
            lang: "de".to_string(),
            providers: vec![Provider::new("babele-de", "de").with_directory("packs")],
            cached_files: vec![
                "modules/babele-de/packs/dnd5e.items.json".to_string(),
                "modules/other/packs/dnd5e.items.json".to_string(),
            ],
            ..LoadRequest::default()
        };

        let loaded = loader.load(&request).await.unwrap();
        assert_eq!(loaded.files, vec!["modules/babele-de/packs/dnd5e.items.json".to_string()]);
        assert!(loaded.translations.contains_key("dnd5e.items"));
    }

    #[test]
    fn test_parse_translation_defaults_collection() {
        let value = parse_translation("dnd5e.items", br#"{"label": "Oggetti"}"#).unwrap();
        assert_eq!(value["collection"], json!("dnd5e.items"));

        let value = parse_translation("dnd5e.items", br#"{"collection": "dnd5e.gear"}"#).unwrap();
        assert_eq!(value["collection"], json!("dnd5e.gear"));

        assert!(parse_translation("dnd5e.items", b"[1, 2]").is_err());
    }
}

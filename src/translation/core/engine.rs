//! Babele engine
//!
//! Owns the converter and provider registries and the current [`Catalog`]. `init`
//! loads every provider for the active language, builds a new catalog, rewrites
//! the host's pack indices and folder names, and then swaps the catalog in. Readers
//! holding the previous `Arc<Catalog>` keep a consistent snapshot.
//!
//! ## Workflow
//! 1. Register providers and extra converters
//! 2. `init` against a [`CompendiumHost`]
//! 3. Translate documents on demand with `translate`, `translate_document` or
//!    `translate_embedded`

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::host::{CompendiumHost, FolderScope};
use crate::translation::catalog::Catalog;
use crate::translation::compendium::{TranslateOptions, TranslatedCompendium};
use crate::translation::config::BabeleConfig;
use crate::translation::converters::{Converter, ConverterRegistry};
use crate::translation::error::{BabeleError, BabeleResult};
use crate::translation::model::{
    merge_mappings, DocumentType, ExportFormat, Mapping, Provider, Translation,
};
#[cfg(feature = "http")]
use crate::translation::pipeline::HttpSource;
use crate::translation::pipeline::{FileSource, LoadRequest, LocalSource, TranslationLoader};
use crate::translation::storage::{ProviderStatus, RedbStore, TranslationStore};
use crate::utils::{get_property, source_uuid, to_ordered_string, IndexCollator};

/// Engine counters
#[derive(Debug, Default)]
pub struct EngineStats {
    loads: AtomicUsize,
    documents_translated: AtomicUsize,
    indices_translated: AtomicUsize,
}

impl EngineStats {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    pub fn documents_translated(&self) -> usize {
        self.documents_translated.load(Ordering::Relaxed)
    }

    pub fn indices_translated(&self) -> usize {
        self.indices_translated.load(Ordering::Relaxed)
    }
}

/// Outcome of translating embedded documents on demand
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedReport {
    /// Every document, translated where possible, in input order
    pub updates: Vec<Value>,
    /// Names of the documents that were translated
    pub translated: Vec<String>,
    /// Names of the documents no pack translates
    pub untranslated: Vec<String>,
}

pub struct Babele {
    config: BabeleConfig,
    source: Arc<dyn FileSource>,
    store: Option<Arc<dyn TranslationStore>>,
    converters: ConverterRegistry,
    providers: IndexMap<String, Provider>,
    system_translations_dir: Option<String>,
    catalog: Arc<Catalog>,
    system_folders: IndexMap<String, String>,
    translation_files: Vec<String>,
    initialized: bool,
    stats: EngineStats,
}

impl Babele {
    /// Engine reading from the configured data directory or remote base URL.
    ///
    /// When the cache is enabled but cannot be opened the engine runs without it.
    pub fn new(config: BabeleConfig) -> BabeleResult<Self> {
        config.validate()?;
        let source = Self::source_for(&config)?;

        let store: Option<Arc<dyn TranslationStore>> = if config.cache_enabled {
            match RedbStore::open(&config.resolved_cache_path()) {
                Ok(store) => Some(Arc::new(store)),
                Err(e) => {
                    tracing::warn!("translation cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            system_translations_dir: config.system_translations_dir.clone(),
            translation_files: config.translation_files.clone(),
            config,
            source,
            store,
            converters: ConverterRegistry::with_defaults(),
            providers: IndexMap::new(),
            catalog: Arc::new(Catalog::default()),
            system_folders: IndexMap::new(),
            initialized: false,
            stats: EngineStats::default(),
        })
    }

    fn source_for(config: &BabeleConfig) -> BabeleResult<Arc<dyn FileSource>> {
        if let Some(base) = config.remote_base_url.as_deref() {
            return remote_source(base);
        }

        let source = LocalSource::new(config.resolved_data_dir());
        Ok(if config.can_browse_files {
            Arc::new(source)
        } else {
            Arc::new(source.without_browsing())
        })
    }

    pub fn with_source(mut self, source: Arc<dyn FileSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TranslationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn without_store(mut self) -> Self {
        self.store = None;
        self
    }

    pub fn config(&self) -> &BabeleConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Registers a translation provider.
    ///
    /// Registering the same id again adds its directories to the first
    /// registration; everything else keeps the first registration's values.
    pub fn register(&mut self, mut provider: Provider) {
        provider.directories = provider
            .directories
            .iter()
            .map(|dir| dir.trim().trim_matches('/').to_string())
            .filter(|dir| !dir.is_empty())
            .collect();

        match self.providers.get_mut(&provider.id) {
            Some(existing) => {
                for dir in provider.directories {
                    if !existing.directories.contains(&dir) {
                        existing.directories.push(dir);
                    }
                }
                for (document_type, mapping) in provider.custom_mappings {
                    let merged = match existing.custom_mappings.get(&document_type) {
                        Some(current) => merge_mappings(current, &mapping),
                        None => mapping,
                    };
                    existing.custom_mappings.insert(document_type, merged);
                }
                tracing::debug!(provider = %existing.id, directories = ?existing.directories, "provider registration merged");
            }
            None => {
                tracing::info!(provider = %provider.id, lang = %provider.lang, priority = provider.priority, "provider registered");
                self.providers.insert(provider.id.clone(), provider);
            }
        }
    }

    pub fn providers(&self) -> impl Iterator<Item = &Provider> {
        self.providers.values()
    }

    pub fn register_converter<C: Converter + 'static>(&mut self, name: impl Into<String>, converter: C) {
        self.converters.register(name, converter);
    }

    /// Adds converters; names already registered are replaced
    pub fn register_converters(&mut self, converters: ConverterRegistry) {
        self.converters.extend(converters);
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    pub fn set_system_translations_dir(&mut self, dir: impl Into<String>) {
        self.system_translations_dir = Some(dir.into());
    }

    /// Custom mappings of every registered provider, later registrations on top
    fn custom_mappings(&self) -> HashMap<DocumentType, Mapping> {
        let mut mappings: HashMap<DocumentType, Mapping> = HashMap::new();
        for provider in self.providers.values() {
            for (document_type, mapping) in &provider.custom_mappings {
                let merged = match mappings.get(document_type) {
                    Some(current) => merge_mappings(current, mapping),
                    None => mapping.clone(),
                };
                mappings.insert(*document_type, merged);
            }
        }
        mappings
    }

    // ========================================================================
    // Initialization
    // ========================================================================

    /// Loads translations and applies them to the host.
    ///
    /// Returns `false` when no translation exists for the active language; the
    /// host is left untouched in that case. Calling it again after a successful
    /// run does nothing.
    pub async fn init(&mut self, host: &mut dyn CompendiumHost) -> bool {
        if self.initialized {
            return true;
        }

        let start = Instant::now();
        let packs = host.packs();

        self.verify_cache();

        let mut loader = TranslationLoader::new(self.source.clone(), &packs);
        if let Some(store) = &self.store {
            loader = loader.with_store(store.clone());
        }

        let request = LoadRequest {
            lang: self.config.lang.clone(),
            system_id: self.config.system_id.clone(),
            world_id: self.config.world_id.clone(),
            directory: self.config.directory.clone(),
            system_translations_dir: self.system_translations_dir.clone(),
            providers: self.providers.values().cloned().collect(),
            cached_files: self.translation_files.clone(),
        };

        let Some(loaded) = loader.load(&request).await else {
            tracing::info!(lang = %self.config.lang, "no translation available for the active language");
            return false;
        };
        self.stats.loads.fetch_add(1, Ordering::Relaxed);

        if !loaded.errors.is_empty() {
            tracing::warn!(
                errors = loaded.errors.total_errors,
                "some translation files could not be loaded"
            );
        }
        if self.source.can_browse() {
            self.translation_files = loaded.files;
        }

        let catalog = Catalog::build(
            self.converters.clone(),
            loaded.translations,
            self.custom_mappings(),
            &packs,
        );

        let collator = IndexCollator::for_language(&self.config.lang, &self.config.fallback_locale);
        for pack in catalog.packs() {
            self.apply_to_pack(host, &catalog, pack, &collator);
        }
        for name in host.folder_names(&FolderScope::Sidebar) {
            if let Some(translated) = loaded.system_folders.get(&name).filter(|t| !t.is_empty()) {
                rename(host, &FolderScope::Sidebar, &name, translated);
            }
        }

        self.system_folders = loaded.system_folders;
        self.catalog = Arc::new(catalog);
        self.initialized = true;

        tracing::info!(
            lang = %self.config.lang,
            packs = self.catalog.packs().count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "compendium indices translated"
        );
        true
    }

    /// Rebuilds everything from the providers.
    ///
    /// The current catalog stays in place when the reload finds nothing.
    pub async fn reload(&mut self, host: &mut dyn CompendiumHost) -> bool {
        let was_initialized = self.initialized;
        self.initialized = false;
        let loaded = self.init(host).await;
        if !loaded {
            // The previous catalog stays in service
            self.initialized = was_initialized;
        }
        loaded
    }

    fn verify_cache(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let installed: Vec<ProviderStatus> = self
            .providers
            .values()
            .map(|provider| ProviderStatus {
                id: provider.id.clone(),
                version: provider.version.clone(),
                active: provider.active,
            })
            .collect();

        match store.verify(&self.config.system_id, &self.config.world_id, &installed) {
            Ok(report) if report.deleted > 0 || report.updated > 0 => {
                tracing::info!(deleted = report.deleted, updated = report.updated, "translation cache verified");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("translation cache verification failed: {}", e),
        }
    }

    fn apply_to_pack(
        &self,
        host: &mut dyn CompendiumHost,
        catalog: &Catalog,
        pack: &TranslatedCompendium,
        collator: &IndexCollator,
    ) {
        let collection = pack.collection();
        match host.index(collection) {
            Ok(index) => {
                let translated = catalog.translate_index(collection, &index, collator);
                match host.replace_index(collection, translated) {
                    Ok(()) => {
                        self.stats.indices_translated.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => tracing::warn!(%collection, "could not replace index: {}", e),
                }
            }
            Err(e) => tracing::warn!(%collection, "could not read index: {}", e),
        }

        let scope = FolderScope::Pack(collection.to_string());
        for name in host.folder_names(&scope) {
            if let Some(translated) = pack.folder_name(&name) {
                rename(host, &scope, &name, translated);
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current snapshot
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn translations(&self) -> &IndexMap<String, Translation> {
        self.catalog.translations()
    }

    pub fn packs(&self) -> impl Iterator<Item = &TranslatedCompendium> {
        self.catalog.packs()
    }

    pub fn system_folders(&self) -> &IndexMap<String, String> {
        &self.system_folders
    }

    /// Files listed by the last load, for hosts that cannot browse
    pub fn translation_files(&self) -> &[String] {
        &self.translation_files
    }

    // ========================================================================
    // Translation
    // ========================================================================

    pub fn translate(&self, collection: &str, document: &Value) -> Value {
        self.stats.documents_translated.fetch_add(1, Ordering::Relaxed);
        self.catalog.translate(collection, document)
    }

    pub fn translate_field(&self, field: &str, collection: &str, document: &Value) -> Option<Value> {
        self.catalog.translate_field(field, collection, document)
    }

    pub fn extract(&self, collection: &str, document: &Value) -> Map<String, Value> {
        self.catalog.extract(collection, document)
    }

    pub fn extract_field(&self, collection: &str, field: &str, document: &Value) -> Option<Value> {
        self.catalog.extract_field(collection, field, document)
    }

    /// Translates index entries and sorts them by translated name in the active
    /// language's collation order
    pub fn translate_index(&self, collection: &str, entries: &[Value]) -> Vec<Value> {
        let collator = IndexCollator::for_language(&self.config.lang, &self.config.fallback_locale);
        self.catalog.translate_index(collection, entries, &collator)
    }

    /// Translates a document the host is materializing from `collection`.
    ///
    /// A document without any source identity is given the host's uuid for it
    /// first, so lookups can tell which pack it belongs to.
    pub fn translate_document(&self, host: &dyn CompendiumHost, collection: &str, document: &Value) -> Value {
        if source_uuid(document).is_some() {
            return self.translate(collection, document);
        }

        let mut document = document.clone();
        if let (Some(uuid), Some(object)) = (host.document_uuid(collection, &document), document.as_object_mut()) {
            object.insert("uuid".to_string(), Value::String(uuid));
        }
        self.translate(collection, &document)
    }

    /// Translates embedded items against every translated item pack.
    pub fn translate_embedded(&self, documents: &[Value]) -> EmbeddedReport {
        let mut report = EmbeddedReport::default();

        for document in documents {
            let name = document
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            let translated = self
                .catalog
                .find_pack_for(document, DocumentType::Item)
                .and_then(|pack| pack.translate(document, TranslateOptions::document(), &self.catalog));

            match translated {
                Some(translated) => {
                    report.translated.push(name);
                    report.updates.push(translated);
                }
                None => {
                    report.untranslated.push(name);
                    report.updates.push(document.clone());
                }
            }
        }

        tracing::info!(
            translated = report.translated.len(),
            untranslated = report.untranslated.len(),
            "embedded documents translated"
        );
        report
    }

    // ========================================================================
    // Export and cache
    // ========================================================================

    /// Translation skeleton for every document of `collection`, serialized with a
    /// stable key order
    pub fn export_translations_file(
        &self,
        host: &dyn CompendiumHost,
        collection: &str,
        format: ExportFormat,
    ) -> BabeleResult<String> {
        let transient;
        let catalog = if self.catalog.pack(collection).is_some() {
            self.catalog.as_ref()
        } else {
            transient = Catalog::build(
                self.converters.clone(),
                IndexMap::new(),
                self.custom_mappings(),
                &host.packs(),
            );
            &transient
        };

        let pack = catalog
            .pack(collection)
            .ok_or_else(|| BabeleError::UnknownPack(collection.to_string()))?;

        let mut entries_object = Map::new();
        let mut entries_list = Vec::new();
        for document in host.documents(collection)? {
            let name = get_property(&document, "flags.babele.originalName")
                .or_else(|| document.get("name"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let extracted = pack.extract(&document);

            match format {
                ExportFormat::Object => {
                    entries_object.insert(name, Value::Object(extracted));
                }
                ExportFormat::Legacy => {
                    let mut item = Map::new();
                    item.insert("id".to_string(), Value::String(name));
                    item.extend(extracted);
                    entries_list.push(Value::Object(item));
                }
            }
        }

        let entries = match format {
            ExportFormat::Object => Value::Object(entries_object),
            ExportFormat::Legacy => Value::Array(entries_list),
        };

        let mut file = Map::new();
        file.insert("collection".to_string(), Value::String(collection.to_string()));
        file.insert("label".to_string(), Value::String(pack.metadata().label.clone()));
        file.insert("entries".to_string(), entries);
        file.insert("mapping".to_string(), serde_json::to_value(pack.mapping().mapping())?);

        tracing::info!(%collection, ?format, "translation skeleton exported");
        to_ordered_string(&Value::Object(file))
    }

    /// Removes every cached provider; returns how many were removed
    pub fn clear_cache(&self) -> BabeleResult<usize> {
        match &self.store {
            Some(store) => {
                let removed = store.clear()?;
                tracing::info!(removed, "translation cache cleared");
                Ok(removed)
            }
            None => Ok(0),
        }
    }
}

#[cfg(feature = "http")]
fn remote_source(base: &str) -> BabeleResult<Arc<dyn FileSource>> {
    Ok(Arc::new(HttpSource::new(base)?))
}

#[cfg(not(feature = "http"))]
fn remote_source(base: &str) -> BabeleResult<Arc<dyn FileSource>> {
    Err(BabeleError::Config(format!(
        "cannot fetch from {}: built without the http feature",
        base
    )))
}

fn rename(host: &mut dyn CompendiumHost, scope: &FolderScope, from: &str, to: &str) {
    if let Err(e) = host.rename_folder(scope, from, to) {
        tracing::warn!(folder = from, "could not rename folder: {}", e);
    }
}

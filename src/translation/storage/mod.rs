//! Persistent translation cache
//!
//! Translations fetched for a provider are kept per game system so that later
//! loads can skip fetching. An entry is only valid for the provider version it was
//! saved with, and remembers the worlds the provider is active in.

pub mod memory;
pub mod redb_store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::BabeleResult;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

/// Cached translations of one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProvider {
    pub provider_id: String,
    pub system_id: String,
    pub version: String,
    /// Worlds the provider is active in
    pub worlds: Vec<String>,
    /// Raw translation files, as parsed from disk
    pub translations: Vec<Value>,
    pub saved_at: DateTime<Utc>,
}

impl StoredProvider {
    pub fn new(system_id: &str, world_id: &str, provider_id: &str, version: &str, translations: Vec<Value>) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            system_id: system_id.to_string(),
            version: version.to_string(),
            worlds: vec![world_id.to_string()],
            translations,
            saved_at: Utc::now(),
        }
    }

    pub(crate) fn key(&self) -> String {
        store_key(&self.system_id, &self.provider_id)
    }
}

pub(crate) fn store_key(system_id: &str, provider_id: &str) -> String {
    format!("{}/{}", system_id, provider_id)
}

/// What the host currently knows about an installed provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderStatus {
    pub id: String,
    pub version: Option<String>,
    pub active: bool,
}

/// Outcome of [`TranslationStore::verify`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub deleted: usize,
    pub updated: usize,
}

/// Storage backend for cached provider translations
pub trait TranslationStore: Send + Sync {
    fn load(&self, system_id: &str, provider_id: &str) -> BabeleResult<Option<StoredProvider>>;

    /// Writes `entry`, replacing any entry for the same system and provider
    fn put(&self, entry: &StoredProvider) -> BabeleResult<()>;

    fn remove(&self, system_id: &str, provider_id: &str) -> BabeleResult<()>;

    /// Every entry saved for `system_id`
    fn entries(&self, system_id: &str) -> BabeleResult<Vec<StoredProvider>>;

    /// Deletes everything; returns the number of entries removed
    fn clear(&self) -> BabeleResult<usize>;

    /// Saves freshly loaded translations of a provider.
    ///
    /// A provider may register several directories, so translations saved for a
    /// provider that already has an entry are appended to it.
    fn save(
        &self,
        system_id: &str,
        world_id: &str,
        provider_id: &str,
        version: &str,
        translations: Vec<Value>,
    ) -> BabeleResult<()> {
        let entry = match self.load(system_id, provider_id)? {
            Some(mut existing) => {
                existing.translations.extend(translations);
                existing.saved_at = Utc::now();
                existing
            }
            None => StoredProvider::new(system_id, world_id, provider_id, version, translations),
        };
        self.put(&entry)?;
        tracing::info!(provider = provider_id, "saved provider translations to the cache");
        Ok(())
    }

    /// Drops stale entries for `system_id` and keeps the world lists current.
    ///
    /// Entries of uninstalled providers and of providers whose version changed are
    /// deleted. A provider inactive in `world_id` loses that world, and the entry
    /// is deleted with its last world. A provider newly active at the cached
    /// version gains the world.
    fn verify(&self, system_id: &str, world_id: &str, installed: &[ProviderStatus]) -> BabeleResult<VerifyReport> {
        let mut report = VerifyReport::default();

        for mut entry in self.entries(system_id)? {
            let Some(status) = installed.iter().find(|s| s.id == entry.provider_id) else {
                tracing::info!(provider = %entry.provider_id, "deleting cache entry for missing provider");
                self.remove(system_id, &entry.provider_id)?;
                report.deleted += 1;
                continue;
            };

            // A missing installed version counts as a change
            if status.version.as_deref() != Some(entry.version.as_str()) {
                tracing::info!(provider = %entry.provider_id, "provider version changed, deleting cache entry");
                self.remove(system_id, &entry.provider_id)?;
                report.deleted += 1;
                continue;
            }

            let in_world = entry.worlds.iter().any(|w| w == world_id);
            if !status.active && in_world {
                if entry.worlds.len() == 1 {
                    tracing::info!(provider = %entry.provider_id, "deleting cache entry for inactive provider");
                    self.remove(system_id, &entry.provider_id)?;
                    report.deleted += 1;
                } else {
                    entry.worlds.retain(|w| w != world_id);
                    self.put(&entry)?;
                    report.updated += 1;
                }
                continue;
            }

            if status.active && !in_world {
                entry.worlds.push(world_id.to_string());
                self.put(&entry)?;
                report.updated += 1;
            }
        }

        if report.deleted > 0 {
            tracing::info!(deleted = report.deleted, "removed stale cache entries");
        }
        Ok(report)
    }
}

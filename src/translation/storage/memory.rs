use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{store_key, StoredProvider, TranslationStore};
use crate::translation::error::{helpers::cache_error, BabeleResult};

/// In-process store, for tests and runs with the cache disabled
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredProvider>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranslationStore for MemoryStore {
    fn load(&self, system_id: &str, provider_id: &str) -> BabeleResult<Option<StoredProvider>> {
        let entries = self.entries.read().map_err(|_| cache_error("memory store lock poisoned"))?;
        Ok(entries.get(&store_key(system_id, provider_id)).cloned())
    }

    fn put(&self, entry: &StoredProvider) -> BabeleResult<()> {
        let mut entries = self.entries.write().map_err(|_| cache_error("memory store lock poisoned"))?;
        entries.insert(entry.key(), entry.clone());
        Ok(())
    }

    fn remove(&self, system_id: &str, provider_id: &str) -> BabeleResult<()> {
        let mut entries = self.entries.write().map_err(|_| cache_error("memory store lock poisoned"))?;
        entries.remove(&store_key(system_id, provider_id));
        Ok(())
    }

    fn entries(&self, system_id: &str) -> BabeleResult<Vec<StoredProvider>> {
        let entries = self.entries.read().map_err(|_| cache_error("memory store lock poisoned"))?;
        let mut found: Vec<StoredProvider> = entries
            .values()
            .filter(|entry| entry.system_id == system_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        Ok(found)
    }

    fn clear(&self) -> BabeleResult<usize> {
        let mut entries = self.entries.write().map_err(|_| cache_error("memory store lock poisoned"))?;
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }
}

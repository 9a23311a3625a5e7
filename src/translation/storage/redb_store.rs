use std::fs;
use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition, TableError};

use super::{store_key, StoredProvider, TranslationStore};
use crate::translation::error::BabeleResult;

const PROVIDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("providers");

/// Store backed by a redb database file.
///
/// One table keyed by `<system>/<provider>`; values are JSON.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl RedbStore {
    /// Opens the database at `path`, creating it and its parent directory if needed
    pub fn open(path: &Path) -> BabeleResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;
        tracing::debug!(path = %path.display(), "opened translation cache");
        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").field("path", &self.path).finish()
    }
}

impl TranslationStore for RedbStore {
    fn load(&self, system_id: &str, provider_id: &str) -> BabeleResult<Option<StoredProvider>> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(PROVIDERS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let Some(bytes) = table.get(store_key(system_id, provider_id).as_str())? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_slice(bytes.value())?))
    }

    fn put(&self, entry: &StoredProvider) -> BabeleResult<()> {
        let bytes = serde_json::to_vec(entry)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PROVIDERS)?;
            table.insert(entry.key().as_str(), bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn remove(&self, system_id: &str, provider_id: &str) -> BabeleResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(PROVIDERS)?;
            table.remove(store_key(system_id, provider_id).as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn entries(&self, system_id: &str) -> BabeleResult<Vec<StoredProvider>> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(PROVIDERS) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let prefix = format!("{}/", system_id);
        let mut entries = Vec::new();
        for item in table.iter()? {
            let (key, value) = item?;
            if key.value().starts_with(&prefix) {
                entries.push(serde_json::from_slice(value.value())?);
            }
        }
        Ok(entries)
    }

    fn clear(&self) -> BabeleResult<usize> {
        let txn = self.db.begin_write()?;
        let removed = {
            let mut table = txn.open_table(PROVIDERS)?;
            let keys: Vec<String> = table
                .iter()?
                .map(|item| item.map(|(key, _)| key.value().to_string()))
                .collect::<Result<_, _>>()?;
            for key in &keys {
                table.remove(key.as_str())?;
            }
            keys.len()
        };
        txn.commit()?;
        tracing::info!(removed, "cleared translation cache");
        Ok(removed)
    }
}

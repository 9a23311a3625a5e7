//! Host collaborators
//!
//! The engine never owns compendium data. It reads pack listings, indices and
//! documents from a [`CompendiumHost`] and writes translated indices and folder names
//! back through it.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::translation::error::{BabeleError, BabeleResult};
use crate::translation::model::PackMetadata;

/// Where a folder lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FolderScope {
    /// Folders inside one pack
    Pack(String),
    /// Compendium sidebar folders
    Sidebar,
}

pub trait CompendiumHost: Send + Sync {
    fn packs(&self) -> Vec<PackMetadata>;

    /// Index entries of a pack (lightweight document projections)
    fn index(&self, collection: &str) -> BabeleResult<Vec<Value>>;

    fn replace_index(&mut self, collection: &str, entries: Vec<Value>) -> BabeleResult<()>;

    fn folder_names(&self, scope: &FolderScope) -> Vec<String>;

    fn rename_folder(&mut self, scope: &FolderScope, from: &str, to: &str) -> BabeleResult<()>;

    /// Full documents of a pack
    fn documents(&self, collection: &str) -> BabeleResult<Vec<Value>>;

    /// Stable identity of a document inside a pack
    fn document_uuid(&self, collection: &str, document: &Value) -> Option<String> {
        let metadata = self.packs().into_iter().find(|p| p.collection() == collection)?;
        let id = document.get("_id").and_then(Value::as_str)?;
        Some(format!("Compendium.{}.{}.{}", collection, metadata.document_type, id))
    }
}

/// On-disk layout of one pack: `{ metadata, documents, folders }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackFile {
    pub metadata: PackMetadata,
    #[serde(default)]
    pub documents: Vec<Value>,
    #[serde(default)]
    pub folders: Vec<String>,
}

#[derive(Debug, Clone)]
struct HostPack {
    metadata: PackMetadata,
    documents: Vec<Value>,
    index: Vec<Value>,
    folders: Vec<String>,
}

/// Fields copied from a document into its index entry
const INDEX_FIELDS: &[&str] = &["_id", "name", "type", "img", "sort", "folder"];

/// In-memory host for tests and the command line
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
    packs: IndexMap<String, HostPack>,
    sidebar_folders: Vec<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pack(&mut self, metadata: PackMetadata, documents: Vec<Value>) -> &mut Self {
        self.add_pack_file(PackFile {
            metadata,
            documents,
            folders: Vec::new(),
        })
    }

    pub fn add_pack_file(&mut self, pack: PackFile) -> &mut Self {
        let collection = pack.metadata.collection();
        let index = pack
            .documents
            .iter()
            .map(|document| index_entry(&collection, &pack.metadata, document))
            .collect();

        self.packs.insert(
            collection,
            HostPack {
                metadata: pack.metadata,
                documents: pack.documents,
                index,
                folders: pack.folders,
            },
        );
        self
    }

    pub fn with_sidebar_folders<I, S>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sidebar_folders = folders.into_iter().map(Into::into).collect();
        self
    }

    /// Loads a pack JSON file and adds it to the host.
    pub fn load_pack_file(&mut self, path: &Path) -> BabeleResult<String> {
        let contents = std::fs::read(path).map_err(|e| BabeleError::from(e).with_context(path.display()))?;
        let pack: PackFile = serde_json::from_slice(&contents)
            .map_err(|e| BabeleError::Parse(format!("invalid pack file {}: {}", path.display(), e)))?;
        let collection = pack.metadata.collection();
        tracing::debug!(%collection, documents = pack.documents.len(), "loaded pack file");
        self.add_pack_file(pack);
        Ok(collection)
    }

    fn pack(&self, collection: &str) -> BabeleResult<&HostPack> {
        self.packs
            .get(collection)
            .ok_or_else(|| BabeleError::UnknownPack(collection.to_string()))
    }
}

fn index_entry(collection: &str, metadata: &PackMetadata, document: &Value) -> Value {
    let mut entry = Map::new();
    for field in INDEX_FIELDS {
        if let Some(value) = document.get(*field) {
            entry.insert(field.to_string(), value.clone());
        }
    }
    if let Some(id) = document.get("_id").and_then(Value::as_str) {
        entry.insert(
            "uuid".to_string(),
            Value::String(format!("Compendium.{}.{}.{}", collection, metadata.document_type, id)),
        );
    }
    Value::Object(entry)
}

impl CompendiumHost for MemoryHost {
    fn packs(&self) -> Vec<PackMetadata> {
        self.packs.values().map(|pack| pack.metadata.clone()).collect()
    }

    fn index(&self, collection: &str) -> BabeleResult<Vec<Value>> {
        Ok(self.pack(collection)?.index.clone())
    }

    fn replace_index(&mut self, collection: &str, entries: Vec<Value>) -> BabeleResult<()> {
        let pack = self
            .packs
            .get_mut(collection)
            .ok_or_else(|| BabeleError::UnknownPack(collection.to_string()))?;
        pack.index = entries;
        Ok(())
    }

    fn folder_names(&self, scope: &FolderScope) -> Vec<String> {
        match scope {
            FolderScope::Sidebar => self.sidebar_folders.clone(),
            FolderScope::Pack(collection) => self
                .packs
                .get(collection)
                .map(|pack| pack.folders.clone())
                .unwrap_or_default(),
        }
    }

    fn rename_folder(&mut self, scope: &FolderScope, from: &str, to: &str) -> BabeleResult<()> {
        let folders = match scope {
            FolderScope::Sidebar => &mut self.sidebar_folders,
            FolderScope::Pack(collection) => {
                &mut self
                    .packs
                    .get_mut(collection)
                    .ok_or_else(|| BabeleError::UnknownPack(collection.clone()))?
                    .folders
            }
        };

        for name in folders.iter_mut().filter(|name| name.as_str() == from) {
            *name = to.to_string();
        }
        Ok(())
    }

    fn documents(&self, collection: &str) -> BabeleResult<Vec<Value>> {
        Ok(self.pack(collection)?.documents.clone())
    }
}

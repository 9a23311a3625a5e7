// Shared helpers for the integration tests
//
// A temporary data tree laid out like a host installation, pack fixtures and
// engine builders.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

use babele::translation::model::{DocumentType, PackMetadata};
use babele::translation::{Babele, BabeleConfig, MemoryHost, PackFile};

/// Temporary data root
pub struct TestEnvironment {
    dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn write_json(&self, relative: &str, value: &Value) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        fs::write(&path, serde_json::to_vec_pretty(value).expect("serialize")).expect("write file");
        path
    }

    pub fn write_bytes(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().expect("parent dir")).expect("create dirs");
        fs::write(&path, bytes).expect("write file");
        path
    }

    pub fn remove(&self, relative: &str) {
        let path = self.path(relative);
        if path.is_dir() {
            fs::remove_dir_all(path).expect("remove dir");
        } else {
            fs::remove_file(path).expect("remove file");
        }
    }

    /// Engine without a cache reading from this data root
    pub fn engine(&self, lang: &str) -> Babele {
        Babele::new(self.config(lang)).expect("engine")
    }

    pub fn config(&self, lang: &str) -> BabeleConfig {
        let mut config = BabeleConfig::for_lang(lang);
        config.cache_enabled = false;
        config.data_dir = self.root().display().to_string();
        config.system_id = "dnd5e".to_string();
        config.world_id = "test-world".to_string();
        config
    }
}

pub fn longsword() -> Value {
    json!({
        "_id": "abc123",
        "name": "Longsword",
        "system": {"description": {"value": "A blade."}}
    })
}

pub fn item(id: &str, name: &str, description: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "system": {"description": {"value": description}}
    })
}

pub fn items_metadata() -> PackMetadata {
    PackMetadata::new("dnd5e", "items", DocumentType::Item)
}

/// Host with a `dnd5e.items` pack
pub fn item_host(documents: Vec<Value>) -> MemoryHost {
    let mut host = MemoryHost::new();
    host.add_pack(items_metadata(), documents);
    host
}

pub fn pack_file(metadata: PackMetadata, documents: Vec<Value>, folders: &[&str]) -> Value {
    serde_json::to_value(PackFile {
        metadata,
        documents,
        folders: folders.iter().map(|f| f.to_string()).collect(),
    })
    .expect("serialize pack")
}

/// Index entries named as given
pub fn index_named(names: &[&str]) -> Vec<Value> {
    names
        .iter()
        .enumerate()
        .map(|(i, name)| json!({"_id": format!("id{}", i), "name": name}))
        .collect()
}

pub fn names(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.get("name").and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

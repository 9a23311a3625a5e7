//! Translation file sources
//!
//! Paths handed to a source are `/`-separated and relative to its root, e.g.
//! `modules/babele-de/compendium/dnd5e.items.json`.

use std::fmt::Debug;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::translation::error::{BabeleError, BabeleResult};

#[async_trait]
pub trait FileSource: Debug + Send + Sync {
    /// Whether directories may be listed
    fn can_browse(&self) -> bool;

    /// Files directly under `directory`, as paths relative to the source root
    async fn list(&self, directory: &str) -> BabeleResult<Vec<String>>;

    async fn fetch(&self, path: &str) -> BabeleResult<Vec<u8>>;
}

fn join(directory: &str, name: &str) -> String {
    let directory = directory.trim_end_matches('/');
    if directory.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Files under a local data directory
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
    browse: bool,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            browse: true,
        }
    }

    /// Source that refuses to list directories, like a host user without file
    /// browsing permission
    pub fn without_browsing(mut self) -> Self {
        self.browse = false;
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }
}

#[async_trait]
impl FileSource for LocalSource {
    fn can_browse(&self) -> bool {
        self.browse
    }

    async fn list(&self, directory: &str) -> BabeleResult<Vec<String>> {
        if !self.browse {
            return Err(BabeleError::PermissionDenied(format!("cannot browse {}", directory)));
        }

        let mut reader = tokio::fs::read_dir(self.resolve(directory))
            .await
            .map_err(|e| BabeleError::from(e).with_context(directory))?;

        let mut files = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(join(directory, &entry.file_name().to_string_lossy()));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn fetch(&self, path: &str) -> BabeleResult<Vec<u8>> {
        tokio::fs::read(self.resolve(path))
            .await
            .map_err(|e| BabeleError::from(e).with_context(path))
    }
}

/// Files served over HTTP relative to a base URL.
///
/// Directories cannot be listed; the loader relies on the remembered file list.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: url::Url,
}

#[cfg(feature = "http")]
impl HttpSource {
    pub fn new(base: &str) -> BabeleResult<Self> {
        let mut base = url::Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base,
        })
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl FileSource for HttpSource {
    fn can_browse(&self) -> bool {
        false
    }

    async fn list(&self, directory: &str) -> BabeleResult<Vec<String>> {
        Err(BabeleError::PermissionDenied(format!(
            "directory listing is not available over HTTP: {}",
            directory
        )))
    }

    async fn fetch(&self, path: &str) -> BabeleResult<Vec<u8>> {
        let url = self.base.join(path.trim_start_matches('/'))?;
        tracing::debug!(%url, "fetching translation file");

        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| BabeleError::from(e).with_context(path))?;
        Ok(response.bytes().await?.to_vec())
    }
}

//! Backing stores for assets handlers.
//!
//! A store answers `Ok(None)` for a resource it does not have, so the router
//! can pass to the next candidate instead of serving an empty body.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A loaded resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub trait ResourceStore: Send + Sync {
    /// Load the resource at `path` (relative to the store, leading `/` optional).
    fn load(&self, path: &str) -> io::Result<Option<Asset>>;
}

/// Content type for a file name, from its extension.
#[must_use]
pub fn content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_lowercase()
        .as_str()
    {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "txt" => "text/plain",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

/// Files under a directory.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_dir: PathBuf,
}

impl StaticFiles {
    pub fn new<P: Into<PathBuf>>(base: P) -> Self {
        Self {
            base_dir: base.into(),
        }
    }

    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Map a URL path below the base directory. `None` for anything that
    /// would leave it (`..`, absolute components).
    fn map_path(&self, url_path: &str) -> Option<PathBuf> {
        let mut pb = self.base_dir.clone();
        for comp in Path::new(url_path.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }
}

impl ResourceStore for StaticFiles {
    fn load(&self, url_path: &str) -> io::Result<Option<Asset>> {
        let Some(path) = self.map_path(url_path) else {
            return Ok(None);
        };
        if !path.is_file() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(Asset {
            bytes,
            content_type: content_type(&path).to_string(),
        }))
    }
}

/// In-memory resources keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    entries: HashMap<String, Asset>,
}

impl MemoryResources {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource; the content type comes from the path's extension.
    #[must_use]
    pub fn with(mut self, path: &str, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    pub fn insert(&mut self, path: &str, bytes: impl Into<Vec<u8>>) {
        let key = path.trim_start_matches('/').to_string();
        let content_type = content_type(Path::new(&key)).to_string();
        self.entries.insert(
            key,
            Asset {
                bytes: bytes.into(),
                content_type,
            },
        );
    }
}

impl ResourceStore for MemoryResources {
    fn load(&self, path: &str) -> io::Result<Option<Asset>> {
        Ok(self.entries.get(path.trim_start_matches('/')).cloned())
    }
}

//! Byte sources for the image loader.
//!
//! The loader never talks to a transport directly; it asks an injected
//! [`ImageFetcher`] for the raw bytes of a URL.

use crate::error::LoadError;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, LoadError>> + Send + 'static>>;

/// Fetches the encoded bytes behind an image URL.
pub trait ImageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> FetchFuture;
}

/// Reads `file://` URLs and plain paths from disk. Relative paths resolve
/// against `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn resolve(&self, url: &str) -> PathBuf {
        let raw = url.strip_prefix("file://").unwrap_or(url);
        let path = Path::new(raw);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        let path = self.resolve(url);
        let url = url.to_string();
        Box::pin(async move {
            tokio::fs::read(&path).await.map_err(|e| LoadError::Fetch {
                url,
                message: format!("{}: {e}", path.display()),
            })
        })
    }
}

/// Serves images from an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    entries: HashMap<String, Arc<Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(url.into(), Arc::new(bytes));
    }

    pub fn with(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(url, bytes);
        self
    }
}

impl ImageFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        let found = self.entries.get(url).cloned();
        let url = url.to_string();
        Box::pin(async move {
            found
                .map(|bytes| bytes.as_ref().clone())
                .ok_or_else(|| LoadError::Fetch {
                    url,
                    message: "not found".into(),
                })
        })
    }
}

//! Viewport-driven lazy loading.
//!
//! Entries are registered with the canvas-space box they occupy. Each call
//! to [`LazyLoader::update_viewport`] starts a background `preload` for
//! every entry that has come into view and forgets it, so an entry fires
//! at most once.

use crate::loader::{ImageLoader, PendingImage};
use md_core::Bounds;

struct Observed<K> {
    key: K,
    url: String,
    bounds: Bounds,
}

pub struct LazyLoader<K> {
    loader: ImageLoader,
    entries: Vec<Observed<K>>,
}

impl<K: PartialEq> LazyLoader<K> {
    pub fn new(loader: ImageLoader) -> Self {
        Self {
            loader,
            entries: Vec::new(),
        }
    }

    /// Watch `key`. Re-observing an existing key replaces its url and box.
    pub fn observe(&mut self, key: K, url: impl Into<String>, bounds: Bounds) {
        let url = url.into();
        if let Some(entry) = self.entries.iter_mut().find(|e| e.key == key) {
            entry.url = url;
            entry.bounds = bounds;
            return;
        }
        self.entries.push(Observed { key, url, bounds });
    }

    pub fn unobserve(&mut self, key: &K) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| &e.key != key);
        self.entries.len() != before
    }

    /// Number of entries still waiting to become visible.
    pub fn observed(&self) -> usize {
        self.entries.len()
    }

    /// Trigger loads for entries intersecting `viewport`, in registration order.
    pub fn update_viewport(&mut self, viewport: Bounds) -> Vec<(K, PendingImage)> {
        let (visible, hidden): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.bounds.intersects(&viewport));
        self.entries = hidden;

        visible
            .into_iter()
            .map(|e| {
                log::trace!("lazy image {} entered viewport", e.url);
                let pending = self.loader.preload(&e.url, false);
                (e.key, pending)
            })
            .collect()
    }
}

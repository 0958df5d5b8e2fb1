//! # Preview Handles
//!
//! Local, in-memory references that let a UI render a selected file before
//! it is uploaded. A handle owns its registry entry: dropping the handle
//! releases it, whether it was replaced, reset, or torn down with the session.

use super::assets::LocalFile;
use super::lock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Bytes and media type behind a live preview
#[derive(Debug, Clone)]
pub struct PreviewData {
    pub media_type: String,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: u64,
    live: HashMap<String, PreviewData>,
}

/// Issues and tracks preview handles
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a new preview handle from a local file
    pub fn create(&self, file: &LocalFile) -> PreviewHandle {
        let mut inner = lock(&self.inner);
        inner.next_id += 1;
        let url = format!("blob:tryon/{}", inner.next_id);
        inner.live.insert(
            url.clone(),
            PreviewData {
                media_type: file.media_type.clone(),
                bytes: file.bytes.clone(),
            },
        );
        tracing::debug!(preview = %url, file = %file.name, "Preview created");

        PreviewHandle {
            url,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Look up the data behind a preview URL, if it is still live
    pub fn resolve(&self, url: &str) -> Option<PreviewData> {
        lock(&self.inner).live.get(url).cloned()
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        lock(&self.inner).live.len()
    }
}

/// Exclusive reference to one preview; released on drop
#[derive(Debug)]
pub struct PreviewHandle {
    url: String,
    registry: Weak<Mutex<RegistryInner>>,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            lock(&inner).live.remove(&self.url);
            tracing::debug!(preview = %self.url, "Preview released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str) -> LocalFile {
        LocalFile::new(name, "image/png", vec![1, 2, 3])
    }

    #[test]
    fn test_handle_released_on_drop() {
        let registry = PreviewRegistry::new();
        let handle = registry.create(&png("a.png"));
        assert_eq!(registry.live_count(), 1);

        let url = handle.url().to_string();
        assert!(registry.resolve(&url).is_some());

        drop(handle);
        assert_eq!(registry.live_count(), 0);
        assert!(registry.resolve(&url).is_none());
    }

    #[test]
    fn test_urls_are_unique() {
        let registry = PreviewRegistry::new();
        let a = registry.create(&png("a.png"));
        let b = registry.create(&png("a.png"));
        assert_ne!(a.url(), b.url());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_handle_outlives_registry() {
        let registry = PreviewRegistry::new();
        let handle = registry.create(&png("a.png"));
        drop(registry);
        // Dropping after the registry is gone must not panic
        drop(handle);
    }
}

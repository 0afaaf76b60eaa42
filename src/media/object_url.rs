use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use super::MediaError;

/// Scheme prefix of locally created URLs
pub const OBJECT_URL_PREFIX: &str = "blob:pano-viewer/";

#[derive(Debug, Default)]
struct Registry {
    next: u64,
    entries: HashMap<String, PathBuf>,
}

/// Registry of revocable local references to picked files.
///
/// Cloning shares the registry, so the picker can mint URLs on a
/// background task that the viewer later resolves.
#[derive(Debug, Clone, Default)]
pub struct ObjectUrls {
    inner: Arc<Mutex<Registry>>,
}

impl ObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        // The registry holds no invariants a panicked writer could break
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a new URL pointing at `path`
    pub fn create(&self, path: PathBuf) -> String {
        let mut registry = self.registry();
        registry.next += 1;
        let url = format!("{}{}", OBJECT_URL_PREFIX, registry.next);
        registry.entries.insert(url.clone(), path);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.registry().entries.get(url).cloned()
    }

    /// Forget a URL. Returns false if it was already gone.
    pub fn revoke(&self, url: &str) -> bool {
        self.registry().entries.remove(url).is_some()
    }

    /// Map a panorama URL to a file on disk.
    ///
    /// Object URLs go through the registry; anything else is treated as a
    /// bundled asset path.
    pub fn resolve_source(&self, url: &str) -> Result<PathBuf, MediaError> {
        if url.starts_with("blob:") {
            self.resolve(url)
                .ok_or_else(|| MediaError::UnknownSource(url.to_string()))
        } else {
            Ok(PathBuf::from(url))
        }
    }
}

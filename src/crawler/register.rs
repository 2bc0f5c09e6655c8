use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// Set of normalized URLs that have entered the pipeline
///
/// A URL is registered at most once for the lifetime of a crawl; there is no
/// removal.
#[derive(Debug, Default)]
pub struct ProcessedUrlRegister {
    urls: Mutex<HashSet<String>>,
}

impl ProcessedUrlRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the URL if absent
    ///
    /// Returns true for the single caller that inserted it.
    pub fn try_register(&self, normalized_url: &str) -> bool {
        let mut urls = self.lock();
        if urls.contains(normalized_url) {
            return false;
        }
        urls.insert(normalized_url.to_string())
    }

    pub fn is_registered(&self, normalized_url: &str) -> bool {
        self.lock().contains(normalized_url)
    }

    /// Number of registered URLs
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.urls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

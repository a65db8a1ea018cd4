//! Bounded in-process cache of successful translations

use lru::LruCache;
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::core::models::{Language, TranslationResult};

/// Default number of cached translations
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Stable key for an exact (text, source, target) tuple
pub fn cache_key(text: &str, source: Language, target: Language) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(source.code().as_bytes());
    hasher.update(b"\0");
    hasher.update(target.code().as_bytes());
    hasher.update(b"\0");
    hasher.update(text.as_bytes());
    format!("trans:{}", hasher.finalize().to_hex())
}

/// LRU cache guarded by a single mutex
#[derive(Debug)]
pub struct TranslationCache {
    entries: Mutex<LruCache<String, TranslationResult>>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl TranslationCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn get(&self, key: &str) -> Option<TranslationResult> {
        let mut entries = self.entries.lock().await;
        let hit = entries.get(key).cloned();
        debug!(hit = hit.is_some(), "translation cache lookup");
        hit
    }

    pub async fn insert(&self, key: String, result: TranslationResult) {
        let mut entries = self.entries.lock().await;
        entries.put(key, result);
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

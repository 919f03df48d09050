//! Bounded in-memory cache for analysis results.
//!
//! Identical posts (text plus image bytes) hit the hosted APIs once; repeat
//! submissions are served from a bounded LRU.

use crate::types::{ContentAnalysis, PostContent};
use lru::LruCache;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::num::NonZeroUsize;
use tokio::sync::RwLock;

/// Bounded analysis result cache.
pub struct AnalysisCache {
    entries: RwLock<LruCache<u64, ContentAnalysis>>,
}

impl AnalysisCache {
    /// Create a cache with the given capacity. Returns `None` for capacity 0
    /// (caching disabled).
    pub fn with_capacity(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: RwLock::new(LruCache::new(capacity)),
        })
    }

    /// Cache key for a post: hash of text and image bytes.
    pub fn key(post: &PostContent) -> u64 {
        let mut hasher = DefaultHasher::new();
        post.text.hash(&mut hasher);
        if let Some(image) = &post.image {
            image.bytes.hash(&mut hasher);
        }
        hasher.finish()
    }

    /// Look up a cached analysis, refreshing its LRU position.
    pub async fn get(&self, key: u64) -> Option<ContentAnalysis> {
        self.entries.write().await.get(&key).cloned()
    }

    /// Store an analysis.
    pub async fn insert(&self, key: u64, analysis: ContentAnalysis) {
        self.entries.write().await.put(key, analysis);
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

//! Verdict cache.
//!
//! Re-checking the same rule against the same document text with the same
//! model reuses the earlier validated verdict instead of paying for another
//! call. Fallback verdicts are never stored.

use moka::future::Cache;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Duration;

use rulecheck_core::{Rule, Verdict};

use crate::config::CacheConfig;

/// Cache key: model, rule text and a digest of the document text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    model: String,
    rule: String,
    text_hash: u64,
    text_len: usize,
}

impl CacheKey {
    pub fn new(model: &str, rule: &Rule, text: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Self {
            model: model.to_string(),
            rule: rule.as_str().to_string(),
            text_hash: hasher.finish(),
            text_len: text.len(),
        }
    }
}

/// In-memory cache of validated verdicts.
pub struct VerdictCache {
    cache: Cache<CacheKey, Verdict>,
}

impl VerdictCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Build from config, or `None` when caching is disabled.
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_entries, config.ttl))
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Verdict> {
        self.cache.get(key).await
    }

    /// Store a verdict. Fallback verdicts are ignored.
    pub async fn insert(&self, key: CacheKey, verdict: Verdict) {
        if verdict.is_fallback() {
            return;
        }
        self.cache.insert(key, verdict).await;
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for VerdictCache {
    fn default() -> Self {
        let config = CacheConfig::default();
        Self::new(config.max_entries, config.ttl)
    }
}

impl std::fmt::Debug for VerdictCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerdictCache")
            .field("entries", &self.entry_count())
            .finish()
    }
}

//! Prompt/response cache keyed by `(prompt_hash, model_id)`: TTL-checked
//! entries, capacity-bounded, lock-guarded.

use enos_core::config::CacheConfig;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    created_at: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// In-memory prompt cache, LRU-bounded by `max_entries`. `enabled: false`
/// makes every call a miss, so callers can bypass caching entirely.
pub struct PromptCache {
    config: CacheConfig,
    entries: Mutex<LruCache<u64, Entry>>,
}

fn cache_key(prompt_hash: u64, model_id: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    prompt_hash.hash(&mut hasher);
    model_id.hash(&mut hasher);
    hasher.finish()
}

/// Stable hash of a `{system, user}` prompt pair, used as the cache key's
/// prompt component.
#[must_use]
pub fn hash_prompt(system: &str, user: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    system.hash(&mut hasher);
    user.hash(&mut hasher);
    hasher.finish()
}

impl PromptCache {
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            config,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    #[must_use]
    pub fn get(&self, prompt_hash: u64, model_id: &str) -> Option<String> {
        if !self.config.enabled {
            return None;
        }
        let key = cache_key(prompt_hash, model_id);
        let mut entries = self.entries.lock();
        match entries.get(&key) {
            Some(entry) if !entry.is_expired(self.config.ttl) => Some(entry.value.clone()),
            Some(_) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, prompt_hash: u64, model_id: &str, value: String) {
        if !self.config.enabled {
            return;
        }
        let key = cache_key(prompt_hash, model_id);
        self.entries.lock().put(
            key,
            Entry {
                value,
                created_at: Instant::now(),
            },
        );
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

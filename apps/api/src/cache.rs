//! Bounded in-memory cache with per-entry expiry.
//!
//! Process-local: every server instance holds its own copy. Values are cloned
//! on read so no `DashMap` guard outlives the call.

use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

/// Map with a fixed capacity and TTL. When full, inserting a new key evicts
/// the oldest entry (after expired entries have been purged).
#[derive(Debug, Clone)]
pub struct MemoryCache<K, V>
where
    K: Eq + Hash,
{
    inner: Arc<DashMap<K, CacheEntry<V>>>,
    capacity: usize,
    ttl: Duration,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            capacity,
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.remove(key).map(|(_, entry)| entry.value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    #[allow(dead_code)]
    pub fn clear(&self) {
        self.inner.clear();
    }

    fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let hit = self
            .inner
            .get(key)
            .map(|entry| (entry.expires_at > now, entry.value.clone()));
        match hit {
            Some((true, value)) => Some(value),
            Some((false, _)) => {
                self.inner.remove_if(key, |_, entry| entry.expires_at <= now);
                None
            }
            None => None,
        }
    }

    fn insert_at(&self, key: K, value: V, now: Instant) {
        if self.capacity == 0 {
            return;
        }
        if !self.inner.contains_key(&key) && self.inner.len() >= self.capacity {
            self.inner.retain(|_, entry| entry.expires_at > now);
            if self.inner.len() >= self.capacity {
                self.evict_oldest();
            }
        }
        self.inner.insert(
            key,
            CacheEntry {
                value,
                inserted_at: now,
                expires_at: now + self.ttl,
            },
        );
    }

    fn evict_oldest(&self) {
        let oldest = self
            .inner
            .iter()
            .min_by_key(|entry| entry.inserted_at)
            .map(|entry| entry.key().clone());
        if let Some(key) = oldest {
            self.inner.remove(&key);
        }
    }
}

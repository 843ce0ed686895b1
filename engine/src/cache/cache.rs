use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::debug;

use crate::{cache::CachedValue, time::Clock};

struct CacheEntry {
    value: CachedValue,
    // clock time after which the entry is gone, None for no expiry
    expires_at: Option<Duration>,
}

/// Per-worker key/value store for shared application state. On a server it
/// also answers clients' cache requests
pub struct Cache {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl Cache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Stores `value`, replacing any previous one. With a `ttl` the entry
    /// expires that long from now
    pub fn set(&self, key: &str, value: impl Into<CachedValue>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| self.clock.now() + ttl);
        self.lock().insert(
            key.to_string(),
            CacheEntry {
                value: value.into(),
                expires_at,
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<CachedValue> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            None => return None,
            Some(entry) => entry.expires_at.map_or(false, |at| at <= now),
        };
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn remove(&self, key: &str) -> Option<CachedValue> {
        self.lock().remove(key).map(|entry| entry.value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drops every expired entry, returning how many were removed
    pub fn clean_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Removed {} expired cache entries", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

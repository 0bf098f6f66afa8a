use std::{num::NonZeroUsize, time::Duration};

use lru::LruCache;
use parking_lot::Mutex;

use super::path::DotPath;
use crate::{
    codec::{
        fetch_many, fetch_value, store_value, store_value_with_ttl, DecodeMode, LoadOutcome, Value,
    },
    config::Settings,
    error::DotkvResult,
    store::Storage,
};

pub const DEFAULT_NAMESPACE: &str = "root";
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Path-addressed handle over a store.
///
/// Owns the store handle it is given; there is no process-wide singleton.
/// Keys are namespaced (`root.my.list` for path `my.list`), loads go through
/// a small LRU read cache, and writes are either immediate (`save`) or
/// buffered until [`Root::flush`] (`stage`). Thread-safe: all methods take
/// `&self`.
pub struct Root<S: Storage> {
    store: S,
    namespace: String,
    mode: DecodeMode,
    default_ttl: Option<Duration>,
    cache: Mutex<LruCache<String, Value>>,
    staged: Mutex<Vec<(String, Value)>>,
}

impl<S: Storage> Root<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, &Settings::default())
    }

    pub fn with_settings(
        store: S,
        settings: &Settings,
    ) -> Self {
        let capacity = NonZeroUsize::new(settings.cache_capacity.max(1))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            namespace: settings.namespace.clone(),
            mode: if settings.verbatim {
                DecodeMode::Verbatim
            } else {
                DecodeMode::Typed
            },
            default_ttl: settings.default_ttl_secs.map(Duration::from_secs),
            cache: Mutex::new(LruCache::new(capacity)),
            staged: Mutex::new(Vec::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolves a caller path to its namespaced store key.
    pub fn key_for(
        &self,
        path: &str,
    ) -> DotkvResult<String> {
        let path = DotPath::parse(path)?;
        Ok(format!("{}.{}", self.namespace, path.canonical()))
    }

    /// Saves `value` at `path` immediately, as one logical replacement.
    pub fn save(
        &self,
        path: &str,
        value: impl Into<Value>,
    ) -> DotkvResult<()> {
        let key = self.key_for(path)?;
        let value = value.into();
        self.write(&key, &value)?;
        self.cache.lock().put(key, value);
        Ok(())
    }

    /// Saves `value` at `path` and arms a relative expiry on the key.
    pub fn save_with_ttl(
        &self,
        path: &str,
        value: impl Into<Value>,
        ttl: Duration,
    ) -> DotkvResult<()> {
        let key = self.key_for(path)?;
        let value = value.into();
        store_value_with_ttl(&self.store, &key, &value, ttl)?;
        self.cache.lock().put(key, value);
        Ok(())
    }

    /// Buffers a write locally. The value is visible to loads through this
    /// handle right away but only reaches the store on [`Root::flush`].
    pub fn stage(
        &self,
        path: &str,
        value: impl Into<Value>,
    ) -> DotkvResult<()> {
        let key = self.key_for(path)?;
        let value = value.into();
        self.cache.lock().put(key.clone(), value.clone());
        self.staged.lock().push((key, value));
        Ok(())
    }

    /// Drains staged writes to the store in insertion order, then drops the
    /// local read cache so later loads observe the store again.
    pub fn flush(&self) -> DotkvResult<()> {
        let staged = std::mem::take(&mut *self.staged.lock());
        for (key, value) in &staged {
            self.write(key, value)?;
        }
        self.cache.lock().clear();
        Ok(())
    }

    /// Loads the value at `path`, `None` when the key is absent.
    pub fn load(
        &self,
        path: &str,
    ) -> DotkvResult<Option<Value>> {
        let key = self.key_for(path)?;
        if let Some(value) = self.cache.lock().get(&key) {
            return Ok(Some(value.clone()));
        }

        let loaded = fetch_value(&self.store, &key, self.mode)?;
        if let Some(value) = &loaded {
            self.cache.lock().put(key, value.clone());
        }
        Ok(loaded)
    }

    /// Loads several paths in one batched round trip. Outcomes align with
    /// `paths`; a missing key marks its own slot and leaves the rest intact.
    pub fn load_many(
        &self,
        paths: &[&str],
    ) -> DotkvResult<Vec<LoadOutcome>> {
        let keys = paths
            .iter()
            .map(|p| self.key_for(p))
            .collect::<DotkvResult<Vec<_>>>()?;

        let mut results: Vec<Option<LoadOutcome>> = Vec::with_capacity(keys.len());
        let mut misses: Vec<usize> = Vec::new();
        {
            let mut cache = self.cache.lock();
            for (i, key) in keys.iter().enumerate() {
                match cache.get(key) {
                    Some(value) => results.push(Some(LoadOutcome::Found(value.clone()))),
                    None => {
                        results.push(None);
                        misses.push(i);
                    }
                }
            }
        }

        if !misses.is_empty() {
            let miss_keys: Vec<&str> = misses.iter().map(|&i| keys[i].as_str()).collect();
            let outcomes = fetch_many(&self.store, &miss_keys, self.mode)?;
            let mut cache = self.cache.lock();
            for (&i, outcome) in misses.iter().zip(outcomes) {
                if let LoadOutcome::Found(value) = &outcome {
                    cache.put(keys[i].clone(), value.clone());
                }
                results[i] = Some(outcome);
            }
        }

        Ok(results
            .into_iter()
            .map(|slot| slot.unwrap_or(LoadOutcome::Missing))
            .collect())
    }

    /// Removes the value at `path` from the store, the cache and the staged
    /// buffer. Returns whether the store held the key.
    pub fn delete(
        &self,
        path: &str,
    ) -> DotkvResult<bool> {
        let key = self.key_for(path)?;
        self.cache.lock().pop(&key);
        self.staged.lock().retain(|(k, _)| *k != key);
        Ok(self.store.delete(&key)?)
    }

    fn write(
        &self,
        key: &str,
        value: &Value,
    ) -> DotkvResult<()> {
        match self.default_ttl {
            Some(ttl) => store_value_with_ttl(&self.store, key, value, ttl),
            None => store_value(&self.store, key, value),
        }
    }
}

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use dashmap::{mapref::entry::Entry, DashMap};
use parking_lot::Mutex;

use super::storage::{KeyType, Storage};
use crate::error::{StoreError, StoreResult};

/// What one key holds.
#[derive(Debug, Clone)]
enum Slot {
    Value(Bytes),
    List(Vec<Bytes>),
    Set(HashSet<Bytes>),
    Hash(HashMap<Bytes, Bytes>),
}

impl Slot {
    fn key_type(&self) -> KeyType {
        match self {
            Slot::Value(_) => KeyType::String,
            Slot::List(_) => KeyType::List,
            Slot::Set(_) => KeyType::Set,
            Slot::Hash(_) => KeyType::Hash,
        }
    }
}

/// Lazy expiry index: deadlines plus a min-heap of due times. The heap may
/// hold stale entries for deleted or re-armed keys; `due` ignores anything
/// the deadline map no longer agrees with.
#[derive(Default)]
struct ExpireIndex {
    deadlines: HashMap<String, Instant>,
    queue: BinaryHeap<Reverse<(Instant, String)>>,
}

impl ExpireIndex {
    fn arm(
        &mut self,
        key: String,
        ttl: Duration,
    ) {
        let deadline = Instant::now() + ttl;
        self.deadlines.insert(key.clone(), deadline);
        self.queue.push(Reverse((deadline, key)));
    }

    fn disarm(
        &mut self,
        key: &str,
    ) {
        self.deadlines.remove(key);
    }

    fn due(&mut self) -> Vec<String> {
        let now = Instant::now();
        let mut expired = Vec::new();
        loop {
            match self.queue.peek() {
                Some(Reverse((deadline, _))) if *deadline <= now => {}
                _ => break,
            }
            let Some(Reverse((deadline, key))) = self.queue.pop() else {
                break;
            };
            if self.deadlines.get(&key) == Some(&deadline) {
                self.deadlines.remove(&key);
                expired.push(key);
            }
        }
        expired
    }
}

/// In-memory store with the full structural contract, used as the reference
/// backend in tests and embedded setups.
pub struct InMemoryStore {
    data: Arc<DashMap<String, Slot>>,
    expires: Mutex<ExpireIndex>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            data: Arc::new(DashMap::new()),
            expires: Mutex::new(ExpireIndex::default()),
        }
    }

    fn purge_expired(&self) {
        let due = self.expires.lock().due();
        for key in due {
            self.data.remove(&key);
        }
    }

    fn conflict(
        key: &str,
        held: KeyType,
        wanted: KeyType,
    ) -> StoreError {
        StoreError::TypeConflict(format!("key {key:?} holds {held:?}, operation needs {wanted:?}"))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for InMemoryStore {
    fn get(
        &self,
        key: &str,
    ) -> StoreResult<Option<Bytes>> {
        self.purge_expired();
        match self.data.get(key) {
            None => Ok(None),
            Some(entry) => match entry.value() {
                Slot::Value(bytes) => Ok(Some(bytes.clone())),
                other => Err(Self::conflict(key, other.key_type(), KeyType::String)),
            },
        }
    }

    fn mget(
        &self,
        keys: &[&str],
    ) -> StoreResult<Vec<Option<Bytes>>> {
        self.purge_expired();
        // Missing and composite-typed keys both come back as empty slots.
        Ok(keys
            .iter()
            .map(|key| match self.data.get(*key).map(|e| e.value().clone()) {
                Some(Slot::Value(bytes)) => Some(bytes),
                _ => None,
            })
            .collect())
    }

    fn set(
        &self,
        key: &str,
        value: Bytes,
    ) -> StoreResult<()> {
        self.purge_expired();
        match self.data.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => match entry.get() {
                Slot::Value(_) => {
                    entry.insert(Slot::Value(value));
                    Ok(())
                }
                other => Err(Self::conflict(key, other.key_type(), KeyType::String)),
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::Value(value));
                Ok(())
            }
        }
    }

    fn delete(
        &self,
        key: &str,
    ) -> StoreResult<bool> {
        self.purge_expired();
        self.expires.lock().disarm(key);
        Ok(self.data.remove(key).is_some())
    }

    fn type_of(
        &self,
        key: &str,
    ) -> StoreResult<KeyType> {
        self.purge_expired();
        Ok(self
            .data
            .get(key)
            .map(|entry| entry.value().key_type())
            .unwrap_or(KeyType::None))
    }

    fn list_push(
        &self,
        key: &str,
        items: &[Bytes],
    ) -> StoreResult<()> {
        self.purge_expired();
        if items.is_empty() {
            return Ok(());
        }
        match self.data.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Slot::List(list) => {
                    list.extend_from_slice(items);
                    Ok(())
                }
                other => Err(Self::conflict(key, other.key_type(), KeyType::List)),
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::List(items.to_vec()));
                Ok(())
            }
        }
    }

    fn list_range(
        &self,
        key: &str,
        start: i64,
        stop: i64,
    ) -> StoreResult<Vec<Bytes>> {
        self.purge_expired();
        let Some(entry) = self.data.get(key) else {
            return Ok(Vec::new());
        };
        let Slot::List(list) = entry.value() else {
            return Err(Self::conflict(key, entry.value().key_type(), KeyType::List));
        };

        let len = list.len() as i64;
        let resolve = |index: i64| -> i64 {
            if index < 0 {
                len + index
            } else {
                index
            }
        };
        let start = resolve(start).max(0);
        let stop = resolve(stop).min(len - 1);
        if start > stop {
            return Ok(Vec::new());
        }
        Ok(list[start as usize..=stop as usize].to_vec())
    }

    fn set_add(
        &self,
        key: &str,
        members: &[Bytes],
    ) -> StoreResult<()> {
        self.purge_expired();
        if members.is_empty() {
            return Ok(());
        }
        match self.data.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Slot::Set(set) => {
                    set.extend(members.iter().cloned());
                    Ok(())
                }
                other => Err(Self::conflict(key, other.key_type(), KeyType::Set)),
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::Set(members.iter().cloned().collect()));
                Ok(())
            }
        }
    }

    fn set_members(
        &self,
        key: &str,
    ) -> StoreResult<HashSet<Bytes>> {
        self.purge_expired();
        match self.data.get(key) {
            None => Ok(HashSet::new()),
            Some(entry) => match entry.value() {
                Slot::Set(set) => Ok(set.clone()),
                other => Err(Self::conflict(key, other.key_type(), KeyType::Set)),
            },
        }
    }

    fn hash_set_fields(
        &self,
        key: &str,
        fields: &[(Bytes, Bytes)],
    ) -> StoreResult<()> {
        self.purge_expired();
        if fields.is_empty() {
            return Ok(());
        }
        match self.data.entry(key.to_owned()) {
            Entry::Occupied(mut entry) => match entry.get_mut() {
                Slot::Hash(hash) => {
                    hash.extend(fields.iter().cloned());
                    Ok(())
                }
                other => Err(Self::conflict(key, other.key_type(), KeyType::Hash)),
            },
            Entry::Vacant(entry) => {
                entry.insert(Slot::Hash(fields.iter().cloned().collect()));
                Ok(())
            }
        }
    }

    fn hash_get_all(
        &self,
        key: &str,
    ) -> StoreResult<Vec<(Bytes, Bytes)>> {
        self.purge_expired();
        match self.data.get(key) {
            None => Ok(Vec::new()),
            Some(entry) => match entry.value() {
                Slot::Hash(hash) => Ok(hash.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
                other => Err(Self::conflict(key, other.key_type(), KeyType::Hash)),
            },
        }
    }

    fn expire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> StoreResult<bool> {
        self.purge_expired();
        if !self.data.contains_key(key) {
            return Ok(false);
        }
        self.expires.lock().arm(key.to_owned(), ttl);
        Ok(true)
    }

    fn flushdb(&self) -> StoreResult<()> {
        self.data.clear();
        let mut expires = self.expires.lock();
        expires.deadlines.clear();
        expires.queue.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(data: &str) -> Bytes {
        Bytes::copy_from_slice(data.as_bytes())
    }

    /// Basic test to verify that a value can be set and then retrieved.
    #[test]
    fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("hello", b("world")).unwrap();
        assert_eq!(store.get("hello").unwrap(), Some(b("world")));
    }

    /// Ensures that querying a non-existent key returns None.
    #[test]
    fn test_get_nonexistent_key() {
        let store = InMemoryStore::new();
        assert_eq!(store.get("missing").unwrap(), None);
    }

    /// Setting a single value over a list key is a type conflict.
    #[test]
    fn test_set_over_list_conflicts() {
        let store = InMemoryStore::new();
        store.list_push("k", &[b("1")]).unwrap();
        let result = store.set("k", b("x"));
        assert!(matches!(result, Err(StoreError::TypeConflict(_))));
    }

    /// Pushing into a string key is a type conflict.
    #[test]
    fn test_push_over_string_conflicts() {
        let store = InMemoryStore::new();
        store.set("k", b("x")).unwrap();
        assert!(store.list_push("k", &[b("1")]).is_err());
        assert!(store.set_add("k", &[b("1")]).is_err());
        assert!(store.hash_set_fields("k", &[(b("f"), b("v"))]).is_err());
    }

    /// mget returns aligned slots; composite keys come back empty.
    #[test]
    fn test_mget_alignment() {
        let store = InMemoryStore::new();
        store.set("a", b("1")).unwrap();
        store.list_push("l", &[b("x")]).unwrap();

        let slots = store.mget(&["a", "missing", "l"]).unwrap();
        assert_eq!(slots, vec![Some(b("1")), None, None]);
    }

    /// type_of distinguishes every structural shape.
    #[test]
    fn test_type_of() {
        let store = InMemoryStore::new();
        store.set("s", b("x")).unwrap();
        store.list_push("l", &[b("x")]).unwrap();
        store.set_add("set", &[b("x")]).unwrap();
        store.hash_set_fields("h", &[(b("f"), b("v"))]).unwrap();

        assert_eq!(store.type_of("s").unwrap(), KeyType::String);
        assert_eq!(store.type_of("l").unwrap(), KeyType::List);
        assert_eq!(store.type_of("set").unwrap(), KeyType::Set);
        assert_eq!(store.type_of("h").unwrap(), KeyType::Hash);
        assert_eq!(store.type_of("missing").unwrap(), KeyType::None);
    }

    /// list_range resolves negative indices from the end.
    #[test]
    fn test_list_range_negative_indices() {
        let store = InMemoryStore::new();
        store.list_push("l", &[b("a"), b("b"), b("c")]).unwrap();

        assert_eq!(
            store.list_range("l", 0, -1).unwrap(),
            vec![b("a"), b("b"), b("c")]
        );
        assert_eq!(store.list_range("l", -2, -1).unwrap(), vec![b("b"), b("c")]);
        assert_eq!(store.list_range("l", 2, 1).unwrap(), Vec::<Bytes>::new());
    }

    /// Set members deduplicate.
    #[test]
    fn test_set_add_deduplicates() {
        let store = InMemoryStore::new();
        store.set_add("s", &[b("x"), b("x"), b("y")]).unwrap();
        assert_eq!(store.set_members("s").unwrap().len(), 2);
    }

    /// Deleting an existing key removes it; deleting again reports false.
    #[test]
    fn test_delete() {
        let store = InMemoryStore::new();
        store.set("k", b("v")).unwrap();
        assert!(store.delete("k").unwrap());
        assert!(!store.delete("k").unwrap());
        assert_eq!(store.get("k").unwrap(), None);
    }

    /// An expired key behaves as missing on every accessor.
    #[test]
    fn test_expiry() {
        let store = InMemoryStore::new();
        store.set("k", b("v")).unwrap();
        assert!(store.expire("k", Duration::from_millis(30)).unwrap());

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(store.get("k").unwrap(), None);
        assert_eq!(store.type_of("k").unwrap(), KeyType::None);
    }

    /// Arming an expiry on a missing key reports false.
    #[test]
    fn test_expire_missing_key() {
        let store = InMemoryStore::new();
        assert!(!store.expire("nope", Duration::from_secs(1)).unwrap());
    }

    /// Deleting a key disarms its pending expiry for a later re-set.
    #[test]
    fn test_delete_disarms_expiry() {
        let store = InMemoryStore::new();
        store.set("k", b("v")).unwrap();
        store.expire("k", Duration::from_millis(30)).unwrap();
        store.delete("k").unwrap();
        store.set("k", b("fresh")).unwrap();

        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(store.get("k").unwrap(), Some(b("fresh")));
    }

    /// flushdb removes all keys.
    #[test]
    fn test_flushdb() {
        let store = InMemoryStore::new();
        store.set("a", b("1")).unwrap();
        store.set_add("s", &[b("x")]).unwrap();
        store.flushdb().unwrap();

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.type_of("s").unwrap(), KeyType::None);
    }
}

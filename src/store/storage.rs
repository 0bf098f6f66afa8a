use std::{collections::HashSet, time::Duration};

use bytes::Bytes;

use crate::error::StoreResult;

/// Structural type a store reports for a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// No such key.
    None,
    /// A single opaque byte value.
    String,
    /// An ordered list.
    List,
    /// An unordered set.
    Set,
    /// A field/value map.
    Hash,
}

/// The primitive operations the codec needs from a key-value store.
///
/// All payloads are UTF-8 encoded bytes. `mget` returns one slot per
/// requested key, aligned with the input; a slot is `None` when the key is
/// missing or holds a composite type, so callers must follow up with
/// [`Storage::type_of`] to tell the two cases apart. Writing a single value
/// over a composite key (or pushing into a key of the wrong shape) fails
/// with a type conflict rather than silently converting.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<Bytes>>;
    fn mget(&self, keys: &[&str]) -> StoreResult<Vec<Option<Bytes>>>;
    fn set(&self, key: &str, value: Bytes) -> StoreResult<()>;
    fn delete(&self, key: &str) -> StoreResult<bool>;
    fn type_of(&self, key: &str) -> StoreResult<KeyType>;

    fn list_push(&self, key: &str, items: &[Bytes]) -> StoreResult<()>;
    /// Inclusive range; negative indices count from the end, so `(0, -1)` is
    /// the whole list.
    fn list_range(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<Bytes>>;

    fn set_add(&self, key: &str, members: &[Bytes]) -> StoreResult<()>;
    fn set_members(&self, key: &str) -> StoreResult<HashSet<Bytes>>;

    fn hash_set_fields(&self, key: &str, fields: &[(Bytes, Bytes)]) -> StoreResult<()>;
    fn hash_get_all(&self, key: &str) -> StoreResult<Vec<(Bytes, Bytes)>>;

    /// Arms a relative expiry on the key. Returns `false` when the key does
    /// not exist.
    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Removes every key. Test teardown mostly.
    fn flushdb(&self) -> StoreResult<()>;
}

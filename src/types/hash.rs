// src/types/hash.rs

//! Hash values: field → value maps stored under a single key.
//!
//! Multi-field reads come back sorted by field name so replies and snapshots
//! are deterministic. Removing the last field removes the key.

use crate::store::{Store, StoreResult};

impl Store {
    /// HSET key field value
    /// Returns `true` when the field was newly created, `false` when it was overwritten.
    pub fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        let mut ks = self.lock();
        let hash = ks.hash_or_create(key)?;
        Ok(hash.insert(field.to_string(), value.to_string()).is_none())
    }

    /// HGET key field
    pub fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        let mut ks = self.lock();
        Ok(ks.hash(key)?.and_then(|hash| hash.get(field).cloned()))
    }

    /// HDEL key field
    /// Returns `true` if an existing field was removed.
    pub fn hdel(&self, key: &str, field: &str) -> StoreResult<bool> {
        let mut ks = self.lock();
        let Some(hash) = ks.hash(key)? else {
            return Ok(false);
        };
        let removed = hash.remove(field).is_some();
        if hash.is_empty() {
            ks.remove(key);
        }
        Ok(removed)
    }

    /// HGETALL key
    /// All `(field, value)` pairs, empty when the key does not exist.
    pub fn hgetall(&self, key: &str) -> StoreResult<Vec<(String, String)>> {
        let mut ks = self.lock();
        let mut pairs: Vec<(String, String)> = match ks.hash(key)? {
            Some(hash) => hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect(),
            None => Vec::new(),
        };
        pairs.sort_unstable();
        Ok(pairs)
    }

    /// HKEYS key
    pub fn hkeys(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self.hgetall(key)?.into_iter().map(|(f, _)| f).collect())
    }

    /// HVALS key
    /// Values in field order.
    pub fn hvals(&self, key: &str) -> StoreResult<Vec<String>> {
        Ok(self.hgetall(key)?.into_iter().map(|(_, v)| v).collect())
    }

    /// HLEN key
    pub fn hlen(&self, key: &str) -> StoreResult<usize> {
        let mut ks = self.lock();
        Ok(ks.hash(key)?.map_or(0, |hash| hash.len()))
    }
}

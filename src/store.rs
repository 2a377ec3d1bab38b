// src/store.rs

//! # Store
//!
//! The key-space shared by every connection. All state lives in a single
//! [`Keyspace`] behind one `parking_lot::Mutex`; every public operation takes
//! the lock exactly once and releases it before returning.
//!
//! Per-kind operations are implemented next to their data type:
//! - `types::string` – SET / GET / INCR / DECR
//! - `types::list`   – LPUSH / RPUSH / LPOP / RPOP / LRANGE / LLEN
//! - `types::hash`   – HSET / HGET / HDEL / HGETALL / ...
//! - `expire`        – EXPIRE / TTL / PERSIST / active purge
//! - `persistence`   – snapshot dump / load

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use crate::pattern::Pattern;

/// Failures a store operation can report back to the client.
///
/// The `Display` text is what ends up after `-ERR ` on the wire.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Operation against a key holding the wrong kind of value")]
    WrongType,
    #[error("value is not an integer or out of range")]
    NotInteger,
    #[error("increment or decrement would overflow")]
    Overflow,
    #[error("invalid expire time in 'expire' command")]
    InvalidExpire,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Value held by a single key. One key, one kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Str(_) => Kind::String,
            Value::List(_) => Kind::List,
            Value::Hash(_) => Kind::Hash,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    String,
    List,
    Hash,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::List => "list",
            Kind::Hash => "hash",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw state guarded by the store lock.
#[derive(Debug, Default)]
pub(crate) struct Keyspace {
    pub(crate) data: HashMap<String, Value>,
    pub(crate) expires: HashMap<String, Instant>,
}

impl Keyspace {
    pub(crate) fn is_expired(&self, key: &str, now: Instant) -> bool {
        self.expires.get(key).is_some_and(|deadline| *deadline <= now)
    }

    /// Lazy expiry: drop `key` if its deadline has passed.
    pub(crate) fn touch(&mut self, key: &str) {
        if self.is_expired(key, Instant::now()) {
            self.remove(key);
        }
    }

    /// Removes the value and its expiry entry together.
    pub(crate) fn remove(&mut self, key: &str) -> Option<Value> {
        self.expires.remove(key);
        self.data.remove(key)
    }

    pub(crate) fn contains(&mut self, key: &str) -> bool {
        self.touch(key);
        self.data.contains_key(key)
    }

    pub(crate) fn string(&mut self, key: &str) -> StoreResult<Option<&mut String>> {
        self.touch(key);
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::Str(s)) => Ok(Some(s)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub(crate) fn list(&mut self, key: &str) -> StoreResult<Option<&mut VecDeque<String>>> {
        self.touch(key);
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::List(list)) => Ok(Some(list)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    /// Like [`Keyspace::list`] but creates an empty list for a missing key.
    pub(crate) fn list_or_create(&mut self, key: &str) -> StoreResult<&mut VecDeque<String>> {
        self.touch(key);
        match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::List(list) => Ok(list),
            _ => Err(StoreError::WrongType),
        }
    }

    pub(crate) fn hash(&mut self, key: &str) -> StoreResult<Option<&mut HashMap<String, String>>> {
        self.touch(key);
        match self.data.get_mut(key) {
            None => Ok(None),
            Some(Value::Hash(hash)) => Ok(Some(hash)),
            Some(_) => Err(StoreError::WrongType),
        }
    }

    pub(crate) fn hash_or_create(&mut self, key: &str) -> StoreResult<&mut HashMap<String, String>> {
        self.touch(key);
        match self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()))
        {
            Value::Hash(hash) => Ok(hash),
            _ => Err(StoreError::WrongType),
        }
    }
}

/// Handle to a key-space. Cloning is cheap and every clone sees the same data,
/// so one instance can be shared by connection tasks and background workers.
#[derive(Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<Keyspace>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Keyspace> {
        self.inner.lock()
    }

    /// True iff `key` is present and not expired.
    pub fn exists(&self, key: &str) -> bool {
        self.lock().contains(key)
    }

    /// Deletes `key` whatever its kind. Returns true iff a live entry was removed.
    pub fn del(&self, key: &str) -> bool {
        let mut ks = self.lock();
        ks.touch(key);
        ks.remove(key).is_some()
    }

    /// Kind of the value at `key`, `None` when absent or expired.
    pub fn key_type(&self, key: &str) -> Option<Kind> {
        let mut ks = self.lock();
        ks.touch(key);
        ks.data.get(key).map(Value::kind)
    }

    /// Live keys matching a `*` / `?` glob, sorted.
    pub fn keys(&self, pattern: &str) -> Vec<String> {
        let pattern = Pattern::new(pattern);
        let now = Instant::now();
        let ks = self.lock();
        let mut keys: Vec<String> = ks
            .data
            .keys()
            .filter(|key| !ks.is_expired(key, now) && pattern.matches(key))
            .cloned()
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let ks = self.lock();
        ks.data.keys().filter(|key| !ks.is_expired(key, now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every key and every deadline.
    pub fn flush_all(&self) {
        let mut ks = self.lock();
        ks.data.clear();
        ks.expires.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_del_exists_and_type() -> Result<(), StoreError> {
        let store = Store::new();
        store.set("s", "v");
        store.lpush("l", &["a".to_string()])?;
        store.hset("h", "f", "v")?;

        assert!(store.exists("s"));
        assert_eq!(store.key_type("s"), Some(Kind::String));
        assert_eq!(store.key_type("l"), Some(Kind::List));
        assert_eq!(store.key_type("h"), Some(Kind::Hash));
        assert_eq!(store.key_type("missing"), None);
        assert_eq!(store.len(), 3);

        // del works on every kind
        assert!(store.del("s"));
        assert!(store.del("l"));
        assert!(store.del("h"));
        assert!(!store.del("h"));
        assert!(store.is_empty());
        Ok(())
    }

    #[test]
    fn test_del_clears_expiry_entry() {
        let store = Store::new();
        store.set("k", "v");
        assert_eq!(store.expire("k", 100), Ok(true));
        assert!(store.del("k"));
        assert!(store.lock().expires.is_empty());

        // a recreated key starts without a deadline
        store.set("k", "v2");
        assert_eq!(store.ttl("k"), -1);
    }

    #[test]
    fn test_del_on_expired_key_reports_false() {
        let store = Store::new();
        store.set("k", "v");
        store
            .lock()
            .expires
            .insert("k".into(), Instant::now() - Duration::from_millis(1));
        assert!(!store.del("k"));
        assert!(store.lock().data.is_empty());
    }

    #[test]
    fn test_keys_glob() {
        let store = Store::new();
        for key in ["foo", "foobar", "bar"] {
            store.set(key, "x");
        }
        assert_eq!(store.keys("foo*"), vec!["foo", "foobar"]);
        assert_eq!(store.keys("?oo"), vec!["foo"]);
        assert_eq!(store.keys("*"), vec!["bar", "foo", "foobar"]);
        assert!(store.keys("baz").is_empty());
    }

    #[test]
    fn test_keys_skips_expired() {
        let store = Store::new();
        store.set("live", "1");
        store.set("dead", "1");
        store
            .lock()
            .expires
            .insert("dead".into(), Instant::now() - Duration::from_millis(1));
        assert_eq!(store.keys("*"), vec!["live"]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_flush_all() -> Result<(), StoreError> {
        let store = Store::new();
        store.set("a", "1");
        store.rpush("b", &["x".to_string()])?;
        store.expire("a", 10)?;
        store.flush_all();
        assert!(store.is_empty());
        assert!(store.lock().expires.is_empty());
        Ok(())
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::new();
        let other = store.clone();
        store.set("shared", "yes");
        assert_eq!(other.get("shared"), Ok(Some("yes".to_string())));
        // separately constructed stores are isolated
        assert!(!Store::new().exists("shared"));
    }
}

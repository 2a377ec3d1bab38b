// src/types/list.rs

//! # List Type Support
//!
//! Lists are `VecDeque<String>` values in the shared key-space, so pushes and
//! pops at either end are O(1).
//!
//! A list that becomes empty after a pop is removed from the key-space
//! (together with any deadline), and a push of zero values never creates one,
//! so an empty list is never observable.
//!
//! Supported commands:
//! - `LPUSH`
//! - `RPUSH`
//! - `LPOP`
//! - `RPOP`
//! - `LRANGE`
//! - `LLEN`

use crate::store::{Store, StoreResult};

impl Store {
    /// Execute LPUSH:
    /// push each of `values` onto the head, in argument order.
    ///
    /// The last value ends up as the new head, so
    /// `LPUSH k a b c` leaves the list as `c, b, a`.
    ///
    /// # Returns
    ///
    /// The new length of the list.
    ///
    /// # Errors
    ///
    /// `WrongType` if `key` holds a string or a hash.
    pub fn lpush(&self, key: &str, values: &[String]) -> StoreResult<usize> {
        if values.is_empty() {
            return self.llen(key);
        }
        let mut ks = self.lock();
        let list = ks.list_or_create(key)?;
        for value in values {
            list.push_front(value.clone());
        }
        Ok(list.len())
    }

    /// Execute RPUSH:
    /// append `values` to the tail, in argument order.
    ///
    /// # Returns
    ///
    /// The new length of the list.
    pub fn rpush(&self, key: &str, values: &[String]) -> StoreResult<usize> {
        if values.is_empty() {
            return self.llen(key);
        }
        let mut ks = self.lock();
        let list = ks.list_or_create(key)?;
        list.extend(values.iter().cloned());
        Ok(list.len())
    }

    /// Execute LPOP:
    /// remove and return the head element, `None` if the list does not exist.
    pub fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        let mut ks = self.lock();
        let Some(list) = ks.list(key)? else {
            return Ok(None);
        };
        let head = list.pop_front();
        if list.is_empty() {
            ks.remove(key);
        }
        Ok(head)
    }

    /// Execute RPOP:
    /// remove and return the tail element, `None` if the list does not exist.
    pub fn rpop(&self, key: &str) -> StoreResult<Option<String>> {
        let mut ks = self.lock();
        let Some(list) = ks.list(key)? else {
            return Ok(None);
        };
        let tail = list.pop_back();
        if list.is_empty() {
            ks.remove(key);
        }
        Ok(tail)
    }

    /// Execute LRANGE:
    /// elements in the inclusive range `[start, stop]`.
    ///
    /// Negative indices count from the tail (`-1` is the last element).
    /// Both bounds are clamped into the list; an inverted range, a start past
    /// the end, or a missing key all yield an empty vector.
    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> StoreResult<Vec<String>> {
        let mut ks = self.lock();
        let Some(list) = ks.list(key)? else {
            return Ok(Vec::new());
        };
        Ok(match clamp_range(list.len(), start, stop) {
            Some((s, e)) => list.range(s..=e).cloned().collect(),
            None => Vec::new(),
        })
    }

    /// Execute LLEN: length of the list, `0` when the key does not exist.
    pub fn llen(&self, key: &str) -> StoreResult<usize> {
        let mut ks = self.lock();
        Ok(ks.list(key)?.map_or(0, |list| list.len()))
    }
}

/// Normalize a signed inclusive range against a list of `len` elements.
fn clamp_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let total = len as i64;
    let s = if start < 0 { total + start } else { start };
    let e = if stop < 0 { total + stop } else { stop };

    let s = s.max(0);
    let e = e.min(total - 1);
    if total == 0 || s > e {
        return None;
    }
    Some((s as usize, e as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use std::time::{Duration, Instant};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Basic tests for List commands: LPUSH, RPUSH, LPOP, RPOP, LRANGE
    #[test]
    fn test_list_basic() -> StoreResult<()> {
        let store = Store::new();

        assert_eq!(store.lpush("L", &strings(&["a"]))?, 1);
        assert_eq!(store.lpush("L", &strings(&["b"]))?, 2); // b, a
        assert_eq!(store.rpush("L", &strings(&["c"]))?, 3); // b, a, c

        assert_eq!(store.lrange("L", 0, 2)?, strings(&["b", "a", "c"]));
        assert_eq!(store.lrange("L", 1, 1)?, strings(&["a"]));
        assert_eq!(store.llen("L")?, 3);

        assert_eq!(store.lpop("L")?, Some("b".to_string()));
        assert_eq!(store.rpop("L")?, Some("c".to_string()));
        assert_eq!(store.lrange("L", 0, -1)?, strings(&["a"]));

        assert_eq!(store.lpop("L")?, Some("a".to_string()));
        assert_eq!(store.lpop("L")?, None);
        assert_eq!(store.rpop("L")?, None);
        Ok(())
    }

    #[test]
    fn test_lpush_batch_order() -> StoreResult<()> {
        let store = Store::new();
        assert_eq!(store.lpush("k", &strings(&["a", "b", "c"]))?, 3);
        assert_eq!(store.lpop("k")?, Some("c".to_string()));
        assert_eq!(store.lpop("k")?, Some("b".to_string()));
        assert_eq!(store.lpop("k")?, Some("a".to_string()));
        Ok(())
    }

    #[test]
    fn test_lrange_bounds() -> StoreResult<()> {
        let store = Store::new();
        store.rpush("k", &strings(&["x0", "x1", "x2", "x3", "x4"]))?;

        assert_eq!(store.lrange("k", -2, -1)?, strings(&["x3", "x4"]));
        assert_eq!(store.lrange("k", 0, 100)?.len(), 5);
        assert!(store.lrange("k", 3, 1)?.is_empty());
        assert_eq!(store.lrange("k", -100, 1)?, strings(&["x0", "x1"]));
        assert!(store.lrange("k", 5, 10)?.is_empty());
        assert!(store.lrange("k", 0, -100)?.is_empty());
        assert!(store.lrange("missing", 0, -1)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_emptied_list_is_removed() -> StoreResult<()> {
        let store = Store::new();
        store.lpush("k", &strings(&["only"]))?;
        store.expire("k", 100)?;
        store.lpop("k")?;
        assert!(!store.exists("k"));
        assert_eq!(store.ttl("k"), -2);

        // the key can now be reused as another kind
        store.set("k", "text");
        assert_eq!(store.get("k")?, Some("text".to_string()));
        Ok(())
    }

    #[test]
    fn test_push_nothing_creates_nothing() -> StoreResult<()> {
        let store = Store::new();
        assert_eq!(store.lpush("k", &[])?, 0);
        assert_eq!(store.rpush("k", &[])?, 0);
        assert!(!store.exists("k"));
        assert_eq!(store.key_type("k"), None);

        store.rpush("k", &strings(&["a", "b"]))?;
        assert_eq!(store.lpush("k", &[])?, 2);
        assert_eq!(store.lrange("k", 0, -1)?, strings(&["a", "b"]));

        store.set("s", "v");
        assert_eq!(store.rpush("s", &[]), Err(StoreError::WrongType));
        Ok(())
    }

    #[test]
    fn test_list_ops_on_string() {
        let store = Store::new();
        store.set("s", "v");
        assert_eq!(store.lpush("s", &strings(&["a"])), Err(StoreError::WrongType));
        assert_eq!(store.lpop("s"), Err(StoreError::WrongType));
        assert_eq!(store.lrange("s", 0, -1), Err(StoreError::WrongType));
        assert_eq!(store.llen("s"), Err(StoreError::WrongType));
    }

    #[test]
    fn test_lpush_on_expired_string_starts_clean() -> StoreResult<()> {
        let store = Store::new();
        store.set("k", "stale");
        store
            .lock()
            .expires
            .insert("k".into(), Instant::now() - Duration::from_millis(1));

        assert_eq!(store.lpush("k", &strings(&["a"]))?, 1);
        assert_eq!(store.lrange("k", 0, -1)?, strings(&["a"]));
        assert_eq!(store.ttl("k"), -1);
        Ok(())
    }

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range(5, 0, -1), Some((0, 4)));
        assert_eq!(clamp_range(5, -2, -1), Some((3, 4)));
        assert_eq!(clamp_range(0, 0, -1), None);
        assert_eq!(clamp_range(3, 2, 2), Some((2, 2)));
    }
}

// src/expire.rs

//! Key expiry.
//!
//! Deadlines live in a side table of the key-space (`key -> Instant`).
//! Expiry is enforced two ways:
//! - lazily: every per-key operation drops an expired key before doing anything else
//! - actively: [`Store::purge_expired`], driven by [`start_cleaner`] on a timer

use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::debug;

use crate::store::{Store, StoreError, StoreResult};

impl Store {
    /// Sets a deadline `seconds` from now. Returns `false` if the key does not exist.
    ///
    /// # Errors
    ///
    /// `InvalidExpire` if the deadline is not representable as an `Instant`.
    pub fn expire(&self, key: &str, seconds: u64) -> StoreResult<bool> {
        let deadline = Instant::now()
            .checked_add(Duration::from_secs(seconds))
            .ok_or(StoreError::InvalidExpire)?;
        let mut ks = self.lock();
        if !ks.contains(key) {
            return Ok(false);
        }
        ks.expires.insert(key.to_string(), deadline);
        Ok(true)
    }

    /// Remaining time to live in seconds.
    ///
    /// `-2` if the key is absent or expired, `-1` if it has no deadline,
    /// otherwise the remaining seconds rounded up.
    pub fn ttl(&self, key: &str) -> i64 {
        let mut ks = self.lock();
        if !ks.contains(key) {
            return -2;
        }
        match ks.expires.get(key) {
            None => -1,
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                i64::try_from(left.as_millis().div_ceil(1000)).unwrap_or(i64::MAX)
            }
        }
    }

    /// Removes the deadline of a live key. Returns `true` if one was removed.
    pub fn persist(&self, key: &str) -> bool {
        let mut ks = self.lock();
        ks.contains(key) && ks.expires.remove(key).is_some()
    }

    /// Deletes every key whose deadline has passed. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut ks = self.lock();
        let expired: Vec<String> = ks
            .expires
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            ks.remove(key);
        }
        expired.len()
    }
}

/// Background purge task
pub async fn start_cleaner(store: Store, interval_secs: u64) {
    let mut iv = interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        iv.tick().await;
        let removed = store.purge_expired();
        if removed > 0 {
            debug!(removed, "purged expired keys");
        }
    }
}

// src/types/string.rs

//! String values: SET / GET / INCR / DECR.
//!
//! - SET overwrites whatever kind the key held before
//! - GET on a list or hash is a `WrongType` error, never a silent nil
//! - INCR/DECR treat a missing key as `0` and keep the stored text untouched on failure

use crate::store::{Store, StoreError, StoreResult, Value};

impl Store {
    /// Writes `value` at `key`, replacing any previous value of any kind.
    ///
    /// A deadline that has already passed is cleared with the stale value;
    /// a still-pending deadline stays attached to the key.
    pub fn set(&self, key: &str, value: &str) {
        let mut ks = self.lock();
        ks.touch(key);
        ks.data.insert(key.to_string(), Value::Str(value.to_string()));
    }

    /// Reads a string. `Ok(None)` when the key is absent or expired.
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut ks = self.lock();
        Ok(ks.string(key)?.cloned())
    }

    /// Atomically adds 1 and returns the new value.
    pub fn incr(&self, key: &str) -> StoreResult<i64> {
        self.incr_by(key, 1)
    }

    /// Atomically subtracts 1 and returns the new value.
    pub fn decr(&self, key: &str) -> StoreResult<i64> {
        self.incr_by(key, -1)
    }

    fn incr_by(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut ks = self.lock();
        match ks.string(key)? {
            Some(current) => {
                let old = current
                    .parse::<i64>()
                    .map_err(|_| StoreError::NotInteger)?;
                let new = old.checked_add(delta).ok_or(StoreError::Overflow)?;
                *current = new.to_string();
                Ok(new)
            }
            None => {
                ks.data.insert(key.to_string(), Value::Str(delta.to_string()));
                Ok(delta)
            }
        }
    }
}

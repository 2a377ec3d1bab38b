// src/persistence.rs

//! Textual snapshots of the key-space.
//!
//! One record per line, keys in sorted order:
//!
//! ```text
//! K <key> <value>
//! L <key> <item1> <item2> ...
//! H <key> <field1>:<value1> <field2>:<value2> ...
//! ```
//!
//! Tokens are whitespace separated. A key whose name or contents would not
//! read back as written (whitespace anywhere, an empty list item, a ':' in a
//! hash field) is left out of the snapshot with a warning. Deadlines are never
//! written; a loaded store has no expiries.

use anyhow::{Context, Result};
use std::{
    collections::{HashMap, VecDeque},
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
    time::{Duration, Instant},
};
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::store::{Keyspace, Store, Value};

impl Store {
    /// Writes every live key to `sink` in snapshot format.
    ///
    /// The text is rendered under the lock and written after it is released.
    pub fn dump<W: Write>(&self, mut sink: W) -> Result<()> {
        let text = render(&self.lock());
        sink.write_all(text.as_bytes())
            .context("failed to write snapshot")?;
        sink.flush().context("failed to flush snapshot")?;
        Ok(())
    }

    /// Replaces the whole key-space with the records read from `source`.
    ///
    /// The source is parsed into a fresh key-space first; current state is only
    /// swapped out once the read succeeded.
    pub fn load<R: BufRead>(&self, source: R) -> Result<()> {
        let mut fresh = Keyspace::default();
        for (lineno, line) in source.lines().enumerate() {
            let line = line.context("failed to read snapshot")?;
            if line.trim().is_empty() {
                continue;
            }
            match parse_record(&line) {
                Some((key, value)) => {
                    fresh.data.insert(key, value);
                }
                None => warn!(line = lineno + 1, "skipping malformed snapshot record"),
            }
        }
        *self.lock() = fresh;
        Ok(())
    }
}

fn render(ks: &Keyspace) -> String {
    let now = Instant::now();
    let mut keys: Vec<&String> = ks
        .data
        .keys()
        .filter(|key| !ks.is_expired(key, now))
        .collect();
    keys.sort_unstable();

    let mut out = String::new();
    for key in keys {
        match render_record(key, &ks.data[key]) {
            Some(record) => out.push_str(&record),
            None => warn!(%key, "value cannot be written as snapshot tokens, skipping"),
        }
    }
    out
}

/// One snapshot line, or `None` if a token would not read back as written.
fn render_record(key: &str, value: &Value) -> Option<String> {
    if !is_token(key) {
        return None;
    }
    match value {
        Value::Str(s) => {
            if has_space(s) {
                return None;
            }
            Some(format!("K {} {}\n", key, s))
        }
        Value::List(list) => {
            let mut line = format!("L {}", key);
            for item in list {
                if !is_token(item) {
                    return None;
                }
                line.push(' ');
                line.push_str(item);
            }
            line.push('\n');
            Some(line)
        }
        Value::Hash(hash) => {
            let mut fields: Vec<(&String, &String)> = hash.iter().collect();
            fields.sort_unstable();
            let mut line = format!("H {}", key);
            for (field, value) in fields {
                // the first ':' separates field from value
                if has_space(field) || field.contains(':') || has_space(value) {
                    return None;
                }
                line.push_str(&format!(" {}:{}", field, value));
            }
            line.push('\n');
            Some(line)
        }
    }
}

fn has_space(s: &str) -> bool {
    s.contains(char::is_whitespace)
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !has_space(s)
}

fn parse_record(line: &str) -> Option<(String, Value)> {
    let mut tokens = line.split_whitespace();
    let tag = tokens.next()?;
    let key = tokens.next()?.to_string();
    let value = match tag {
        "K" => Value::Str(tokens.next().unwrap_or_default().to_string()),
        "L" => {
            let items: VecDeque<String> = tokens.map(str::to_string).collect();
            if items.is_empty() {
                return None;
            }
            Value::List(items)
        }
        "H" => {
            let fields: HashMap<String, String> = tokens
                .filter_map(|pair| pair.split_once(':'))
                .map(|(f, v)| (f.to_string(), v.to_string()))
                .collect();
            if fields.is_empty() {
                return None;
            }
            Value::Hash(fields)
        }
        _ => return None,
    };
    Some((key, value))
}

/// Dumps `store` to `path` through a temporary file and an atomic rename.
pub fn save(store: &Store, path: &Path) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let mut f = File::create(&tmp)
        .with_context(|| format!("failed to create snapshot file {:?}", tmp))?;
    store.dump(&mut f)?;
    f.sync_all()?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to move snapshot into place at {:?}", path))?;
    Ok(())
}

/// Loads `path` into `store`. Returns `Ok(false)` when there is no snapshot yet.
pub fn restore(store: &Store, path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    let f = File::open(path).with_context(|| format!("failed to open snapshot {:?}", path))?;
    store.load(BufReader::new(f))?;
    Ok(true)
}

/// Periodic snapshot task
pub async fn start_snapshotter(store: Store, path: std::path::PathBuf, interval_secs: u64) {
    let mut iv = interval(Duration::from_secs(interval_secs.max(1)));
    // the first tick completes immediately
    iv.tick().await;
    loop {
        iv.tick().await;
        match save(&store, &path) {
            Ok(()) => info!(path = %path.display(), keys = store.len(), "snapshot saved"),
            Err(e) => error!("snapshot failed: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dump_format() -> Result<()> {
        let store = Store::new();
        store.set("s", "v");
        store.rpush("l", &strings(&["a", "b"]))?;
        store.hset("h", "f2", "2")?;
        store.hset("h", "f1", "1")?;

        let mut out = Vec::new();
        store.dump(&mut out)?;
        assert_eq!(String::from_utf8(out)?, "H h f1:1 f2:2\nL l a b\nK s v\n");
        Ok(())
    }

    #[test]
    fn test_round_trip() -> Result<()> {
        let store = Store::new();
        store.set("name", "cinder");
        store.set("n", "42");
        store.lpush("queue", &strings(&["a", "b", "c"]))?;
        store.hset("user:1", "name", "alice")?;
        store.hset("user:1", "url", "http://x")?;
        store.expire("name", 100)?;

        let mut snapshot = Vec::new();
        store.dump(&mut snapshot)?;

        let fresh = Store::new();
        fresh.load(Cursor::new(snapshot))?;

        assert_eq!(fresh.get("name")?, Some("cinder".to_string()));
        assert_eq!(fresh.get("n")?, Some("42".to_string()));
        assert_eq!(fresh.lrange("queue", 0, -1)?, strings(&["c", "b", "a"]));
        // only the first ':' separates field from value
        assert_eq!(fresh.hget("user:1", "url")?, Some("http://x".to_string()));
        assert_eq!(fresh.hlen("user:1")?, 2);
        assert_eq!(fresh.ttl("name"), -1);
        assert_eq!(fresh.keys("*"), store.keys("*"));
        Ok(())
    }

    #[test]
    fn test_load_replaces_state() -> Result<()> {
        let store = Store::new();
        store.set("old", "1");
        store.expire("old", 100)?;

        store.load(Cursor::new("K new 2\n"))?;
        assert!(!store.exists("old"));
        assert_eq!(store.get("new")?, Some("2".to_string()));
        assert!(store.lock().expires.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_skips_malformed_lines() -> Result<()> {
        let store = Store::new();
        store.load(Cursor::new("X what\nK\n\nL empty\nK ok yes\nH h nocolon\n"))?;
        assert_eq!(store.keys("*"), vec!["ok"]);
        Ok(())
    }

    #[test]
    fn test_dump_skips_values_that_cannot_round_trip() -> Result<()> {
        let store = Store::new();
        store.set("k", "v\nK evil 1");
        store.set("spaced key", "v");
        store.rpush("l", &strings(&["a", ""]))?;
        store.hset("h", "a:b", "1")?;
        store.hset("h2", "f", "two words")?;
        store.set("ok", "fine");
        store.hset("url", "home", "http://x")?;

        let mut snapshot = Vec::new();
        store.dump(&mut snapshot)?;
        assert_eq!(String::from_utf8(snapshot.clone())?, "K ok fine\nH url home:http://x\n");

        let fresh = Store::new();
        fresh.load(Cursor::new(snapshot))?;
        assert_eq!(fresh.keys("*"), vec!["ok", "url"]);
        assert!(!fresh.exists("evil"));
        Ok(())
    }

    #[test]
    fn test_dump_skips_expired() -> Result<()> {
        let store = Store::new();
        store.set("gone", "1");
        store
            .lock()
            .expires
            .insert("gone".into(), Instant::now() - Duration::from_millis(1));
        let mut out = Vec::new();
        store.dump(&mut out)?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn test_save_and_restore_file() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("dump.cinder");

        let store = Store::new();
        assert!(!restore(&store, &path)?);

        store.set("k", "v");
        save(&store, &path)?;
        assert!(!path.with_extension("tmp").exists());

        let fresh = Store::new();
        assert!(restore(&fresh, &path)?);
        assert_eq!(fresh.get("k")?, Some("v".to_string()));
        Ok(())
    }

    #[test]
    fn test_save_to_missing_dir_fails() {
        let store = Store::new();
        let res = save(&store, Path::new("/nonexistent-dir/for/cinder/dump"));
        assert!(res.is_err());
    }
}

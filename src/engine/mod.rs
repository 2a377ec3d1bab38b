// src/engine/mod.rs

//! # Engine
//!
//! Connects the wire protocol to the store:
//! - takes an already tokenized command (`Vec<String>`), or a raw request buffer via [`process`]
//! - checks the command name and its minimum argument count
//! - runs the matching [`Store`] operation
//! - turns the result, or the store error, into a [`Reply`]
//!
//! Nothing here locks anything; every operation relies on the store's own lock.

use tracing::debug;

use crate::protocol::{Reply, parse_command};
use crate::store::{Store, StoreError, StoreResult};

/// Known commands and their minimum argument count, command name included.
const COMMANDS: &[(&str, usize)] = &[
    ("PING", 1),
    ("ECHO", 2),
    ("QUIT", 1),
    // strings
    ("SET", 3),
    ("GET", 2),
    ("INCR", 2),
    ("DECR", 2),
    // generic
    ("DEL", 2),
    ("EXISTS", 2),
    ("TYPE", 2),
    ("KEYS", 2),
    ("DBSIZE", 1),
    ("FLUSHALL", 1),
    // lists
    ("LPUSH", 3),
    ("RPUSH", 3),
    ("LPOP", 2),
    ("RPOP", 2),
    ("LRANGE", 4),
    ("LLEN", 2),
    // hashes
    ("HSET", 4),
    ("HGET", 3),
    ("HDEL", 3),
    ("HGETALL", 2),
    ("HKEYS", 2),
    ("HVALS", 2),
    ("HLEN", 2),
    // expiry
    ("EXPIRE", 3),
    ("TTL", 2),
    ("PERSIST", 2),
];

fn min_args(cmd: &str) -> Option<usize> {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == cmd)
        .map(|(_, arity)| *arity)
}

/// Result of handling one raw request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub reply: Reply,
    /// The client asked to close the connection once the reply is flushed.
    pub close: bool,
}

/// Parses one request buffer, executes it, and reports whether the
/// connection should be closed afterwards.
pub fn process(input: &[u8], store: &Store) -> Response {
    let parts = parse_command(input);
    let close = is_quit(&parts);
    Response {
        reply: execute(parts, store),
        close,
    }
}

/// True when the tokenized command is QUIT.
pub fn is_quit(parts: &[String]) -> bool {
    parts
        .first()
        .is_some_and(|cmd| cmd.eq_ignore_ascii_case("QUIT"))
}

/// Executes a single tokenized command against `store`.
///
/// Never fails: usage mistakes and store errors come back as error replies.
pub fn execute(parts: Vec<String>, store: &Store) -> Reply {
    let Some(name) = parts.first() else {
        return Reply::error("empty command");
    };
    let cmd = name.to_uppercase();

    let Some(min) = min_args(&cmd) else {
        return Reply::error(format!("unknown command '{}'", name));
    };
    if parts.len() < min {
        return Reply::error(format!(
            "wrong number of arguments for '{}' command",
            cmd.to_lowercase()
        ));
    }

    debug!(command = %cmd, args = parts.len() - 1, "executing command");
    dispatch(&cmd, &parts, store).unwrap_or_else(Reply::error)
}

fn dispatch(cmd: &str, parts: &[String], store: &Store) -> StoreResult<Reply> {
    let reply = match cmd {
        // --- Connection commands ---
        "PING" => match parts.get(1) {
            Some(msg) => Reply::bulk(msg.as_str()),
            None => Reply::Simple("PONG".to_string()),
        },
        "ECHO" => Reply::bulk(parts[1].as_str()),
        // the transport closes the connection after flushing this
        "QUIT" => Reply::ok(),

        // --- String commands ---
        "SET" => {
            store.set(&parts[1], &parts[2]);
            Reply::ok()
        }
        "GET" => Reply::Bulk(store.get(&parts[1])?),
        "INCR" => Reply::Integer(store.incr(&parts[1])?),
        "DECR" => Reply::Integer(store.decr(&parts[1])?),

        // --- Generic commands ---
        "DEL" => Reply::Integer(count(&parts[1..], |key| store.del(key))),
        "EXISTS" => Reply::Integer(count(&parts[1..], |key| store.exists(key))),
        "TYPE" => Reply::Simple(
            store
                .key_type(&parts[1])
                .map_or("none", |kind| kind.as_str())
                .to_string(),
        ),
        "KEYS" => Reply::Array(store.keys(&parts[1])),
        "DBSIZE" => Reply::Integer(store.len() as i64),
        "FLUSHALL" => {
            store.flush_all();
            Reply::ok()
        }

        // --- List commands ---
        "LPUSH" => Reply::Integer(store.lpush(&parts[1], &parts[2..])? as i64),
        "RPUSH" => Reply::Integer(store.rpush(&parts[1], &parts[2..])? as i64),
        "LPOP" => Reply::Bulk(store.lpop(&parts[1])?),
        "RPOP" => Reply::Bulk(store.rpop(&parts[1])?),
        "LRANGE" => {
            let start = parse_int(&parts[2])?;
            let stop = parse_int(&parts[3])?;
            Reply::Array(store.lrange(&parts[1], start, stop)?)
        }
        "LLEN" => Reply::Integer(store.llen(&parts[1])? as i64),

        // --- Hash commands ---
        "HSET" => Reply::from_bool(store.hset(&parts[1], &parts[2], &parts[3])?),
        "HGET" => Reply::Bulk(store.hget(&parts[1], &parts[2])?),
        "HDEL" => Reply::from_bool(store.hdel(&parts[1], &parts[2])?),
        "HGETALL" => Reply::Array(
            store
                .hgetall(&parts[1])?
                .into_iter()
                .flat_map(|(field, value)| [field, value])
                .collect(),
        ),
        "HKEYS" => Reply::Array(store.hkeys(&parts[1])?),
        "HVALS" => Reply::Array(store.hvals(&parts[1])?),
        "HLEN" => Reply::Integer(store.hlen(&parts[1])? as i64),

        // --- Expiration commands ---
        "EXPIRE" => {
            let secs = parts[2]
                .parse::<u64>()
                .map_err(|_| StoreError::NotInteger)?;
            Reply::from_bool(store.expire(&parts[1], secs)?)
        }
        "TTL" => Reply::Integer(store.ttl(&parts[1])),
        "PERSIST" => Reply::from_bool(store.persist(&parts[1])),

        other => Reply::error(format!("unknown command '{}'", other)),
    };
    Ok(reply)
}

fn parse_int(arg: &str) -> StoreResult<i64> {
    arg.parse::<i64>().map_err(|_| StoreError::NotInteger)
}

fn count(keys: &[String], mut hit: impl FnMut(&str) -> bool) -> i64 {
    keys.iter().filter(|key| hit(key)).count() as i64
}

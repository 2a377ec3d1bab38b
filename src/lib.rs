// src/lib.rs
//! cinder: store / types / expire / persistence / protocol / engine / server

pub mod config;      // JSON settings
pub mod engine;      // command dispatch
pub mod expire;      // deadlines, lazy + active expiry
pub mod logging;     // tracing setup
pub mod pattern;     // KEYS glob matching
pub mod persistence; // snapshot dump / load
pub mod protocol;    // request parsing, reply encoding
pub mod server;      // TCP transport
pub mod store;       // shared key-space
pub mod types;       // String / List / Hash operations

pub use engine::{Response, execute, process};
pub use protocol::Reply;
pub use store::{Kind, Store, StoreError};

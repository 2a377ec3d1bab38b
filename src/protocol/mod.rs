// src/protocol/mod.rs
//! Wire protocol: request tokenizing and reply encoding.

pub mod parser;
pub mod reply;

pub use parser::{frame_length, parse_command};
pub use reply::Reply;

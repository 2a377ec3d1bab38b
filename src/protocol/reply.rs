// src/protocol/reply.rs

//! RESP reply frames.

use std::fmt;

/// A reply ready to be encoded for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `+<status>\r\n`
    Simple(String),
    /// `:<n>\r\n`
    Integer(i64),
    /// `$<len>\r\n<bytes>\r\n`, or `$-1\r\n` for nil
    Bulk(Option<String>),
    /// `*<n>\r\n` followed by one bulk string per element
    Array(Vec<String>),
    /// `-ERR <message>\r\n`
    Error(String),
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Simple("OK".to_string())
    }

    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    pub fn bulk(s: impl Into<String>) -> Self {
        Reply::Bulk(Some(s.into()))
    }

    /// Error reply; `message` is the text after the `ERR ` prefix.
    pub fn error(message: impl fmt::Display) -> Self {
        Reply::Error(message.to_string())
    }

    pub fn from_bool(flag: bool) -> Self {
        Reply::Integer(i64::from(flag))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Appends the wire encoding of this reply to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Reply::Simple(s) => {
                out.push(b'+');
                out.extend_from_slice(s.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Integer(n) => {
                out.push(b':');
                out.extend_from_slice(n.to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
            }
            Reply::Bulk(Some(s)) => encode_bulk(s, out),
            Reply::Bulk(None) => out.extend_from_slice(b"$-1\r\n"),
            Reply::Array(items) => {
                out.push(b'*');
                out.extend_from_slice(items.len().to_string().as_bytes());
                out.extend_from_slice(b"\r\n");
                for item in items {
                    encode_bulk(item, out);
                }
            }
            Reply::Error(message) => {
                out.extend_from_slice(b"-ERR ");
                out.extend_from_slice(message.as_bytes());
                out.extend_from_slice(b"\r\n");
            }
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }
}

fn encode_bulk(s: &str, out: &mut Vec<u8>) {
    out.push(b'$');
    out.extend_from_slice(s.len().to_string().as_bytes());
    out.extend_from_slice(b"\r\n");
    out.extend_from_slice(s.as_bytes());
    out.extend_from_slice(b"\r\n");
}

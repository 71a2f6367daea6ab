//! Reply definitions
//!
//! Replies from the upstream, and helpers that turn them into typed values
//! where `None` stands for a cache miss.

use std::fmt;

use bytes::Bytes;

use crate::error::{PipeError, Result};

use super::bitmap::bit_indices;

/// Coarse shape of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Nil,
    Scalar,
    Multi,
    Error,
}

/// A single reply from the upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Null bulk or null array
    Nil,

    /// +OK / +PONG style status line
    Status(String),

    /// :123
    Integer(i64),

    /// $... binary-safe bulk string
    Bulk(Bytes),

    /// *... ordered sub-replies
    Array(Vec<Reply>),

    /// -ERR ... command-level failure
    Error(String),
}

impl Reply {
    pub fn kind(&self) -> ReplyKind {
        match self {
            Reply::Nil => ReplyKind::Nil,
            Reply::Status(_) | Reply::Integer(_) | Reply::Bulk(_) => ReplyKind::Scalar,
            Reply::Array(_) => ReplyKind::Multi,
            Reply::Error(_) => ReplyKind::Error,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// The error message, if this is an error reply
    pub fn error(&self) -> Option<&str> {
        match self {
            Reply::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Raw bytes of a scalar reply
    pub fn into_bytes(self) -> Result<Option<Bytes>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Bulk(data) => Ok(Some(data)),
            Reply::Status(text) => Ok(Some(Bytes::from(text))),
            Reply::Integer(value) => Ok(Some(Bytes::from(value.to_string()))),
            other => Err(other.unexpected("scalar")),
        }
    }

    /// UTF-8 text of a scalar reply
    pub fn into_string(self) -> Result<Option<String>> {
        match self.into_bytes()? {
            Some(data) => String::from_utf8(data.to_vec())
                .map(Some)
                .map_err(|_| PipeError::Protocol("reply is not valid UTF-8".to_string())),
            None => Ok(None),
        }
    }

    /// Integer value; bulk strings holding digits are parsed
    pub fn into_i64(self) -> Result<Option<i64>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Integer(value) => Ok(Some(value)),
            Reply::Bulk(data) => parse_i64(&data).map(Some),
            other => Err(other.unexpected("integer")),
        }
    }

    /// Boolean from an integer reply (non-zero is true) or an OK status
    pub fn into_bool(self) -> Result<Option<bool>> {
        match self {
            Reply::Nil => Ok(None),
            Reply::Integer(value) => Ok(Some(value != 0)),
            Reply::Status(ref text) if text == "OK" => Ok(Some(true)),
            other => Err(other.unexpected("integer or OK")),
        }
    }

    /// Element-wise bytes of a multi reply (MGET, HMGET)
    pub fn into_bytes_list(self) -> Result<Vec<Option<Bytes>>> {
        match self {
            Reply::Nil => Ok(Vec::new()),
            Reply::Array(items) => items.into_iter().map(Reply::into_bytes).collect(),
            other => Err(other.unexpected("array")),
        }
    }

    /// Element-wise integers of a multi reply
    pub fn into_i64_list(self) -> Result<Vec<Option<i64>>> {
        match self {
            Reply::Nil => Ok(Vec::new()),
            Reply::Array(items) => items.into_iter().map(Reply::into_i64).collect(),
            other => Err(other.unexpected("array")),
        }
    }

    /// Positions of set bits in a bitmap value (GET on a SETBIT key)
    pub fn into_bit_indices(self) -> Result<Option<Vec<u64>>> {
        Ok(self.into_bytes()?.map(|data| bit_indices(&data)))
    }

    fn unexpected(self, expected: &'static str) -> PipeError {
        match self {
            Reply::Error(message) => PipeError::Server(message),
            other => PipeError::UnexpectedReply {
                expected,
                actual: other.to_string(),
            },
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Nil => write!(f, "nil"),
            Reply::Status(text) => write!(f, "status '{}'", text),
            Reply::Integer(value) => write!(f, "integer {}", value),
            Reply::Bulk(data) => write!(f, "bulk of {} bytes", data.len()),
            Reply::Array(items) => write!(f, "array of {} replies", items.len()),
            Reply::Error(message) => write!(f, "error '{}'", message),
        }
    }
}

fn parse_i64(data: &[u8]) -> Result<i64> {
    std::str::from_utf8(data)
        .ok()
        .and_then(|text| text.parse().ok())
        .ok_or_else(|| PipeError::UnexpectedReply {
            expected: "integer",
            actual: format!("bulk '{}'", String::from_utf8_lossy(data)),
        })
}

//! Command factories
//!
//! Typed constructors for the supported commands. Argument encoding:
//! - keys, fields and values: raw bytes
//! - integers: decimal text
//! - durations: whole seconds, truncated
//! - bit states: `"1"` or `"0"`

use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use super::BatchCommand;

/// Operator for `BITOP`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    And,
    Or,
    Xor,
    Not,
}

impl BitOp {
    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            BitOp::And => "AND",
            BitOp::Or => "OR",
            BitOp::Xor => "XOR",
            BitOp::Not => "NOT",
        }
    }
}

impl fmt::Display for BitOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn bytes_arg(value: impl AsRef<[u8]>) -> Bytes {
    Bytes::copy_from_slice(value.as_ref())
}

fn int_arg(value: impl ToString) -> Bytes {
    Bytes::from(value.to_string())
}

fn seconds_arg(duration: Duration) -> Bytes {
    int_arg(duration.as_secs())
}

fn bit_arg(state: bool) -> Bytes {
    Bytes::from_static(if state { b"1" } else { b"0" })
}

fn with_list<I>(mut args: Vec<Bytes>, items: I) -> Vec<Bytes>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    args.extend(items.into_iter().map(bytes_arg));
    args
}

impl BatchCommand {
    // =========================================================================
    // Keys
    // =========================================================================

    /// `EXISTS key`
    pub fn exists(key: impl AsRef<[u8]>) -> Self {
        Self::new("EXISTS", vec![bytes_arg(key)])
    }

    /// `EXPIRE key seconds`
    pub fn expire(key: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self::new("EXPIRE", vec![bytes_arg(key), seconds_arg(ttl)])
    }

    /// `DEL key [key ...]`
    pub fn del<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::new("DEL", with_list(Vec::new(), keys))
    }

    // =========================================================================
    // Strings
    // =========================================================================

    /// `GET key`
    pub fn get(key: impl AsRef<[u8]>) -> Self {
        Self::new("GET", vec![bytes_arg(key)])
    }

    /// `SET key value`
    pub fn set(key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        Self::new("SET", vec![bytes_arg(key), bytes_arg(value)])
    }

    /// `SETEX key seconds value`
    pub fn set_with_expiry(key: impl AsRef<[u8]>, value: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self::new(
            "SETEX",
            vec![bytes_arg(key), seconds_arg(ttl), bytes_arg(value)],
        )
    }

    /// `MGET key [key ...]`
    pub fn mget<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::new("MGET", with_list(Vec::new(), keys))
    }

    // =========================================================================
    // Hashes
    // =========================================================================

    /// `HGET key field`
    pub fn hget(key: impl AsRef<[u8]>, field: impl AsRef<[u8]>) -> Self {
        Self::new("HGET", vec![bytes_arg(key), bytes_arg(field)])
    }

    /// `HSET key field value`
    pub fn hset(key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        Self::new(
            "HSET",
            vec![bytes_arg(key), bytes_arg(field), bytes_arg(value)],
        )
    }

    /// `HMGET key field [field ...]`
    pub fn hmget<I>(key: impl AsRef<[u8]>, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::new("HMGET", with_list(vec![bytes_arg(key)], fields))
    }

    /// `HMSET key field value [field value ...]`
    pub fn hmset<I, F, V>(key: impl AsRef<[u8]>, pairs: I) -> Self
    where
        I: IntoIterator<Item = (F, V)>,
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        let mut args = vec![bytes_arg(key)];
        for (field, value) in pairs {
            args.push(bytes_arg(field));
            args.push(bytes_arg(value));
        }
        Self::new("HMSET", args)
    }

    /// `HGETALL key`
    pub fn hgetall(key: impl AsRef<[u8]>) -> Self {
        Self::new("HGETALL", vec![bytes_arg(key)])
    }

    /// `HINCRBY key field delta`
    pub fn hincrby(key: impl AsRef<[u8]>, field: impl AsRef<[u8]>, delta: i64) -> Self {
        Self::new(
            "HINCRBY",
            vec![bytes_arg(key), bytes_arg(field), int_arg(delta)],
        )
    }

    /// `HDEL key field [field ...]`
    pub fn hdel<I>(key: impl AsRef<[u8]>, fields: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        Self::new("HDEL", with_list(vec![bytes_arg(key)], fields))
    }

    // =========================================================================
    // Bitmaps
    // =========================================================================

    /// `BITOP op dest src [src ...]`
    pub fn bitop<I>(op: BitOp, dest: impl AsRef<[u8]>, sources: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        let args = vec![Bytes::from_static(op.as_str().as_bytes()), bytes_arg(dest)];
        Self::new("BITOP", with_list(args, sources))
    }

    /// `GETBIT key offset`
    pub fn getbit(key: impl AsRef<[u8]>, offset: u64) -> Self {
        Self::new("GETBIT", vec![bytes_arg(key), int_arg(offset)])
    }

    /// `SETBIT key offset 1|0`
    pub fn setbit(key: impl AsRef<[u8]>, offset: u64, state: bool) -> Self {
        Self::new(
            "SETBIT",
            vec![bytes_arg(key), int_arg(offset), bit_arg(state)],
        )
    }

    /// `BITCOUNT key`
    pub fn bitcount(key: impl AsRef<[u8]>) -> Self {
        Self::new("BITCOUNT", vec![bytes_arg(key)])
    }
}

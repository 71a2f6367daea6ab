//! Connection Module
//!
//! The capability the pool and batch layers are written against, plus one
//! concrete RESP2-over-TCP implementation.
//!
//! ## Responsibilities
//! - Define the minimal method set the core calls (`Connection`, `Connect`)
//! - Model upstream replies and decode them into present/absent values
//! - Frame commands and parse replies (RESP2)
//!
//! ## Pipelining
//! ```text
//!   enqueue(A) ─┐
//!   enqueue(B) ─┼──► one write ──► upstream ──► replies A, B, C
//!   enqueue(C) ─┘                               │
//!   next_reply() ◄── A ◄────────────────────────┘
//!   next_reply() ◄── B
//!   next_reply() ◄── C
//! ```

mod bitmap;
mod reply;
mod resp;
mod tcp;

use std::time::Duration;

use bytes::Bytes;

use crate::error::Result;

pub use bitmap::{bit_indices, bit_location};
pub use reply::{Reply, ReplyKind};
pub use resp::{read_reply, write_command};
pub use tcp::TcpConnection;

/// A handle able to run named commands against one upstream
///
/// A connection is owned by exactly one pool slot, checkout or batch worker
/// at a time; implementations need `Send` but not `Sync`.
pub trait Connection: Send {
    /// Run a single command and wait for its reply
    fn execute(&mut self, name: &str, args: &[Bytes]) -> Result<Reply>;

    /// Queue a command for sending without waiting for its reply
    fn enqueue(&mut self, name: &str, args: &[Bytes]) -> Result<()>;

    /// Read the reply to the oldest enqueued command
    fn next_reply(&mut self) -> Result<Reply>;

    /// Commands enqueued whose replies have not been read yet
    fn pending(&self) -> usize;

    /// Dial the upstream (if needed) and verify it answers
    fn open(&mut self) -> Result<()>;

    /// True once dialed and until closed
    fn is_open(&self) -> bool;

    /// True after `close` or a fatal I/O failure
    fn is_closed(&self) -> bool;

    /// Release the underlying transport; later calls fail
    fn close(&mut self) -> Result<()>;

    /// A fresh, independent handle to the same upstream
    fn try_clone(&self) -> Result<Self>
    where
        Self: Sized;
}

/// Constructs a connection record for an address without doing any I/O
pub trait Connect: Connection + Sized {
    fn connect_to(addr: &str, timeout: Duration) -> Self;
}

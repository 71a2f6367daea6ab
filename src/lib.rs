//! # pipepool
//!
//! Connection infrastructure for cache/datastore clients:
//! - A fixed-capacity, non-blocking pool of reusable connections
//! - An asynchronous batch dispatcher that pipelines many small commands
//!   through a fixed set of worker threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────┐        ┌──────────────────────────────┐
//! │    Synchronous callers   │        │     Asynchronous callers      │
//! └────────────┬─────────────┘        └──────────────┬───────────────┘
//!              │ pop / push                          │ run_async
//! ┌────────────▼─────────────┐        ┌──────────────▼───────────────┐
//! │      ConnectionPool      │        │          BatchQueue           │
//! │  (ResourcePool + cursor) │        │  (bounded channel + workers)  │
//! └────────────┬─────────────┘        └──────────────┬───────────────┘
//!              │                                     │ one owned
//!              │ BatchCommandSet::execute            │ connection each
//! ┌────────────▼─────────────────────────────────────▼───────────────┐
//! │                    Connection (trait)                             │
//! │          TcpConnection: RESP2 over blocking TCP                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod connection;
pub mod pool;
pub mod batch;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PipeError, Result};
pub use config::{InitializationMode, PoolConfig, QueueConfig};
pub use connection::{Connect, Connection, Reply, TcpConnection};
pub use pool::{ConnectionPool, ResourcePool};
pub use batch::{BatchCommand, BatchCommandSet, BatchQueue};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pipepool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

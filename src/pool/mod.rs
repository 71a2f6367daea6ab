//! Pool Module
//!
//! Fixed-capacity pooling of connection handles.
//!
//! ## Layers
//! - `ResourcePool<T>`: generic, lock-free freelist filled once by a factory
//! - `ConnectionPool<C>`: opens/closes a `ResourcePool` of connections from a
//!   `PoolConfig`, maps exhaustion to `NoConnectionsAvailable`
//!
//! Neither layer ever blocks: an empty pool is reported immediately and the
//! caller decides whether to back off and retry.

mod address;
mod connection_pool;
mod resource;

pub use address::AddressCycle;
pub use connection_pool::{ConnectionPool, PooledConnection};
pub use resource::ResourcePool;

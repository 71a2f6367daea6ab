//! Connection Pool
//!
//! Opens, lends out and closes a fixed set of connections to one or more
//! upstream addresses.

use std::ops::{Deref, DerefMut};

use parking_lot::{Mutex, RwLock};

use crate::batch::BatchCommandSet;
use crate::config::{InitializationMode, PoolConfig};
use crate::connection::Connect;
use crate::error::{PipeError, Result};

use super::{AddressCycle, ResourcePool};

/// State that exists only while the pool is open
struct OpenPool<C> {
    connections: ResourcePool<C>,

    /// Rotation used for the initial fill and for replacing dead connections
    cursor: Mutex<AddressCycle>,
}

/// Pool of connections built from a [`PoolConfig`]
///
/// ## Concurrency:
/// - `state`: RwLock held for reading by `pop`/`push`, for writing only by
///   `open`/`close`
/// - Checkout and return are lock-free underneath (`ResourcePool`)
/// - All methods use `&self`
pub struct ConnectionPool<C> {
    config: PoolConfig,
    state: RwLock<Option<OpenPool<C>>>,
}

impl<C: Connect> ConnectionPool<C> {
    /// Create a closed pool
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.state.read().is_some()
    }

    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    /// Build all connections
    ///
    /// Addresses are assigned round-robin. In aggressive mode each connection
    /// is dialed and probed; the first failure closes that connection and
    /// aborts the open.
    pub fn open(&self) -> Result<()> {
        self.config.validate()?;

        let mut state = self.state.write();
        if state.is_some() {
            return Err(PipeError::PoolAlreadyOpen);
        }

        let timeout = self.config.effective_timeout();
        let mode = self.config.init_mode;
        let mut cursor = AddressCycle::new(self.config.addresses.clone())?;

        let connections = ResourcePool::create(self.config.capacity, || {
            let addr = cursor.next_address();
            let mut conn = C::connect_to(addr, timeout);
            if mode == InitializationMode::Aggressive {
                if let Err(e) = conn.open() {
                    tracing::warn!("Liveness probe to {} failed: {}", addr, e);
                    let _ = conn.close();
                    return Err(e);
                }
            }
            Ok(conn)
        })?;

        tracing::info!(
            "Opened connection pool: {} connections over {} address(es), mode={}",
            connections.size(),
            cursor.len(),
            mode
        );

        *state = Some(OpenPool {
            connections,
            cursor: Mutex::new(cursor),
        });
        Ok(())
    }

    /// Close every available connection and discard the pool
    ///
    /// Connections checked out at this point are closed when pushed back.
    pub fn close(&self) {
        let Some(open) = self.state.write().take() else {
            return;
        };

        let capacity = open.connections.size();
        let mut closed = 0;
        while let Some(mut conn) = open.connections.acquire() {
            if let Err(e) = conn.close() {
                tracing::warn!("Error closing pooled connection: {}", e);
            }
            closed += 1;
        }

        tracing::info!("Closed connection pool ({} of {} connections idle)", closed, capacity);
    }

    /// Take a connection without blocking
    pub fn pop(&self) -> Result<C> {
        let state = self.state.read();
        let open = state.as_ref().ok_or(PipeError::PoolClosed)?;
        open.connections
            .acquire()
            .ok_or(PipeError::NoConnectionsAvailable)
    }

    /// Return a connection taken with `pop`
    ///
    /// A connection that has been closed (by the caller or by an I/O
    /// failure), or that still owes replies to pipelined commands, is
    /// replaced with a fresh, undialed one for the next address.
    pub fn push(&self, mut conn: C) {
        let state = self.state.read();
        let Some(open) = state.as_ref() else {
            tracing::debug!("Pool closed; closing returned connection");
            let _ = conn.close();
            return;
        };

        if !conn.is_closed() && conn.pending() > 0 {
            tracing::warn!(
                "Connection returned with {} unread replies; replacing it",
                conn.pending()
            );
            let _ = conn.close();
        }

        if conn.is_closed() {
            let mut cursor = open.cursor.lock();
            conn = C::connect_to(cursor.next_address(), self.config.effective_timeout());
        }

        if let Err(mut surplus) = open.connections.release(conn) {
            tracing::warn!("Connection pushed to a full pool; closing it");
            let _ = surplus.close();
        }
    }

    /// Check out a connection that returns itself to the pool on drop
    pub fn get(&self) -> Result<PooledConnection<'_, C>> {
        let conn = self.pop()?;
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    /// Run a command set synchronously on a pooled connection
    pub fn execute_batch(&self, commands: &mut BatchCommandSet) -> Result<()> {
        let mut conn = self.get()?;
        commands.execute(&mut *conn)
    }

    /// Fixed capacity (0 while closed)
    pub fn size(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map_or(0, |open| open.connections.size())
    }

    /// Connections currently available (0 while closed)
    pub fn len(&self) -> usize {
        self.state
            .read()
            .as_ref()
            .map_or(0, |open| open.connections.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII checkout from a [`ConnectionPool`]
pub struct PooledConnection<'a, C: Connect> {
    pool: &'a ConnectionPool<C>,
    conn: Option<C>,
}

impl<C: Connect> PooledConnection<'_, C> {
    /// Keep the connection instead of returning it to the pool
    pub fn detach(mut self) -> C {
        self.conn.take().expect("connection present until drop")
    }
}

impl<C: Connect> Deref for PooledConnection<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn.as_ref().expect("connection present until drop")
    }
}

impl<C: Connect> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn.as_mut().expect("connection present until drop")
    }
}

impl<C: Connect> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.push(conn);
        }
    }
}

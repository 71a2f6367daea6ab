//! Configuration for pipepool
//!
//! Centralized configuration for connection pools and batch queues, with
//! sensible defaults and consuming builders.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{PipeError, Result};

/// Timeout applied when a pool config leaves it unset (zero)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// How pooled connections are prepared when a pool is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitializationMode {
    /// Construct the connection record only; no network I/O until first use
    #[default]
    Lazy,

    /// Construct, dial and probe liveness; a failed probe aborts the open
    Aggressive,
}

impl fmt::Display for InitializationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitializationMode::Lazy => write!(f, "lazy"),
            InitializationMode::Aggressive => write!(f, "aggressive"),
        }
    }
}

impl FromStr for InitializationMode {
    type Err = PipeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(InitializationMode::Lazy),
            "aggressive" => Ok(InitializationMode::Aggressive),
            other => Err(PipeError::Config(format!(
                "unknown initialization mode '{}'",
                other
            ))),
        }
    }
}

// =============================================================================
// Connection Pool Configuration
// =============================================================================

/// Configuration for a [`ConnectionPool`](crate::pool::ConnectionPool)
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of connections held by the pool
    pub capacity: usize,

    /// Upstream addresses (host:port), assigned to connections round-robin
    pub addresses: Vec<String>,

    /// Connect/read/write timeout; zero means [`DEFAULT_TIMEOUT`]
    pub timeout: Duration,

    /// Lazy or aggressive connection setup
    pub init_mode: InitializationMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity: 8,
            addresses: vec!["127.0.0.1:6379".to_string()],
            timeout: DEFAULT_TIMEOUT,
            init_mode: InitializationMode::Lazy,
        }
    }
}

impl PoolConfig {
    /// Create a new config builder
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::default()
    }

    /// Timeout to use for connections, substituting the default for zero
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Check the pool parameters
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(PipeError::Config(
                "pool capacity must be greater than zero".to_string(),
            ));
        }
        if self.addresses.is_empty() {
            return Err(PipeError::Config(
                "pool needs at least one upstream address".to_string(),
            ));
        }
        if let Some(blank) = self.addresses.iter().position(|a| a.trim().is_empty()) {
            return Err(PipeError::Config(format!(
                "upstream address at index {} is blank",
                blank
            )));
        }
        Ok(())
    }
}

/// Builder for PoolConfig
#[derive(Default)]
pub struct PoolConfigBuilder {
    config: PoolConfig,
}

impl PoolConfigBuilder {
    /// Set the pool capacity
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Replace the upstream address list
    pub fn addresses<I, S>(mut self, addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.addresses = addresses.into_iter().map(Into::into).collect();
        self
    }

    /// Set the connection timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the initialization mode
    pub fn init_mode(mut self, mode: InitializationMode) -> Self {
        self.config.init_mode = mode;
        self
    }

    pub fn build(self) -> PoolConfig {
        self.config
    }
}

// =============================================================================
// Batch Queue Configuration
// =============================================================================

/// Sizing for a [`BatchQueue`](crate::batch::BatchQueue)
///
/// Must satisfy `queue_size >= workers > 0` and `batch_size > 0`; checked
/// when the queue is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Capacity of the bounded command queue
    pub queue_size: usize,

    /// Number of worker threads, each with its own connection
    pub workers: usize,

    /// Maximum commands pipelined per worker round trip
    pub batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_size: 1024,
            workers: 4,
            batch_size: 32,
        }
    }
}

impl QueueConfig {
    /// Create a new config builder
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::default()
    }

    /// Check the sizing, reporting the first violated constraint
    pub fn validate(&self) -> Result<()> {
        if self.queue_size == 0 {
            return Err(PipeError::ZeroQueueSize);
        }
        if self.workers == 0 {
            return Err(PipeError::ZeroWorkers);
        }
        if self.batch_size == 0 {
            return Err(PipeError::ZeroBatchSize);
        }
        if self.queue_size < self.workers {
            return Err(PipeError::QueueSmallerThanWorkers {
                queue_size: self.queue_size,
                workers: self.workers,
            });
        }
        Ok(())
    }
}

/// Builder for QueueConfig
#[derive(Default)]
pub struct QueueConfigBuilder {
    config: QueueConfig,
}

impl QueueConfigBuilder {
    /// Set the queue capacity
    pub fn queue_size(mut self, size: usize) -> Self {
        self.config.queue_size = size;
        self
    }

    /// Set the number of workers
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set the per-worker batch size
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    pub fn build(self) -> QueueConfig {
        self.config
    }
}

//! Error types for pipepool
//!
//! Provides a unified error type for pooling, batching and connection I/O.

use thiserror::Error;

/// Result type alias using PipeError
pub type Result<T> = std::result::Result<T, PipeError>;

/// Unified error type for pipepool operations
#[derive(Debug, Error)]
pub enum PipeError {
    // -------------------------------------------------------------------------
    // Upstream I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection is closed")]
    ConnectionClosed,

    /// The upstream answered a command with an error reply
    #[error("Server error: {0}")]
    Server(String),

    #[error("Unexpected reply: expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: String,
    },

    // -------------------------------------------------------------------------
    // Pool Errors
    // -------------------------------------------------------------------------
    #[error("No connections available")]
    NoConnectionsAvailable,

    #[error("Connection pool is closed")]
    PoolClosed,

    #[error("Connection pool is already open")]
    PoolAlreadyOpen,

    // -------------------------------------------------------------------------
    // Batch Queue Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Batch queue is already open")]
    QueueAlreadyOpen,

    #[error("Batch queue has no logger")]
    MissingLogger,

    #[error("Batch queue has no connection")]
    MissingConnection,

    #[error("Batch queue size must be greater than zero")]
    ZeroQueueSize,

    #[error("Batch queue worker count must be greater than zero")]
    ZeroWorkers,

    #[error("Batch queue batch size must be greater than zero")]
    ZeroBatchSize,

    #[error("Batch queue size {queue_size} is smaller than worker count {workers}")]
    QueueSmallerThanWorkers { queue_size: usize, workers: usize },

    // -------------------------------------------------------------------------
    // Submission Errors
    // -------------------------------------------------------------------------
    #[error("Batch queue is closed")]
    QueueClosed,

    #[error("Empty command at index {index}")]
    EmptyCommand { index: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipeError {
    /// True for failures that leave the connection unusable
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            PipeError::Io(_) | PipeError::Protocol(_) | PipeError::ConnectionClosed
        )
    }
}

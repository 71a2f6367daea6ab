//! Batch Queue
//!
//! Bounded, closeable queue of commands drained by a fixed set of workers.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use tracing::Dispatch;

use crate::config::QueueConfig;
use crate::connection::Connection;
use crate::error::{PipeError, Result};

use super::{BatchCommand, BatchWorker};

/// Channel and workers of an open queue
struct Running {
    sender: Sender<BatchCommand>,
    workers: Vec<JoinHandle<()>>,
}

/// Fire-and-forget dispatcher of pipelined commands
///
/// ## Lifecycle
/// ```text
///   new() ──► Closed ──open()──► Open ──close()──► Closed
///                 ▲                                   │
///                 └───────────── open() ──────────────┘
/// ```
///
/// ## Concurrency:
/// - Producers share one bounded MPMC channel with `workers` consumers
/// - Each worker owns a connection cloned from the seed connection
/// - `run_async` blocks while the channel is full; that is the only
///   backpressure
/// - `state` lock is held only to start, stop or clone the sender, never
///   across a blocking send
pub struct BatchQueue<C> {
    config: QueueConfig,

    /// Installed as the default subscriber on every worker thread
    logger: Option<Dispatch>,

    /// Template cloned once per worker; never used for I/O itself
    connection: Option<C>,

    state: Mutex<Option<Running>>,
}

impl<C> BatchQueue<C> {
    /// Create a closed queue with the given sizing
    pub fn new(config: QueueConfig) -> Self {
        Self {
            config,
            logger: None,
            connection: None,
            state: Mutex::new(None),
        }
    }

    /// Set the logger used by worker threads
    pub fn with_logger(mut self, logger: Dispatch) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Use the calling thread's current default subscriber as the logger
    ///
    /// This always sets a logger, so `open` never reports `MissingLogger`
    /// afterwards. With no subscriber installed the captured dispatcher is
    /// the no-op one and worker output is discarded; install a subscriber
    /// first, or pass one explicitly with [`with_logger`](Self::with_logger).
    pub fn with_current_logger(self) -> Self {
        let logger = tracing::dispatcher::get_default(|dispatch| dispatch.clone());
        self.with_logger(logger)
    }

    /// Set the seed connection cloned for each worker
    pub fn with_connection(mut self, connection: C) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Commands queued and not yet picked up by a worker
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .as_ref()
            .map_or(0, |running| running.sender.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting commands and wait for the workers to finish
    ///
    /// Commands already queued are still executed. Each worker closes its
    /// own connection once its loop ends, so `close` returns only after
    /// every connection is closed. Closing a closed queue does nothing.
    pub fn close(&self) {
        let Some(running) = self.state.lock().take() else {
            return;
        };

        let Running { sender, workers } = running;
        drop(sender);

        let count = workers.len();
        for handle in workers {
            if handle.join().is_err() {
                tracing::error!("Batch worker panicked before shutdown");
            }
        }

        tracing::info!("Batch queue closed ({} workers stopped)", count);
    }
}

impl<C: Connection + 'static> BatchQueue<C> {
    /// Validate the configuration and start the workers
    ///
    /// Fails without side effects on the first of: already open, no logger,
    /// no connection, zero queue size, zero workers, zero batch size, queue
    /// smaller than the worker count. If a worker cannot be started, the
    /// workers already running are stopped and the error returned.
    pub fn open(&self) -> Result<()> {
        let mut state = self.state.lock();
        if state.is_some() {
            return Err(PipeError::QueueAlreadyOpen);
        }
        let logger = self.logger.as_ref().ok_or(PipeError::MissingLogger)?;
        let seed = self.connection.as_ref().ok_or(PipeError::MissingConnection)?;
        self.config.validate()?;

        let (sender, receiver) = channel::bounded(self.config.queue_size);
        let mut workers = Vec::with_capacity(self.config.workers);

        for id in 0..self.config.workers {
            let started = seed.try_clone().and_then(|conn| {
                let worker = BatchWorker::new(id, self.config.batch_size, conn, receiver.clone());
                let dispatch = logger.clone();
                thread::Builder::new()
                    .name(format!("batch-worker-{}", id))
                    .spawn(move || tracing::dispatcher::with_default(&dispatch, || worker.run()))
                    .map_err(PipeError::from)
            });

            match started {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    tracing::error!("Failed to start batch worker {}: {}", id, e);
                    drop(sender);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Batch queue opened: queue_size={}, workers={}, batch_size={}",
            self.config.queue_size,
            self.config.workers,
            self.config.batch_size
        );

        *state = Some(Running { sender, workers });
        Ok(())
    }

    /// Submit commands for asynchronous execution
    ///
    /// All-or-nothing validation: if any command is empty, none are queued.
    /// Blocks while the queue is full. Outcomes are logged by the workers,
    /// not reported back.
    pub fn run_async<I>(&self, commands: I) -> Result<()>
    where
        I: IntoIterator<Item = BatchCommand>,
    {
        let sender = self
            .state
            .lock()
            .as_ref()
            .map(|running| running.sender.clone())
            .ok_or(PipeError::QueueClosed)?;

        let commands: Vec<BatchCommand> = commands.into_iter().collect();
        if let Some(index) = commands.iter().position(BatchCommand::is_empty) {
            return Err(PipeError::EmptyCommand { index });
        }

        for command in commands {
            sender.send(command).map_err(|_| PipeError::QueueClosed)?;
        }
        Ok(())
    }
}

impl<C> Drop for BatchQueue<C> {
    fn drop(&mut self) {
        self.close();
    }
}

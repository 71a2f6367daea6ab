//! Batch Worker
//!
//! Drains the shared queue in pipelined batches over one owned connection.

use crossbeam::channel::{Receiver, TryRecvError};

use crate::connection::Connection;

use super::{execute_batch, BatchCommand};

/// A long-lived consumer of the batch queue
///
/// ## Batch assembly
/// ```text
///   recv()      blocks for the first command (or observes closure)
///   try_recv()  × up to batch_size-1, stops at empty or closed
///   execute     one pipelined round trip
/// ```
/// The worker never waits for a second command; it only folds in commands
/// that are already queued.
pub struct BatchWorker<C> {
    id: usize,
    batch_size: usize,

    /// Exclusively owned; replaced when found closed, closed on exit
    connection: C,

    inbox: Receiver<BatchCommand>,
}

impl<C: Connection> BatchWorker<C> {
    pub fn new(id: usize, batch_size: usize, connection: C, inbox: Receiver<BatchCommand>) -> Self {
        Self {
            id,
            batch_size: batch_size.max(1),
            connection,
            inbox,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Run until the queue is closed and drained, then close the connection
    ///
    /// Commands already taken off the queue are always executed, including
    /// the batch collected when closure is observed.
    pub fn run(mut self) {
        tracing::debug!("Batch worker {} started", self.id);

        let mut batches = 0u64;
        loop {
            let (mut batch, closed) = self.pop_batch();
            if !batch.is_empty() {
                self.execute(&mut batch);
                batches += 1;
            }
            if closed {
                break;
            }
        }

        if let Err(e) = self.connection.close() {
            tracing::warn!("Batch worker {} failed to close connection: {}", self.id, e);
        }
        tracing::debug!("Batch worker {} stopped after {} batches", self.id, batches);
    }

    /// Collect the next batch; the flag reports that the queue is closed
    fn pop_batch(&self) -> (Vec<BatchCommand>, bool) {
        let first = match self.inbox.recv() {
            Ok(command) => command,
            Err(_) => return (Vec::new(), true),
        };

        let mut batch = Vec::with_capacity(self.batch_size);
        batch.push(first);

        while batch.len() < self.batch_size {
            match self.inbox.try_recv() {
                Ok(command) => batch.push(command),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return (batch, true),
            }
        }

        (batch, false)
    }

    /// Swap a closed connection for a fresh clone before the next batch
    ///
    /// Only the transport is replaced; commands of the batch that lost the
    /// old connection are not sent again.
    fn reconnect_if_closed(&mut self) {
        if !self.connection.is_closed() {
            return;
        }
        match self.connection.try_clone() {
            Ok(fresh) => {
                tracing::info!("Batch worker {}: replacing closed connection", self.id);
                self.connection = fresh;
            }
            Err(e) => tracing::warn!("Batch worker {}: reconnect failed: {}", self.id, e),
        }
    }

    fn execute(&mut self, batch: &mut [BatchCommand]) {
        self.reconnect_if_closed();
        let result = execute_batch(batch, &mut self.connection);

        for command in batch.iter() {
            match command.reply() {
                Some(reply) => match reply.error() {
                    Some(message) => tracing::error!(
                        "Batch worker {}: command {} failed: {}",
                        self.id,
                        command.name(),
                        message
                    ),
                    None => tracing::info!(
                        "Batch worker {}: command {} succeeded",
                        self.id,
                        command.name()
                    ),
                },
                None => tracing::error!(
                    "Batch worker {}: command {} not executed",
                    self.id,
                    command.name()
                ),
            }
        }

        if let Err(e) = result {
            tracing::error!(
                "Batch worker {}: batch of {} aborted: {}",
                self.id,
                batch.len(),
                e
            );
        }
    }
}

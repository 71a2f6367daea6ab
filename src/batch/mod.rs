//! Batch Module
//!
//! Pipelined execution of many small commands.
//!
//! ## Two ways in
//! - Synchronous: build a `BatchCommandSet` and `execute` it on a connection;
//!   replies are read back onto the commands in submission order
//! - Asynchronous: `BatchQueue::run_async` hands commands to worker threads
//!   that pipeline whatever is queued, up to `batch_size` per round trip
//!
//! ```text
//!   producers ──run_async──► [ bounded channel ] ──► worker 0 ──► conn 0
//!                                               ├──► worker 1 ──► conn 1
//!                                               └──► worker N ──► conn N
//! ```
//!
//! Batches are pipelines, not transactions: there is no atomicity across
//! commands, and no ordering across `run_async` calls once more than one
//! worker is running.

mod command;
mod commands;
mod queue;
mod set;
mod worker;

pub use command::BatchCommand;
pub use commands::BitOp;
pub use queue::BatchQueue;
pub use set::{execute_batch, BatchCommandSet};
pub use worker::BatchWorker;

//! Command sets and pipelined execution

use crate::connection::Connection;
use crate::error::{PipeError, Result};

use super::BatchCommand;

/// Pipeline `commands` over `conn`: send all, then read all replies in order
///
/// The i-th reply is stored on the i-th command. A connection-level failure
/// stops execution and is returned; commands after the failure keep no
/// reply. Error replies to individual commands are stored on those commands
/// and do not affect their neighbours.
///
/// A connection that still owes replies to earlier commands is refused
/// before anything is sent.
pub fn execute_batch<C>(commands: &mut [BatchCommand], conn: &mut C) -> Result<()>
where
    C: Connection + ?Sized,
{
    let unread = conn.pending();
    if unread > 0 {
        return Err(PipeError::Protocol(format!(
            "{} pipelined replies unread before batch",
            unread
        )));
    }

    for command in commands.iter() {
        conn.enqueue(command.name(), command.args())?;
    }

    for command in commands.iter_mut() {
        let reply = conn.next_reply()?;
        command.set_reply(reply);
    }

    Ok(())
}

/// An ordered group of commands executed in one round trip
#[derive(Debug, Default)]
pub struct BatchCommandSet {
    commands: Vec<BatchCommand>,
}

impl BatchCommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    /// Append a command; returns its index
    pub fn push(&mut self, command: BatchCommand) -> usize {
        self.commands.push(command);
        self.commands.len() - 1
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BatchCommand> {
        self.commands.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BatchCommand> {
        self.commands.iter()
    }

    /// Pipeline every command over `conn`, see [`execute_batch`]
    pub fn execute<C>(&mut self, conn: &mut C) -> Result<()>
    where
        C: Connection + ?Sized,
    {
        execute_batch(&mut self.commands, conn)
    }

    pub fn into_commands(self) -> Vec<BatchCommand> {
        self.commands
    }
}

impl From<Vec<BatchCommand>> for BatchCommandSet {
    fn from(commands: Vec<BatchCommand>) -> Self {
        Self { commands }
    }
}

impl FromIterator<BatchCommand> for BatchCommandSet {
    fn from_iter<I: IntoIterator<Item = BatchCommand>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BatchCommandSet {
    type Item = BatchCommand;
    type IntoIter = std::vec::IntoIter<BatchCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl std::ops::Index<usize> for BatchCommandSet {
    type Output = BatchCommand;

    fn index(&self, index: usize) -> &BatchCommand {
        &self.commands[index]
    }
}

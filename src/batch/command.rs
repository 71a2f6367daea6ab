//! Command definitions
//!
//! One remote command and, once executed, its reply.

use std::fmt;

use bytes::Bytes;

use crate::connection::Reply;

/// A single command bound for a pipeline
///
/// Built by one of the named factories (`BatchCommand::get`, `hincrby`, ...)
/// or by [`BatchCommand::new`]. Its reply is written once, during execution;
/// commands are not `Clone` and are never re-executed.
pub struct BatchCommand {
    /// Protocol command name, passed through unchecked
    name: String,

    /// Positional arguments in wire order
    args: Vec<Bytes>,

    reply: Option<Reply>,
}

impl BatchCommand {
    /// Create a command from a raw name and arguments
    pub fn new(name: impl Into<String>, args: Vec<Bytes>) -> Self {
        Self {
            name: name.into(),
            args,
            reply: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Bytes] {
        &self.args
    }

    /// A command with no name cannot be sent
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// The reply, once the command has been executed
    pub fn reply(&self) -> Option<&Reply> {
        self.reply.as_ref()
    }

    /// Move the reply out, leaving the command unexecuted-looking
    pub fn take_reply(&mut self) -> Option<Reply> {
        self.reply.take()
    }

    pub fn is_executed(&self) -> bool {
        self.reply.is_some()
    }

    /// The command-level error message, if the upstream rejected it
    pub fn error(&self) -> Option<&str> {
        self.reply.as_ref().and_then(Reply::error)
    }

    pub(crate) fn set_reply(&mut self, reply: Reply) {
        debug_assert!(self.reply.is_none(), "reply set twice for {}", self.name);
        self.reply = Some(reply);
    }
}

impl fmt::Debug for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchCommand")
            .field("name", &self.name)
            .field("args", &self.args.len())
            .field("reply", &self.reply)
            .finish()
    }
}

impl fmt::Display for BatchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for arg in &self.args {
            write!(f, " {}", String::from_utf8_lossy(arg))?;
        }
        Ok(())
    }
}

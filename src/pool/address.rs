//! Round-robin address cursor

use crate::error::{PipeError, Result};

/// Cycles through a fixed list of upstream addresses
///
/// Each pool owns its own cursor, so opening several pools over the same
/// address list gives each one a fresh rotation starting at the first entry.
#[derive(Debug, Clone)]
pub struct AddressCycle {
    addresses: Vec<String>,
    next: usize,
}

impl AddressCycle {
    /// Create a cursor; the list must not be empty
    pub fn new(addresses: Vec<String>) -> Result<Self> {
        if addresses.is_empty() {
            return Err(PipeError::Config(
                "address list must not be empty".to_string(),
            ));
        }
        Ok(Self { addresses, next: 0 })
    }

    /// The next address in rotation
    pub fn next_address(&mut self) -> &str {
        let idx = self.next;
        self.next = (self.next + 1) % self.addresses.len();
        &self.addresses[idx]
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }
}

//! Resource pool
//!
//! Fixed-capacity freelist filled eagerly by a factory.

use crossbeam::queue::ArrayQueue;

use crate::error::Result;

/// Fixed-capacity, non-blocking pool of reusable values
///
/// ## Invariants
/// - `0 <= len() <= size()` at all times
/// - `acquire` and `release` never block
/// - Values are opaque; an "absent" value such as `Option::None` is stored
///   and returned like any other, and is distinct from `acquire` returning
///   `None` for an empty pool
pub struct ResourcePool<T> {
    /// Fixed capacity
    capacity: usize,

    /// Available values; `None` for a zero-capacity pool
    available: Option<ArrayQueue<T>>,
}

impl<T> ResourcePool<T> {
    /// Build a pool holding `size` values from `factory`
    ///
    /// The factory is called exactly `size` times, in order. The first error
    /// aborts construction; values made so far are dropped with the partial
    /// pool.
    pub fn create<F>(size: usize, mut factory: F) -> Result<Self>
    where
        F: FnMut() -> Result<T>,
    {
        let available = if size == 0 {
            None
        } else {
            let queue = ArrayQueue::new(size);
            for _ in 0..size {
                if queue.push(factory()?).is_err() {
                    unreachable!("pool of {} filled past capacity", size);
                }
            }
            Some(queue)
        };

        Ok(Self {
            capacity: size,
            available,
        })
    }

    /// Take any available value, or `None` if all are checked out
    pub fn acquire(&self) -> Option<T> {
        self.available.as_ref().and_then(ArrayQueue::pop)
    }

    /// Return a value to the pool
    ///
    /// Hands the value back if the pool is already full, which only happens
    /// when a caller releases a value twice or one it never acquired.
    pub fn release(&self, item: T) -> std::result::Result<(), T> {
        match &self.available {
            Some(queue) => queue.push(item),
            None => Err(item),
        }
    }

    /// Fixed capacity
    pub fn size(&self) -> usize {
        self.capacity
    }

    /// Number of values currently available
    pub fn len(&self) -> usize {
        self.available.as_ref().map_or(0, ArrayQueue::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("capacity", &self.capacity)
            .field("available", &self.len())
            .finish()
    }
}

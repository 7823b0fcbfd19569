use crate::config::DEFAULT_BATCH_SIZE;
use crate::models::Person;

/// Fixed-capacity, ordered buffer of rows waiting to be flushed.
///
/// The backing allocation is reused across flushes. At most
/// `DEFAULT_BATCH_SIZE` rows are reserved up front; larger batches grow on
/// demand, so an oversized capacity costs nothing until rows arrive.
#[derive(Debug)]
pub struct Batch {
    rows: Vec<Person>,
    capacity: usize,
}

impl Batch {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            rows: Vec::with_capacity(capacity.min(DEFAULT_BATCH_SIZE)),
            capacity,
        }
    }

    /// Append a row. Returns `true` once the batch is full and must be flushed.
    pub fn push(&mut self, person: Person) -> bool {
        debug_assert!(!self.is_full(), "batch pushed past capacity");
        self.rows.push(person);
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn as_slice(&self) -> &[Person] {
        &self.rows
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

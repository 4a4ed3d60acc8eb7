//! Report and log buffers
//!
//! Two independent, unbounded, append-only FIFO queues accumulate
//! normalized entries until a flush drains them. A drain is a destructive
//! swap-and-clear performed under the buffer's lock, so an entry is never
//! part of two batches and an entry pushed after the swap lands in the
//! next generation of the buffer.

use std::sync::{Mutex, MutexGuard, PoisonError};

use enlight_core::domain::{LogEntry, Report};

/// One FIFO buffer of canonical entries
#[derive(Debug)]
pub struct EntryBuffer<T> {
    entries: Mutex<Vec<T>>,
}

impl<T> EntryBuffer<T> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Appends `entry` and returns the new buffer length
    pub fn push(&self, entry: T) -> usize {
        let mut entries = self.lock();
        entries.push(entry);
        entries.len()
    }

    /// Detaches every buffered entry, leaving the buffer empty
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave the Vec half-written,
    // so a poisoned buffer is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for EntryBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The report buffer and the log buffer, flushed independently
#[derive(Debug, Default)]
pub struct DualBuffer {
    pub reports: EntryBuffer<Report>,
    pub logs: EntryBuffer<LogEntry>,
}

impl DualBuffer {
    pub fn new() -> Self {
        Self::default()
    }
}

//! Remote Iterator
//!
//! Replays server-side batches locally, fetching the next batch only when
//! the buffered one is used up.

use std::collections::VecDeque;
use std::sync::Weak;

use crate::batch::KeyValue;
use crate::error::{KvError, Result};

use super::database::Inner;

/// Cursor over a range of a remote database
pub struct RemoteIterator {
    id: u64,
    db: Weak<Inner>,
    buffer: VecDeque<KeyValue>,
    /// The server reported the end; it has already dropped the iterator
    exhausted: bool,
}

impl RemoteIterator {
    pub(crate) fn new(id: u64, db: Weak<Inner>) -> Self {
        Self {
            id,
            db,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    /// Server-side iterator id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next entry, or `None` once the range is exhausted
    ///
    /// Fails with `DatabaseClosed` if the owning handle was closed or dropped.
    pub fn next_entry(&mut self) -> Result<Option<KeyValue>> {
        if let Some(kv) = self.buffer.pop_front() {
            return Ok(Some(kv));
        }
        if self.exhausted {
            return Ok(None);
        }

        let db = self.db.upgrade().ok_or(KvError::DatabaseClosed)?;
        match db.next_batch(self.id)? {
            Some(batch) if !batch.is_empty() => {
                self.buffer = batch.into();
                Ok(self.buffer.pop_front())
            }
            _ => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

impl Iterator for RemoteIterator {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

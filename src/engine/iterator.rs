//! Engine Iterator
//!
//! Ordered cursor over `[lower, upper)` at a fixed sequence number.

use std::ops::Bound;

use crate::batch::KeyValue;

use super::snapshot::Snapshot;

/// Where the next scan starts
enum Cursor {
    /// Inclusive lower bound, nothing returned yet
    Start(Vec<u8>),
    /// Strictly after the last returned key
    After(Vec<u8>),
    Done,
}

/// Iterator over engine entries in ascending key order
///
/// Each step re-seeks the memtable from the last returned key, so no lock is
/// held between calls. Live iterators carry an implicit snapshot taken at
/// creation, which keeps their view stable across pagination.
pub struct EngineIterator {
    snapshot: Snapshot,
    upper: Vec<u8>,
    cursor: Cursor,
}

impl EngineIterator {
    pub(crate) fn new(snapshot: Snapshot, lower: &[u8], upper: &[u8]) -> Self {
        Self {
            snapshot,
            upper: upper.to_vec(),
            cursor: Cursor::Start(lower.to_vec()),
        }
    }

    /// Sequence number this iterator reads at
    pub fn sequence(&self) -> u64 {
        self.snapshot.sequence()
    }
}

impl Iterator for EngineIterator {
    type Item = KeyValue;

    fn next(&mut self) -> Option<Self::Item> {
        let from = match &self.cursor {
            Cursor::Start(lower) => Bound::Included(lower.as_slice()),
            Cursor::After(last) => Bound::Excluded(last.as_slice()),
            Cursor::Done => return None,
        };

        let found = self
            .snapshot
            .memtable()
            .next_after(from, &self.upper, self.snapshot.sequence());

        self.cursor = match &found {
            Some(kv) => Cursor::After(kv.key.clone()),
            None => Cursor::Done,
        };
        found
    }
}

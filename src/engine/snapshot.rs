//! Engine Snapshots
//!
//! A snapshot pins a sequence number. While it lives, the memtable keeps
//! every version it can see.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use crate::memtable::MemTable;

use super::iterator::EngineIterator;

/// Sequence numbers pinned by live snapshots, with a count per sequence
#[derive(Default)]
pub(crate) struct SnapshotList {
    pinned: Mutex<BTreeMap<u64, usize>>,
}

impl SnapshotList {
    /// Lock the pin table; writers hold this while publishing a batch
    pub(crate) fn lock(&self) -> MutexGuard<'_, BTreeMap<u64, usize>> {
        self.pinned.lock()
    }

    pub(crate) fn len(&self) -> usize {
        self.pinned.lock().values().sum()
    }
}

/// Immutable point-in-time view of an engine
pub struct Snapshot {
    seq: u64,
    memtable: Arc<MemTable>,
    list: Arc<SnapshotList>,
}

impl Snapshot {
    /// Pin `seq`; the caller must hold `pinned` so no writer can publish
    /// in between reading the sequence and registering it
    pub(crate) fn pin(
        seq: u64,
        memtable: Arc<MemTable>,
        list: Arc<SnapshotList>,
        pinned: &mut BTreeMap<u64, usize>,
    ) -> Self {
        *pinned.entry(seq).or_insert(0) += 1;
        Self {
            seq,
            memtable,
            list,
        }
    }

    /// Get the snapshot's sequence number
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.seq
    }

    /// Read a key as of this snapshot
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.memtable.get(key, self.seq)
    }

    /// Iterate `[lower, upper)` as of this snapshot (empty `upper` = unbounded)
    pub fn lookup(&self, lower: &[u8], upper: &[u8]) -> EngineIterator {
        EngineIterator::new(self.clone(), lower, upper)
    }

    pub(crate) fn memtable(&self) -> &MemTable {
        &self.memtable
    }
}

impl Clone for Snapshot {
    fn clone(&self) -> Self {
        let mut pinned = self.list.lock();
        Snapshot::pin(
            self.seq,
            Arc::clone(&self.memtable),
            Arc::clone(&self.list),
            &mut pinned,
        )
    }
}

impl Drop for Snapshot {
    fn drop(&mut self) {
        let mut pinned = self.list.lock();
        if let Some(count) = pinned.get_mut(&self.seq) {
            *count -= 1;
            if *count == 0 {
                pinned.remove(&self.seq);
            }
        }
    }
}

//! MemTable implementation
//!
//! BTreeMap-based versioned memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::batch::KeyValue;

use super::Version;

/// In-memory table of versioned entries
pub struct MemTable {
    data: RwLock<BTreeMap<Vec<u8>, Vec<Version>>>,

    /// Approximate size in bytes of all retained keys and versions
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Apply a batch of puts at sequence `seq` (write lock)
    ///
    /// `live` lists the sequence numbers pinned by open snapshots. Older
    /// versions that none of them can see are dropped. Returns the new
    /// approximate size.
    pub fn apply(&self, entries: Vec<KeyValue>, seq: u64, live: &[u64]) -> usize {
        let mut data = self.data.write();
        let mut added = 0usize;
        let mut removed = 0usize;

        for KeyValue { key, value } in entries {
            let key_len = key.len();
            let versions = data.entry(key).or_insert_with(|| {
                added += key_len;
                Vec::new()
            });

            added += value.len();
            match versions.last_mut() {
                // Same batch wrote this key earlier: last put wins
                Some(last) if last.seq == seq => {
                    removed += last.value.len();
                    last.value = value;
                }
                _ => versions.push(Version { seq, value }),
            }

            removed += prune(versions, live);
        }

        let prev = self.size.load(Ordering::Relaxed);
        let new_size = (prev + added).saturating_sub(removed);
        self.size.store(new_size, Ordering::Relaxed);
        new_size
    }

    /// Get the value of `key` visible at sequence `seq` (read lock)
    pub fn get(&self, key: &[u8], seq: u64) -> Option<Vec<u8>> {
        let data = self.data.read();
        data.get(key)
            .and_then(|versions| visible(versions, seq))
            .map(|v| v.value.clone())
    }

    /// Find the first entry visible at `seq` whose key lies after `from`
    /// and strictly below `upper` (an empty `upper` is unbounded)
    pub fn next_after(&self, from: Bound<&[u8]>, upper: &[u8], seq: u64) -> Option<KeyValue> {
        let data = self.data.read();

        for (key, versions) in data.range::<[u8], _>((from, Bound::Unbounded)) {
            if !upper.is_empty() && key.as_slice() >= upper {
                return None;
            }
            if let Some(version) = visible(versions, seq) {
                return Some(KeyValue::new(key.clone(), version.value.clone()));
            }
        }

        None
    }

    /// Number of versions retained for `key`
    pub fn version_count(&self, key: &[u8]) -> usize {
        self.data.read().get(key).map(Vec::len).unwrap_or(0)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// Get the number of distinct keys
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the newest version plus any version some live snapshot still sees
fn prune(versions: &mut Vec<Version>, live: &[u64]) -> usize {
    let successors: Vec<u64> = versions.iter().skip(1).map(|v| v.seq).collect();
    let newest = versions.len().saturating_sub(1);
    let mut removed = 0;
    let mut idx = 0;

    versions.retain(|v| {
        let i = idx;
        idx += 1;
        let keep = i == newest
            || live.iter().any(|&s| v.seq <= s && s < successors[i]);
        if !keep {
            removed += v.value.len();
        }
        keep
    });

    removed
}

fn visible(versions: &[Version], seq: u64) -> Option<&Version> {
    versions.iter().rev().find(|v| v.seq <= seq)
}

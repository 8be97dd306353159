//! Engine Module
//!
//! The storage engine behind one on-disk database.
//!
//! ## Responsibilities
//! - Recover the database from its WAL on open
//! - Apply puts and write batches atomically
//! - Serve point reads, range iterators and snapshots
//! - Close and destroy on-disk state
//!
//! The rest of the crate only uses the narrow surface exposed here:
//! `open`, `get`, `put`, `write`, `lookup`, `snapshot`, `close`, `destroy`.

mod iterator;
mod snapshot;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::batch::{KeyValue, WriteBatch};
use crate::config::WalSyncStrategy;
use crate::error::{KvError, Result};
use crate::memtable::MemTable;
use crate::wal::{Operation, WalRecovery, WalWriter};

pub use iterator::EngineIterator;
pub use snapshot::Snapshot;

use snapshot::SnapshotList;

/// Options used when opening an engine
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Create the database directory if it does not exist
    pub create_if_missing: bool,

    pub sync: WalSyncStrategy,
}

/// The storage engine for one database
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/write): serialized by the `wal` mutex. Each batch is
///   logged, applied to the memtable at a fresh sequence number, then
///   published through `sequence`.
/// - **Reads** (get/lookup): read the published sequence and consult the
///   memtable under its read lock; never blocked by the WAL.
/// - **Snapshots**: registration and batch publication both hold the
///   snapshot list lock, so a new snapshot never misses a pruned version.
pub struct Engine {
    /// Database directory
    path: PathBuf,

    /// Write-ahead log (exclusive access serializes writers)
    wal: Mutex<WalWriter>,

    /// In-memory versioned table
    memtable: Arc<MemTable>,

    /// Last published sequence number
    sequence: AtomicU64,

    /// Sequence numbers pinned by live snapshots and iterators
    snapshots: Arc<SnapshotList>,

    closed: AtomicBool,
}

impl Engine {
    const WAL_FILENAME: &'static str = "wal.log";

    /// Open (or create) the database stored in `path`
    ///
    /// On startup:
    /// 1. Check or create the database directory
    /// 2. Recover committed batches from the WAL
    /// 3. Reopen the WAL for appending
    pub fn open(path: &Path, options: EngineOptions) -> Result<Self> {
        if !path.exists() {
            if !options.create_if_missing {
                return Err(KvError::DatabaseNotFound);
            }
            fs::create_dir_all(path)?;
        } else if !path.is_dir() {
            return Err(KvError::Corrupted(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let wal_path = path.join(Self::WAL_FILENAME);
        let memtable = MemTable::new();
        let mut last_lsn = 0;

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.was_truncated {
                tracing::debug!(
                    "WAL recovery for {}: {} entries, last_lsn={}, truncated={}",
                    path.display(),
                    recovery.entries_recovered,
                    recovery.last_lsn,
                    recovery.was_truncated
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Batch(kvs) => {
                        memtable.apply(kvs, entry.lsn, &[]);
                    }
                }
            }
            last_lsn = recovery.last_lsn;
        }

        let wal = WalWriter::open(&wal_path, options.sync, last_lsn)?;

        Ok(Self {
            path: path.to_path_buf(),
            wal: Mutex::new(wal),
            memtable: Arc::new(memtable),
            sequence: AtomicU64::new(last_lsn),
            snapshots: Arc::new(SnapshotList::default()),
            closed: AtomicBool::new(false),
        })
    }

    /// Delete the database stored in `path`
    pub fn destroy(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(KvError::DatabaseNotFound);
        }
        fs::remove_dir_all(path)?;
        Ok(())
    }

    /// Get the current value of a key
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        Ok(self.memtable.get(key, self.sequence.load(Ordering::Acquire)))
    }

    /// Put a key-value pair
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write(vec![KeyValue::new(key, value)].into())
    }

    /// Apply a batch of puts atomically
    ///
    /// Steps:
    /// 1. Acquire the WAL (serializes writers)
    /// 2. Log the whole batch as one record
    /// 3. Apply it to the memtable at the record's LSN
    /// 4. Publish the new sequence number
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(());
        }

        let mut wal = self.wal.lock();
        let entries = batch.into_entries();
        let seq = wal.append(Operation::Batch(entries.clone()))?;

        let pinned = self.snapshots.lock();
        let live: Vec<u64> = pinned.keys().copied().collect();
        self.memtable.apply(entries, seq, &live);
        self.sequence.store(seq, Ordering::Release);

        Ok(())
    }

    /// Iterate `[lower, upper)` over the current state (empty `upper` = unbounded)
    pub fn lookup(&self, lower: &[u8], upper: &[u8]) -> Result<EngineIterator> {
        Ok(self.snapshot()?.lookup(lower, upper))
    }

    /// Take a point-in-time snapshot
    pub fn snapshot(&self) -> Result<Snapshot> {
        self.ensure_open()?;

        let mut pinned = self.snapshots.lock();
        let seq = self.sequence.load(Ordering::Acquire);
        Ok(Snapshot::pin(
            seq,
            Arc::clone(&self.memtable),
            Arc::clone(&self.snapshots),
            &mut pinned,
        ))
    }

    /// Close the engine
    ///
    /// Syncs the WAL. Every later call fails with `DatabaseClosed`,
    /// including a second `close`.
    pub fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(KvError::DatabaseClosed);
        }
        self.wal.lock().sync()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::DatabaseClosed);
        }
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Last published sequence number
    pub fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::Acquire)
    }

    /// Number of live snapshots, including those held by iterators
    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Number of versions retained for `key`
    pub fn version_count(&self, key: &[u8]) -> usize {
        self.memtable.version_count(key)
    }

    /// Get the memtable entry count
    pub fn entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }
}

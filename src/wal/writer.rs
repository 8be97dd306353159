//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::Path;

use crate::config::WalSyncStrategy;
use crate::error::{KvError, Result};

use super::{Operation, WalEntry};

/// Writes entries to the WAL file
pub struct WalWriter {
    writer: BufWriter<File>,
    /// LSN assigned to the most recent append
    current_lsn: u64,
    /// File length up to the end of the last complete record
    committed_len: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries appended since the last fsync
    unsynced: usize,
    /// A failed append could not be rolled back; the log refuses writes
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file for appending
    ///
    /// `last_lsn` is the highest LSN already on disk (0 for a fresh log).
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy, last_lsn: u64) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let committed_len = file.metadata()?.len();

        Ok(Self {
            writer: BufWriter::new(file),
            current_lsn: last_lsn,
            committed_len,
            sync_strategy,
            unsynced: 0,
            poisoned: false,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    ///
    /// The record is flushed to the OS before returning; fsync follows the
    /// configured strategy. A failed append leaves no bytes of its record
    /// in the log and does not consume an LSN.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        self.ensure_usable()?;

        let lsn = self.current_lsn + 1;
        let record = WalEntry::new(lsn, operation).encode()?;

        if let Err(e) = self.write_record(&record) {
            self.rollback();
            return Err(e);
        }

        self.current_lsn = lsn;
        self.committed_len += record.len() as u64;
        Ok(lsn)
    }

    fn write_record(&mut self, record: &[u8]) -> Result<()> {
        self.writer.write_all(record)?;
        self.writer.flush()?;
        self.unsynced += 1;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced >= count.max(1),
        };
        if due {
            self.sync()?;
        }
        Ok(())
    }

    /// Drop whatever part of the failed record is buffered or on disk
    fn rollback(&mut self) {
        let reset = self.writer.get_ref().try_clone().and_then(|file| {
            file.set_len(self.committed_len)?;
            Ok(file)
        });

        match reset {
            Ok(file) => {
                // Discard the buffered bytes without flushing them
                let failed = std::mem::replace(&mut self.writer, BufWriter::new(file));
                let _ = failed.into_parts();
            }
            Err(e) => {
                tracing::error!("WAL rollback to {} bytes failed: {}", self.committed_len, e);
                self.poisoned = true;
            }
        }
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.ensure_usable()?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(KvError::Io(io::Error::new(
                ErrorKind::Other,
                "WAL is unusable after a failed append",
            )));
        }
        Ok(())
    }
}

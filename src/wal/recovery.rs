//! WAL Recovery
//!
//! Handles crash recovery by replaying the WAL.

use std::fs::OpenOptions;
use std::path::Path;

use crate::error::Result;

use super::{WalEntry, WalReader};

/// Handles WAL recovery after crash
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Default)]
pub struct RecoveryResult {
    /// Number of entries successfully recovered
    pub entries_recovered: u64,

    /// Last valid LSN
    pub last_lsn: u64,

    /// Whether the WAL was truncated (partial writes removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover entries from a WAL file
    ///
    /// This will:
    /// 1. Read all valid entries
    /// 2. Fail with a corruption error on a bad record that is not the last one
    /// 3. Truncate a torn record at the end
    /// 4. Return all valid entries in order
    pub fn recover(path: &Path) -> Result<(Vec<WalEntry>, RecoveryResult)> {
        let mut reader = WalReader::open(path)?;
        let mut entries = Vec::new();
        let mut result = RecoveryResult::default();

        while let Some(entry) = reader.next_entry()? {
            result.entries_recovered += 1;
            result.last_lsn = entry.lsn;
            entries.push(entry);
        }

        if reader.is_torn() {
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(reader.valid_offset())?;
            file.sync_all()?;
            result.was_truncated = true;
        }

        Ok((entries, result))
    }

    /// Verify integrity of a WAL file without modifying it
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let mut reader = WalReader::open(path)?;
        let mut result = RecoveryResult::default();

        while let Some(entry) = reader.next_entry()? {
            result.entries_recovered += 1;
            result.last_lsn = entry.lsn;
        }
        result.was_truncated = reader.is_torn();

        Ok(result)
    }
}

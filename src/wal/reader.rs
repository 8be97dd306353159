//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use bytes::Buf;

use crate::error::{KvError, Result};

use super::entry::{compute_crc, HEADER_SIZE};
use super::WalEntry;

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Total file length at open time
    file_len: u64,
    /// End offset of the last fully valid record
    valid_offset: u64,
    /// Set once a torn record has been found at the tail
    torn: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            file_len,
            valid_offset: 0,
            torn: false,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at a clean end of file or at a torn final record.
    /// A bad record followed by more data is corruption.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.torn || self.valid_offset >= self.file_len {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        if !self.read_full(&mut header)? {
            self.torn = true;
            return Ok(None);
        }

        let mut fields = &header[..];
        let lsn = fields.get_u64_le();
        let crc = fields.get_u32_le();
        let len = fields.get_u32_le() as u64;

        let record_end = self.valid_offset + HEADER_SIZE as u64 + len;
        if record_end > self.file_len {
            // A length running past the end is only a torn tail if nothing
            // intact follows; otherwise the length field itself is damaged.
            let mut rest = header.to_vec();
            self.reader.read_to_end(&mut rest)?;
            if intact_record_after(&rest) {
                return Err(KvError::Corrupted(format!(
                    "bad WAL record length {} at offset {}",
                    len, self.valid_offset
                )));
            }
            self.torn = true;
            return Ok(None);
        }

        let mut payload = vec![0u8; len as usize];
        if !self.read_full(&mut payload)? {
            self.torn = true;
            return Ok(None);
        }

        let is_last = record_end == self.file_len;
        let entry = if compute_crc(&payload) != crc {
            None
        } else {
            WalEntry::decode(&payload).ok().filter(|e| e.lsn == lsn)
        };

        match entry {
            Some(entry) => {
                self.valid_offset = record_end;
                Ok(Some(entry))
            }
            None if is_last => {
                self.torn = true;
                Ok(None)
            }
            None => Err(KvError::Corrupted(format!(
                "bad WAL record at offset {}",
                self.valid_offset
            ))),
        }
    }

    /// End offset of the last valid record read so far
    pub fn valid_offset(&self) -> u64 {
        self.valid_offset
    }

    /// Whether a torn record was found at the tail
    pub fn is_torn(&self) -> bool {
        self.torn
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator { reader: self }
    }

    fn read_full(&mut self, buf: &mut [u8]) -> Result<bool> {
        match self.reader.read_exact(buf) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whether some offset past the start of `bytes` holds a record whose
/// checksum and payload are intact
fn intact_record_after(bytes: &[u8]) -> bool {
    (1..bytes.len()).any(|start| {
        let mut fields = &bytes[start..];
        if fields.len() < HEADER_SIZE {
            return false;
        }
        let lsn = fields.get_u64_le();
        let crc = fields.get_u32_le();
        let len = fields.get_u32_le() as usize;

        fields.get(..len).map_or(false, |payload| {
            compute_crc(payload) == crc
                && WalEntry::decode(payload).map_or(false, |entry| entry.lsn == lsn)
        })
    })
}

/// Iterator over WAL entries
pub struct WalIterator {
    reader: WalReader,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_entry().transpose()
    }
}

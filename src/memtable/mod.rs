//! MemTable Module
//!
//! In-memory, multi-versioned data structure holding every key of an open
//! database.
//!
//! ## Responsibilities
//! - Fast reads and writes in memory
//! - Single-writer/multi-reader access pattern
//! - Keep older versions alive while a snapshot can still see them
//! - Ordered range scans for iterators
//!
//! ## Data Structure Choice
//! BTreeMap wrapped in RwLock, each key holding its versions ordered by
//! sequence number:
//! - Ordered keys (required for range iteration)
//! - A reader at sequence `s` sees the newest version with `seq <= s`

mod table;

pub use table::MemTable;

/// One version of a key's value
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    /// Sequence number of the batch that wrote this version
    pub seq: u64,

    pub value: Vec<u8>,
}

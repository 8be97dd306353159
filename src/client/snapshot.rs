//! Remote Snapshot
//!
//! Proxy for a snapshot held by the server on this handle's session. It
//! lives until the handle is closed; there is no separate release.

use std::sync::{Arc, Weak};

use crate::error::{KvError, Result};

use super::database::Inner;
use super::RemoteIterator;

/// Point-in-time view of a remote database
pub struct RemoteSnapshot {
    id: u64,
    db: Weak<Inner>,
}

impl RemoteSnapshot {
    pub(crate) fn new(id: u64, db: Weak<Inner>) -> Self {
        Self { id, db }
    }

    /// Server-side snapshot id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the value of `key` as of the snapshot
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.db()?.get(self.id, key)
    }

    /// Iterate `[lower, upper)` as of the snapshot
    pub fn lookup(&self, lower: &[u8], upper: &[u8]) -> Result<RemoteIterator> {
        self.db()?.lookup(self.id, lower, upper)
    }

    fn db(&self) -> Result<Arc<Inner>> {
        self.db.upgrade().ok_or(KvError::DatabaseClosed)
    }
}

//! Remote Database
//!
//! Client handle bound to one open database on a server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::batch::{KeyValue, WriteBatch};
use crate::error::{KvError, Result};
use crate::protocol::{Request, Response};

use super::channel::{Channel, Deadline};
use super::{RemoteIterator, RemoteSnapshot};

/// A database opened on a remote server
///
/// Every call is one round trip on the handle's own connection. The
/// channel is guarded by a mutex, so concurrent callers are serialized
/// rather than interleaved. A transport failure is fatal to the handle:
/// later calls fail and the database must be reopened.
pub struct RemoteDatabase {
    inner: Arc<Inner>,
}

/// State shared with iterators and snapshots through weak references
pub(crate) struct Inner {
    name: String,
    channel: Mutex<Option<Channel>>,
    closed: AtomicBool,
}

impl RemoteDatabase {
    /// Connect to `addr` and open `name` there
    ///
    /// `timeout` bounds connection establishment (zero = no limit).
    pub fn open(addr: &str, name: &str, create_if_missing: bool, timeout: Duration) -> Result<Self> {
        let mut channel = Channel::connect(addr, Deadline::after(timeout))
            .map_err(|e| KvError::OpenFailed(format!("failed to connect to {}: {}", addr, e)))?;

        let request = Request::Open {
            name: name.to_string(),
            create: create_if_missing,
        };
        channel
            .call(&request)
            .map_err(|e| KvError::OpenFailed(format!("open request failed: {}", e)))?
            .check()?;

        tracing::debug!("opened remote database {} at {}", name, addr);
        Ok(Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                channel: Mutex::new(Some(channel)),
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Delete the database `name` on the server at `addr`
    ///
    /// Runs on its own short-lived connection. The whole call (connect,
    /// write and read) must finish within `timeout` (zero = no limit).
    pub fn remove(addr: &str, name: &str, timeout: Duration) -> Result<()> {
        let deadline = Deadline::after(timeout);
        let mut channel = Channel::connect(addr, deadline)?;
        channel.set_deadline(deadline)?;

        channel
            .call(&Request::Remove {
                name: name.to_string(),
            })?
            .check()?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the value of `key`, `None` if it is absent
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        self.inner.get(0, key)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.inner.call(Request::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        })?;
        Ok(())
    }

    /// Apply a batch atomically
    pub fn write(&self, batch: &WriteBatch) -> Result<()> {
        self.inner.call(Request::Write {
            entries: batch.entries().to_vec(),
        })?;
        Ok(())
    }

    /// Iterate `[lower, upper)`; an empty `upper` is unbounded
    pub fn lookup(&self, lower: &[u8], upper: &[u8]) -> Result<RemoteIterator> {
        self.inner.lookup(0, lower, upper)
    }

    /// Take a snapshot on the server
    pub fn snapshot(&self) -> Result<RemoteSnapshot> {
        match self.inner.call(Request::Snapshot)? {
            Response::Snapshot { snapshot_id, .. } => {
                Ok(RemoteSnapshot::new(snapshot_id, Arc::downgrade(&self.inner)))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Close the database on the server
    ///
    /// Only the first call does anything. If the connection is already
    /// gone there is nothing left to release and the call succeeds.
    pub fn close(&self) -> Result<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl Inner {
    /// One round trip; a transport failure drops the channel for good
    fn call(&self, request: Request) -> Result<Response> {
        if self.closed.load(Ordering::Acquire) {
            return Err(KvError::DatabaseClosed);
        }

        let mut guard = self.channel.lock();
        let channel = guard
            .as_mut()
            .ok_or_else(|| KvError::Network("connection lost".to_string()))?;

        match channel.call(&request) {
            Ok(response) => response.check(),
            Err(e) => {
                *guard = None;
                Err(e)
            }
        }
    }

    pub(crate) fn get(&self, snapshot_id: u64, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let request = Request::Get {
            snapshot_id,
            key: key.to_vec(),
        };
        match self.call(request) {
            Ok(Response::Get { value, .. }) => Ok(Some(value)),
            Ok(other) => Err(unexpected(other)),
            Err(KvError::KeyNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn lookup(
        self: &Arc<Self>,
        snapshot_id: u64,
        lower: &[u8],
        upper: &[u8],
    ) -> Result<RemoteIterator> {
        let request = Request::Lookup {
            snapshot_id,
            lower: lower.to_vec(),
            upper: upper.to_vec(),
        };
        match self.call(request)? {
            Response::Lookup { iterator_id, .. } => {
                Ok(RemoteIterator::new(iterator_id, Arc::downgrade(self)))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Next batch of an iterator; `None` once the server reports its end
    pub(crate) fn next_batch(&self, iterator_id: u64) -> Result<Option<Vec<KeyValue>>> {
        match self.call(Request::Next { iterator_id }) {
            Ok(Response::Next { entries, .. }) => Ok(Some(entries)),
            Ok(other) => Err(unexpected(other)),
            Err(KvError::EndOfIterator) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let Some(mut channel) = self.channel.lock().take() else {
            return Ok(());
        };

        match channel.call(&Request::Close) {
            Ok(response) => response.check().map(|_| ()),
            Err(e) => {
                tracing::debug!("close of {}: connection already gone: {}", self.name, e);
                Ok(())
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::debug!("closing {} on drop failed: {}", self.name, e);
        }
    }
}

fn unexpected(response: Response) -> KvError {
    KvError::Protocol(format!("unexpected {:?} reply", response.kind()))
}

//! Connection Session
//!
//! Per-connection server state: at most one bound database, plus the
//! iterators and snapshots this connection created, keyed by ids that are
//! only meaningful inside the session.

use std::collections::HashMap;
use std::sync::Arc;

use crate::batch::{KeyValue, WriteBatch};
use crate::engine::{Engine, EngineIterator, Snapshot};
use crate::error::{KvError, Result};
use crate::protocol::{error_to_wire, Request, Response, NEXT_BATCH_SIZE};
use crate::registry::{Lease, Registry};

/// State of one client connection
pub struct Session {
    registry: Arc<Registry>,

    /// Reference on the bound database, if any
    lease: Option<Lease>,

    /// Last id handed out; 0 is never issued and means "none"
    last_id: u64,

    iterators: HashMap<u64, EngineIterator>,
    snapshots: HashMap<u64, Snapshot>,
}

impl Session {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            lease: None,
            last_id: 0,
            iterators: HashMap::new(),
            snapshots: HashMap::new(),
        }
    }

    /// Handle one request and build its reply
    ///
    /// Failures are carried in the reply's error field; none of them ends
    /// the session.
    pub fn handle(&mut self, request: Request) -> Response {
        match request {
            Request::Open { name, create } => Response::Open {
                error: status(self.open(&name, create)),
            },
            Request::Put { key, value } => Response::Put {
                error: status(self.put(&key, &value)),
            },
            Request::Get { snapshot_id, key } => match self.get(snapshot_id, &key) {
                Ok(value) => Response::Get {
                    error: String::new(),
                    value,
                },
                Err(e) => Response::Get {
                    error: error_to_wire(&e),
                    value: Vec::new(),
                },
            },
            Request::Write { entries } => Response::Write {
                error: status(self.write(entries)),
            },
            Request::Lookup {
                snapshot_id,
                lower,
                upper,
            } => match self.lookup(snapshot_id, &lower, &upper) {
                Ok(iterator_id) => Response::Lookup {
                    error: String::new(),
                    iterator_id,
                },
                Err(e) => Response::Lookup {
                    error: error_to_wire(&e),
                    iterator_id: 0,
                },
            },
            Request::Next { iterator_id } => match self.next(iterator_id) {
                Ok(entries) => Response::Next {
                    error: String::new(),
                    entries,
                },
                Err(e) => Response::Next {
                    error: error_to_wire(&e),
                    entries: Vec::new(),
                },
            },
            Request::Snapshot => match self.snapshot() {
                Ok(snapshot_id) => Response::Snapshot {
                    error: String::new(),
                    snapshot_id,
                },
                Err(e) => Response::Snapshot {
                    error: error_to_wire(&e),
                    snapshot_id: 0,
                },
            },
            Request::Close => Response::Close {
                error: status(self.close()),
            },
            Request::Remove { name } => Response::Remove {
                error: status(self.registry.delete_on_disk(&name)),
            },
        }
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Bind this session to `name`
    pub fn open(&mut self, name: &str, create_if_missing: bool) -> Result<()> {
        if self.lease.is_some() {
            return Err(KvError::AlreadyOpen);
        }
        self.lease = Some(self.registry.acquire(name, create_if_missing)?);
        Ok(())
    }

    /// Read `key` live (snapshot id 0) or through a snapshot
    ///
    /// An absent key is `KeyNotFound`; a present empty value is returned as is.
    pub fn get(&self, snapshot_id: u64, key: &[u8]) -> Result<Vec<u8>> {
        let value = if snapshot_id == 0 {
            self.engine()?.get(key)?
        } else {
            self.snapshots
                .get(&snapshot_id)
                .ok_or(KvError::InvalidSnapshotId)?
                .get(key)
        };
        value.ok_or(KvError::KeyNotFound)
    }

    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.engine()?.put(key, value)
    }

    /// Apply `entries` as one atomic batch
    pub fn write(&self, entries: Vec<KeyValue>) -> Result<()> {
        self.engine()?.write(WriteBatch::from(entries))
    }

    /// Create an iterator and return its id
    pub fn lookup(&mut self, snapshot_id: u64, lower: &[u8], upper: &[u8]) -> Result<u64> {
        let iterator = if snapshot_id == 0 {
            self.engine()?.lookup(lower, upper)?
        } else {
            self.snapshots
                .get(&snapshot_id)
                .ok_or(KvError::InvalidSnapshotId)?
                .lookup(lower, upper)
        };

        let id = self.allocate_id();
        self.iterators.insert(id, iterator);
        Ok(id)
    }

    /// Fetch up to [`NEXT_BATCH_SIZE`] entries from an iterator
    ///
    /// A call that finds nothing left reports `EndOfIterator` and evicts the
    /// iterator. A short batch is returned without error; the end shows up
    /// on the following call.
    pub fn next(&mut self, iterator_id: u64) -> Result<Vec<KeyValue>> {
        let iterator = self
            .iterators
            .get_mut(&iterator_id)
            .ok_or(KvError::InvalidIteratorId)?;

        let batch: Vec<KeyValue> = iterator.by_ref().take(NEXT_BATCH_SIZE).collect();
        if batch.is_empty() {
            self.iterators.remove(&iterator_id);
            return Err(KvError::EndOfIterator);
        }
        Ok(batch)
    }

    /// Take a snapshot of the bound database and return its id
    pub fn snapshot(&mut self) -> Result<u64> {
        let snapshot = self.engine()?.snapshot()?;
        let id = self.allocate_id();
        self.snapshots.insert(id, snapshot);
        Ok(id)
    }

    /// Release the bound database, if any
    ///
    /// Iterators and snapshots belong to that database and are discarded.
    /// Calling this with nothing bound is a no-op.
    pub fn close(&mut self) -> Result<()> {
        self.iterators.clear();
        self.snapshots.clear();

        match self.lease.take() {
            Some(lease) => lease.release(),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Name of the bound database
    pub fn database_name(&self) -> Option<&str> {
        self.lease.as_ref().map(|lease| lease.database().name())
    }

    pub fn open_iterators(&self) -> usize {
        self.iterators.len()
    }

    pub fn open_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    fn engine(&self) -> Result<&Engine> {
        self.lease
            .as_ref()
            .map(|lease| lease.database().engine())
            .ok_or(KvError::NoDatabase)
    }

    fn allocate_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }
}

fn status(result: Result<()>) -> String {
    match result {
        Ok(()) => String::new(),
        Err(e) => error_to_wire(&e),
    }
}

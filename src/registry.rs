//! Session Registry
//!
//! Process-wide table of open databases, shared by every connection.
//!
//! A database is opened on the first `acquire` of its name and closed when
//! the last [`Lease`] on it is released. All mutations go through one
//! coarse mutex: opens and closes are rare next to reads and writes.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::WalSyncStrategy;
use crate::engine::{Engine, EngineOptions};
use crate::error::{KvError, Result};

/// One open database, shared by every session bound to it
pub struct OpenDatabase {
    name: String,
    engine: Engine,
}

impl OpenDatabase {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}

struct Slot {
    refcount: usize,
    db: Arc<OpenDatabase>,
}

/// Name → open database table with reference counts
pub struct Registry {
    /// Root directory holding one sub-directory per database
    root: PathBuf,

    sync: WalSyncStrategy,

    open: Mutex<HashMap<String, Slot>>,
}

impl Registry {
    pub fn new(root: impl Into<PathBuf>, sync: WalSyncStrategy) -> Self {
        Self {
            root: root.into(),
            sync,
            open: Mutex::new(HashMap::new()),
        }
    }

    /// Take a reference on the database `name`, opening it if needed
    ///
    /// If the engine fails to open, nothing is registered and the engine's
    /// error is returned.
    pub fn acquire(self: &Arc<Self>, name: &str, create_if_missing: bool) -> Result<Lease> {
        let path = self.database_path(name)?;
        let mut open = self.open.lock();

        if let Some(slot) = open.get_mut(name) {
            slot.refcount += 1;
            tracing::debug!("database {} shared, refcount={}", name, slot.refcount);
            return Ok(Lease::new(Arc::clone(self), Arc::clone(&slot.db)));
        }

        let options = EngineOptions {
            create_if_missing,
            sync: self.sync,
        };
        let engine = Engine::open(&path, options)?;
        let db = Arc::new(OpenDatabase {
            name: name.to_string(),
            engine,
        });
        open.insert(
            name.to_string(),
            Slot {
                refcount: 1,
                db: Arc::clone(&db),
            },
        );

        tracing::info!("opened database {}", name);
        Ok(Lease::new(Arc::clone(self), db))
    }

    /// Drop one reference; the last one closes the engine
    fn release(&self, db: &Arc<OpenDatabase>) -> Result<()> {
        let mut open = self.open.lock();

        let slot = match open.get_mut(db.name()) {
            Some(slot) if Arc::ptr_eq(&slot.db, db) => slot,
            _ => return Err(KvError::DatabaseClosed),
        };

        slot.refcount -= 1;
        if slot.refcount > 0 {
            tracing::debug!("database {} released, refcount={}", db.name(), slot.refcount);
            return Ok(());
        }

        open.remove(db.name());
        tracing::info!("closing database {}", db.name());
        db.engine().close()
    }

    /// Delete a database's on-disk state
    ///
    /// Refused with `DatabaseOpen` while any session holds the name. The
    /// check and the deletion happen under the registry lock, so no open
    /// can slip in between.
    pub fn delete_on_disk(&self, name: &str) -> Result<()> {
        let path = self.database_path(name)?;
        let open = self.open.lock();

        if open.contains_key(name) {
            return Err(KvError::DatabaseOpen);
        }

        Engine::destroy(&path)?;
        tracing::info!("removed database {}", name);
        Ok(())
    }

    /// Current refcount of `name`, or `None` if it is not open
    pub fn refcount(&self, name: &str) -> Option<usize> {
        self.open.lock().get(name).map(|slot| slot.refcount)
    }

    /// Number of databases currently open
    pub fn open_count(&self) -> usize {
        self.open.lock().len()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a database name to its directory, rejecting anything that is
    /// not a single plain path component
    fn database_path(&self, name: &str) -> Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => {
                Ok(self.root.join(name))
            }
            _ => Err(KvError::InvalidName(name.to_string())),
        }
    }
}

/// One session's reference on an open database
///
/// Released exactly once: either explicitly through [`Lease::release`],
/// which consumes it, or on drop.
pub struct Lease {
    registry: Arc<Registry>,
    db: Arc<OpenDatabase>,
    released: bool,
}

impl Lease {
    fn new(registry: Arc<Registry>, db: Arc<OpenDatabase>) -> Self {
        Self {
            registry,
            db,
            released: false,
        }
    }

    pub fn database(&self) -> &OpenDatabase {
        &self.db
    }

    /// Shared handle to the database, for observing it past the lease
    pub fn handle(&self) -> Arc<OpenDatabase> {
        Arc::clone(&self.db)
    }

    /// Return the reference to the registry
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.registry.release(&self.db)
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.registry.release(&self.db) {
            tracing::warn!("releasing database {} failed: {}", self.db.name(), e);
        }
    }
}

//! Client Module
//!
//! Blocking client for a SharedKV server.
//!
//! ```no_run
//! use std::time::Duration;
//! use sharedkv::client::RemoteDatabase;
//!
//! # fn main() -> sharedkv::Result<()> {
//! let db = RemoteDatabase::open("127.0.0.1:8501", "main", true, Duration::from_secs(5))?;
//! db.put(b"my key", b"my value")?;
//!
//! let mut iter = db.lookup(b"", b"")?;
//! while let Some(kv) = iter.next_entry()? {
//!     println!("{:?} = {:?}", kv.key, kv.value);
//! }
//! db.close()?;
//! # Ok(())
//! # }
//! ```

mod channel;
mod database;
mod iterator;
mod snapshot;

pub use database::RemoteDatabase;
pub use iterator::RemoteIterator;
pub use snapshot::RemoteSnapshot;

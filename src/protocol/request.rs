//! Request definitions
//!
//! Represents requests from clients.

use serde::{Deserialize, Serialize};

use crate::batch::KeyValue;

/// Request kinds, shared by requests and their replies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Open,
    Put,
    Get,
    Write,
    Lookup,
    Next,
    Snapshot,
    Close,
    Remove,
}

/// A request sent over a session channel
///
/// A snapshot id of 0 means "read the live database".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Bind the session to a database, opening it if needed
    Open { name: String, create: bool },

    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Get a value by key
    Get { snapshot_id: u64, key: Vec<u8> },

    /// Apply puts atomically
    Write { entries: Vec<KeyValue> },

    /// Create an iterator over `[lower, upper)`
    Lookup {
        snapshot_id: u64,
        lower: Vec<u8>,
        upper: Vec<u8>,
    },

    /// Fetch the next batch from an iterator
    Next { iterator_id: u64 },

    /// Take a snapshot of the bound database
    Snapshot,

    /// Release the bound database
    Close,

    /// Delete a database on disk (one-shot, needs no session)
    Remove { name: String },
}

impl Request {
    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Open { .. } => RequestKind::Open,
            Request::Put { .. } => RequestKind::Put,
            Request::Get { .. } => RequestKind::Get,
            Request::Write { .. } => RequestKind::Write,
            Request::Lookup { .. } => RequestKind::Lookup,
            Request::Next { .. } => RequestKind::Next,
            Request::Snapshot => RequestKind::Snapshot,
            Request::Close => RequestKind::Close,
            Request::Remove { .. } => RequestKind::Remove,
        }
    }
}

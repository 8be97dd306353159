//! Response definitions
//!
//! Represents replies to clients and the fixed dictionary that maps error
//! text to typed errors.

use serde::{Deserialize, Serialize};

use crate::batch::KeyValue;
use crate::error::KvError;

use super::RequestKind;

/// A reply, one per request
///
/// Every `error` is empty on success. Id 0 means no iterator or snapshot
/// was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Open { error: String },
    Put { error: String },
    Get { error: String, value: Vec<u8> },
    Write { error: String },
    Lookup { error: String, iterator_id: u64 },
    Next { error: String, entries: Vec<KeyValue> },
    Snapshot { error: String, snapshot_id: u64 },
    Close { error: String },
    Remove { error: String },
}

impl Response {
    /// The error text carried by this reply
    pub fn error(&self) -> &str {
        match self {
            Response::Open { error }
            | Response::Put { error }
            | Response::Get { error, .. }
            | Response::Write { error }
            | Response::Lookup { error, .. }
            | Response::Next { error, .. }
            | Response::Snapshot { error, .. }
            | Response::Close { error }
            | Response::Remove { error } => error,
        }
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Response::Open { .. } => RequestKind::Open,
            Response::Put { .. } => RequestKind::Put,
            Response::Get { .. } => RequestKind::Get,
            Response::Write { .. } => RequestKind::Write,
            Response::Lookup { .. } => RequestKind::Lookup,
            Response::Next { .. } => RequestKind::Next,
            Response::Snapshot { .. } => RequestKind::Snapshot,
            Response::Close { .. } => RequestKind::Close,
            Response::Remove { .. } => RequestKind::Remove,
        }
    }

    /// Turn a non-empty error into a typed error
    pub fn check(self) -> Result<Self, KvError> {
        match error_from_wire(self.error()) {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// Wire text for an error
pub fn error_to_wire(err: &KvError) -> String {
    match err {
        KvError::Corrupted(_) => "database corrupted".to_string(),
        other => other.to_string(),
    }
}

/// Typed error for wire text; `None` when the text is empty
pub fn error_from_wire(text: &str) -> Option<KvError> {
    let err = match text {
        "" => return None,
        "no database found" => KvError::DatabaseNotFound,
        "end of iterator" => KvError::EndOfIterator,
        "database corrupted" => KvError::Corrupted("reported by server".to_string()),
        "key not found" => KvError::KeyNotFound,
        "database is open" => KvError::DatabaseOpen,
        "invalid iterator id" => KvError::InvalidIteratorId,
        "invalid snapshot id" => KvError::InvalidSnapshotId,
        "no database open" => KvError::NoDatabase,
        other => KvError::Remote(other.to_string()),
    };
    Some(err)
}

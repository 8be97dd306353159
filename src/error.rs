//! Error types for SharedKV
//!
//! Provides a unified error type for the engine, the server session and
//! the remote client. Errors that cross the wire are translated to and
//! from fixed strings in [`crate::protocol`].

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for SharedKV operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("database corrupted: {0}")]
    Corrupted(String),

    #[error("no database found")]
    DatabaseNotFound,

    #[error("database closed")]
    DatabaseClosed,

    #[error("invalid database name: {0:?}")]
    InvalidName(String),

    #[error("key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Session Errors
    // -------------------------------------------------------------------------
    #[error("no database open")]
    NoDatabase,

    #[error("database already open")]
    AlreadyOpen,

    /// Remove was refused because a session still holds the database
    #[error("database is open")]
    DatabaseOpen,

    #[error("end of iterator")]
    EndOfIterator,

    #[error("invalid iterator id")]
    InvalidIteratorId,

    #[error("invalid snapshot id")]
    InvalidSnapshotId,

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("open failed: {0}")]
    OpenFailed(String),

    /// Any server error text outside the known dictionary
    #[error("database error: {0}")]
    Remote(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for KvError {
    fn from(err: bincode::Error) -> Self {
        KvError::Serialization(err.to_string())
    }
}

//! # SharedKV
//!
//! A networked key-value store where many clients share embedded databases:
//! - Named databases opened on demand and shared across connections
//! - Reference counting so each database opens once and closes with its
//!   last session
//! - Per-connection iterators and snapshots addressed by session-local ids
//! - Paginated range scans replayed locally by the client
//! - Write-Ahead Logging (WAL) for durability
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐        ┌──────────────────┐
//! │  RemoteDatabase  │  ...   │  RemoteDatabase  │   (one TCP channel each)
//! └────────┬─────────┘        └────────┬─────────┘
//!          │                           │
//! ┌────────▼─────────┐        ┌────────▼─────────┐
//! │    Connection    │        │    Connection    │   (thread per connection)
//! │     Session      │        │     Session      │   iterators / snapshots
//! └────────┬─────────┘        └────────┬─────────┘
//!          │      acquire / release    │
//! ┌────────▼───────────────────────────▼─────────┐
//! │                  Registry                     │   name → refcounted db
//! └─────────────────────┬─────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │ (versioned) │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod batch;

pub mod wal;
pub mod memtable;
pub mod engine;
pub mod registry;
pub mod protocol;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KvError, Result};
pub use config::Config;
pub use batch::{KeyValue, WriteBatch};
pub use engine::Engine;
pub use registry::Registry;
pub use client::{RemoteDatabase, RemoteIterator, RemoteSnapshot};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of SharedKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

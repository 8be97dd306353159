//! Server configuration
//!
//! Everything the server binary can tune: where databases live, how the
//! WAL is synced, and how connections are accepted.

use std::path::PathBuf;

/// Settings for one SharedKV server process
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory under which each named database gets `{name}/wal.log`
    pub data_dir: PathBuf,

    /// Applied to every database the server opens
    pub wal_sync_strategy: WalSyncStrategy,

    pub listen_addr: String,

    /// Connections beyond this are accepted and immediately dropped
    pub max_connections: usize,

    /// Idle limit on a session's socket reads, in ms (0 = none)
    pub read_timeout_ms: u64,

    /// Limit on writing one reply, in ms (0 = none)
    pub write_timeout_ms: u64,
}

/// When a database's WAL is fsynced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// Before every put or batch is acknowledged
    EveryWrite,

    /// Once `count` batches have been logged since the last fsync. Batches
    /// in between survive a process crash but not a power loss.
    EveryNEntries { count: usize },
}

impl Default for WalSyncStrategy {
    fn default() -> Self {
        WalSyncStrategy::EveryNEntries { count: 100 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./databases"),
            wal_sync_strategy: WalSyncStrategy::default(),
            listen_addr: "127.0.0.1:8501".to_string(),
            max_connections: 1024,
            // Sessions live as long as their client; idle connections are not reaped.
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Fluent construction of a [`Config`], starting from the defaults
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

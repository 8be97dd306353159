//! TCP Server
//!
//! Accepts connections and runs each one on its own thread.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::registry::Registry;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// TCP server for SharedKV
pub struct Server {
    config: Config,

    /// Open databases shared by all connections
    registry: Arc<Registry>,

    /// Non-blocking listener, polled so shutdown is noticed
    listener: TcpListener,

    shutdown: AtomicBool,

    /// Live connections, kept so shutdown can unblock their reads
    peers: Arc<Mutex<HashMap<u64, TcpStream>>>,

    next_peer_id: AtomicU64,
}

impl Server {
    /// Bind the listen address and prepare the data directory
    pub fn bind(config: Config) -> Result<Self> {
        fs::create_dir_all(&config.data_dir)?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        let registry = Arc::new(Registry::new(&config.data_dir, config.wal_sync_strategy));

        Ok(Self {
            config,
            registry,
            listener,
            shutdown: AtomicBool::new(false),
            peers: Arc::new(Mutex::new(HashMap::new())),
            next_peer_id: AtomicU64::new(1),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Number of live connections
    pub fn connection_count(&self) -> usize {
        self.peers.lock().len()
    }

    /// Start the server (blocking)
    ///
    /// Returns after [`Server::shutdown`] once every connection thread has
    /// finished releasing its session.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);
        let wait_group = WaitGroup::new();

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.spawn_connection(stream, wait_group.clone()) {
                        tracing::warn!("Failed to start connection from {}: {}", addr, e);
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} connections", self.connection_count());
        for stream in self.peers.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        wait_group.wait();

        Ok(())
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    fn spawn_connection(&self, stream: TcpStream, wait_group: WaitGroup) -> Result<()> {
        let peer_id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut peers = self.peers.lock();
            if peers.len() >= self.config.max_connections {
                tracing::warn!(
                    "Refusing connection: {} connections open (max {})",
                    peers.len(),
                    self.config.max_connections
                );
                return Ok(());
            }

            // Some platforms hand out accepted sockets in non-blocking mode
            stream.set_nonblocking(false)?;
            peers.insert(peer_id, stream.try_clone()?);
        }

        let registry = Arc::clone(&self.registry);
        let peers = Arc::clone(&self.peers);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", peer_id))
            .spawn(move || {
                let result = Connection::new(stream, registry).and_then(|mut connection| {
                    connection.set_timeouts(read_ms, write_ms)?;
                    connection.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} ended with error: {}", peer_id, e);
                }

                peers.lock().remove(&peer_id);
                drop(wait_group);
            });

        if let Err(e) = spawned {
            self.peers.lock().remove(&peer_id);
            return Err(e.into());
        }
        Ok(())
    }
}

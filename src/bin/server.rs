//! SharedKV Server Binary
//!
//! Starts the TCP server for SharedKV.

use clap::Parser;
use sharedkv::config::WalSyncStrategy;
use sharedkv::network::Server;
use sharedkv::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// SharedKV Server
#[derive(Parser, Debug)]
#[command(name = "sharedkv-server")]
#[command(about = "Key-value server sharing named databases across clients")]
#[command(version)]
struct Args {
    /// Directory holding one sub-directory per database
    #[arg(short, long, default_value = "./databases")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8501")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// fsync the WAL after every write instead of every N writes
    #[arg(long)]
    sync_every_write: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sharedkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("SharedKV Server v{}", sharedkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    let sync = if args.sync_every_write {
        WalSyncStrategy::EveryWrite
    } else {
        WalSyncStrategy::default()
    };

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .wal_sync_strategy(sync)
        .build();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

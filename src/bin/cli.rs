//! SharedKV CLI Client
//!
//! Command-line interface for interacting with a SharedKV server.

use std::time::Duration;

use clap::{Parser, Subcommand};
use sharedkv::{RemoteDatabase, Result};

/// SharedKV CLI
#[derive(Parser, Debug)]
#[command(name = "sharedkv-cli")]
#[command(about = "CLI for the SharedKV key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:8501")]
    server: String,

    /// Database name
    #[arg(short, long, default_value = "main")]
    db: String,

    /// Create the database if it does not exist
    #[arg(short, long)]
    create: bool,

    /// Connection timeout in milliseconds (0 = none)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// List entries in [lower, upper)
    Scan {
        #[arg(default_value = "")]
        lower: String,

        /// Exclusive upper bound (empty = to the end)
        #[arg(default_value = "")]
        upper: String,
    },

    /// Delete the whole database on the server
    Remove,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let timeout = Duration::from_millis(args.timeout_ms);

    if let Commands::Remove = args.command {
        RemoteDatabase::remove(&args.server, &args.db, timeout)?;
        println!("removed {}", args.db);
        return Ok(());
    }

    let db = RemoteDatabase::open(&args.server, &args.db, args.create, timeout)?;

    match &args.command {
        Commands::Get { key } => match db.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(not found)"),
        },
        Commands::Put { key, value } => {
            db.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Scan { lower, upper } => {
            let mut iter = db.lookup(lower.as_bytes(), upper.as_bytes())?;
            while let Some(kv) = iter.next_entry()? {
                println!(
                    "{} = {}",
                    String::from_utf8_lossy(&kv.key),
                    String::from_utf8_lossy(&kv.value)
                );
            }
        }
        Commands::Remove => {}
    }

    db.close()
}

//! Network Module
//!
//! TCP server and per-connection request handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per connection, each owning a [`Session`]
//! - Sessions share open databases through the [`crate::registry::Registry`]

mod server;
mod connection;
mod session;

pub use server::Server;
pub use connection::Connection;
pub use session::Session;

//! Protocol Module
//!
//! Defines the wire protocol between remote clients and the server.
//!
//! ## Session Channel
//! One TCP connection carries strict request/reply alternation: the client
//! writes one request, then blocks for exactly one reply. There is no
//! request id; correlation relies on this ordering.
//!
//! | Request  | Fields                     | Reply fields                 |
//! |----------|----------------------------|------------------------------|
//! | Open     | name, create               | error                        |
//! | Put      | key, value                 | error                        |
//! | Get      | snapshot_id, key           | error, value                 |
//! | Write    | entries                    | error                        |
//! | Lookup   | snapshot_id, lower, upper  | error, iterator_id           |
//! | Next     | iterator_id                | error, entries (≤ 64)        |
//! | Snapshot | -                          | error, snapshot_id           |
//! | Close    | -                          | error                        |
//!
//! `Remove { name }` is sent as the only request of a short-lived
//! connection and needs no open database.

mod request;
mod response;
mod codec;

pub use request::{Request, RequestKind};
pub use response::{error_from_wire, error_to_wire, Response};
pub use codec::{
    decode_request, decode_response, encode_request, encode_response, read_request,
    read_response, write_request, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};

/// Maximum number of entries returned by one `Next`
pub const NEXT_BATCH_SIZE: usize = 64;

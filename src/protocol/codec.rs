//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Requests and replies share one frame layout:
//! ```text
//! ┌──────────┬─────────────────────────────┐
//! │ Len (4)  │   bincode(Request|Response) │
//! └──────────┴─────────────────────────────┘
//! ```
//! The enum variant tag inside the payload selects the request kind. A
//! payload that does not decode is a protocol error.

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{KvError, Result};
use super::{Request, Response};

/// Header size: 4 bytes payload length
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Frame Encoding/Decoding
// =============================================================================

fn encode_frame<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(message)?;
    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(KvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.to_vec())
}

fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_SIZE {
        return Err(KvError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let payload_len = parse_len(&bytes[..HEADER_SIZE])?;
    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(KvError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    decode_payload(&bytes[HEADER_SIZE..total_len])
}

fn parse_len(header: &[u8]) -> Result<usize> {
    let payload_len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(KvError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(payload_len as usize)
}

fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    bincode::deserialize(payload)
        .map_err(|e| KvError::Protocol(format!("Malformed message: {}", e)))
}

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    encode_frame(request)
}

/// Decode a request from bytes
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    decode_frame(bytes)
}

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    encode_frame(response)
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    decode_frame(bytes)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame and decode its payload
///
/// Blocks until a complete frame is received or an error occurs
fn read_frame<R: Read, T: DeserializeOwned>(reader: &mut R) -> Result<T> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = parse_len(&header)?;
    let mut payload = vec![0u8; payload_len];
    if payload_len > 0 {
        reader.read_exact(&mut payload)?;
    }

    decode_payload(&payload)
}

fn write_frame<W: Write, T: Serialize>(writer: &mut W, message: &T) -> Result<()> {
    let bytes = encode_frame(message)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    read_frame(reader)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    write_frame(writer, request)
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    read_frame(reader)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    write_frame(writer, response)
}

//! Client Channel
//!
//! One TCP connection carrying blocking request/reply round trips.

use std::io::{self, BufReader, BufWriter, ErrorKind};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use crate::error::{KvError, Result};
use crate::protocol::{read_response, write_request, Request, Response};

/// Point in time after which a call gives up; `None` waits forever
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now; a zero timeout means no deadline
    pub(crate) fn after(timeout: Duration) -> Self {
        if timeout.is_zero() {
            Deadline(None)
        } else {
            Deadline(Some(Instant::now() + timeout))
        }
    }

    /// Time left, or a timeout error once the deadline has passed
    pub(crate) fn remaining(&self) -> Result<Option<Duration>> {
        match self.0 {
            None => Ok(None),
            Some(at) => {
                let now = Instant::now();
                if now >= at {
                    Err(io::Error::new(ErrorKind::TimedOut, "deadline exceeded").into())
                } else {
                    Ok(Some(at - now))
                }
            }
        }
    }
}

/// Request/reply channel to the server
pub(crate) struct Channel {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Channel {
    /// Connect to `addr`, trying each resolved address in turn
    pub(crate) fn connect(addr: &str, deadline: Deadline) -> Result<Self> {
        let mut last_err = None;

        for socket_addr in addr.to_socket_addrs()? {
            let attempt = match deadline.remaining()? {
                Some(timeout) => TcpStream::connect_timeout(&socket_addr, timeout),
                None => TcpStream::connect(socket_addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(match last_err {
            Some(e) => e.into(),
            None => KvError::Network(format!("{} did not resolve to any address", addr)),
        })
    }

    fn from_stream(stream: TcpStream) -> Result<Self> {
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    /// Bound every following read and write by `deadline`
    pub(crate) fn set_deadline(&self, deadline: Deadline) -> Result<()> {
        let remaining = deadline.remaining()?;
        self.reader.get_ref().set_read_timeout(remaining)?;
        self.writer.get_ref().set_write_timeout(remaining)?;
        Ok(())
    }

    /// Write one request and block for its reply
    ///
    /// Any failure leaves the channel out of step with the server; callers
    /// must drop it.
    pub(crate) fn call(&mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        let response = read_response(&mut self.reader)?;

        if response.kind() != request.kind() {
            return Err(KvError::Protocol(format!(
                "expected {:?} reply, got {:?}",
                request.kind(),
                response.kind()
            )));
        }
        Ok(response)
    }
}

//! TCP Connection
//!
//! RESP2 connection to a single upstream over a blocking TCP stream.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use bytes::Bytes;

use crate::error::{PipeError, Result};

use super::resp::{read_reply, write_command};
use super::{Connect, Connection, Reply};

/// Lifecycle of a TCP connection
enum State {
    /// Constructed, not yet dialed
    Idle,

    /// Dialed and usable
    Connected(Stream),

    /// Closed by the caller or by a fatal I/O failure; terminal
    Closed,
}

struct Stream {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer; pipelined commands accumulate here until a reply is read
    writer: BufWriter<TcpStream>,
}

/// A RESP2 connection
///
/// Dials lazily on first use; `open` dials eagerly and probes with `PING`.
/// Any I/O or framing failure closes the connection, since the reply stream
/// can no longer be trusted to line up with the commands sent.
pub struct TcpConnection {
    /// Upstream address (host:port)
    addr: String,

    /// Connect, read and write timeout
    timeout: Duration,

    state: State,

    /// Commands written whose replies are still unread
    pending: usize,

    /// Scratch buffer for reply lines
    line_buf: Vec<u8>,
}

impl TcpConnection {
    /// Create an undialed connection record
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            state: State::Idle,
            pending: 0,
            line_buf: Vec::with_capacity(128),
        }
    }

    /// Upstream address string
    pub fn addr(&self) -> &str {
        &self.addr
    }

    fn dial(&self) -> Result<Stream> {
        let addr = self
            .addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| PipeError::Config(format!("address '{}' did not resolve", self.addr)))?;

        let stream = TcpStream::connect_timeout(&addr, self.timeout)?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        if !self.timeout.is_zero() {
            stream.set_read_timeout(Some(self.timeout))?;
            stream.set_write_timeout(Some(self.timeout))?;
        }

        let read_stream = stream.try_clone()?;
        tracing::debug!("Connected to {}", self.addr);

        Ok(Stream {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    fn stream(&mut self) -> Result<&mut Stream> {
        if let State::Idle = self.state {
            match self.dial() {
                Ok(stream) => self.state = State::Connected(stream),
                Err(e) => {
                    self.state = State::Closed;
                    return Err(e);
                }
            }
        }
        match &mut self.state {
            State::Connected(stream) => Ok(stream),
            _ => Err(PipeError::ConnectionClosed),
        }
    }

    /// Close after a failure and hand back the error
    fn fail(&mut self, err: PipeError) -> PipeError {
        tracing::debug!("Closing connection to {} after error: {}", self.addr, err);
        self.shutdown();
        err
    }

    fn shutdown(&mut self) {
        if let State::Connected(stream) = std::mem::replace(&mut self.state, State::Closed) {
            let _ = stream.reader.get_ref().shutdown(Shutdown::Both);
        }
        self.pending = 0;
    }
}

impl Connection for TcpConnection {
    fn execute(&mut self, name: &str, args: &[Bytes]) -> Result<Reply> {
        if self.pending > 0 {
            return Err(PipeError::Protocol(format!(
                "{} pipelined replies unread",
                self.pending
            )));
        }
        self.enqueue(name, args)?;
        self.next_reply()
    }

    fn enqueue(&mut self, name: &str, args: &[Bytes]) -> Result<()> {
        let stream = self.stream()?;
        if let Err(e) = write_command(&mut stream.writer, name, args) {
            return Err(self.fail(e));
        }
        self.pending += 1;
        Ok(())
    }

    fn next_reply(&mut self) -> Result<Reply> {
        if self.pending == 0 {
            return Err(PipeError::Protocol("no reply pending".to_string()));
        }

        let stream = match &mut self.state {
            State::Connected(stream) => stream,
            _ => return Err(PipeError::ConnectionClosed),
        };

        if let Err(e) = stream.writer.flush() {
            return Err(self.fail(e.into()));
        }

        match read_reply(&mut stream.reader, &mut self.line_buf) {
            Ok(reply) => {
                self.pending -= 1;
                Ok(reply)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn pending(&self) -> usize {
        self.pending
    }

    fn open(&mut self) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }
        match self.execute("PING", &[])? {
            Reply::Status(ref text) if text == "PONG" => Ok(()),
            other => Err(self.fail(PipeError::UnexpectedReply {
                expected: "PONG",
                actual: other.to_string(),
            })),
        }
    }

    fn is_open(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    fn close(&mut self) -> Result<()> {
        if let State::Connected(stream) = &mut self.state {
            // Unsent pipelined commands are dropped with the socket
            let _ = stream.writer.flush();
        }
        self.shutdown();
        Ok(())
    }

    fn try_clone(&self) -> Result<Self> {
        Ok(Self::new(self.addr.clone(), self.timeout))
    }
}

impl Connect for TcpConnection {
    fn connect_to(addr: &str, timeout: Duration) -> Self {
        Self::new(addr, timeout)
    }
}

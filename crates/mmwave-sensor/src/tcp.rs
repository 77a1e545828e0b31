//! TCP link to a serial bridge.
//!
//! Serial-to-TCP bridges expose the module UART as a raw byte stream. The socket
//! is switched to non-blocking mode so `available` can be polled from the
//! correlator's busy loop.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use mmwave_protocol::DEFAULT_MAX_PAYLOAD_LEN;
use tracing::{debug, trace};

use crate::link::ByteStream;

const READ_CHUNK: usize = 512;

/// Bytes pulled from the socket per refill unless configured otherwise.
pub const DEFAULT_BUFFER_LIMIT: usize = 4 * DEFAULT_MAX_PAYLOAD_LEN;

/// A non-blocking TCP connection carrying raw sensor bytes.
#[derive(Debug)]
pub struct TcpLink {
    stream: TcpStream,
    peer: SocketAddr,
    rx: VecDeque<u8>,
    buffer_limit: usize,
}

impl TcpLink {
    /// Connect to a serial bridge.
    pub fn connect(addr: impl ToSocketAddrs) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        Self::from_stream(stream)
    }

    /// Wrap an already connected stream.
    pub fn from_stream(stream: TcpStream) -> io::Result<Self> {
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        debug!("TcpLink: connected to {}", peer);
        Ok(TcpLink {
            stream,
            peer,
            rx: VecDeque::with_capacity(DEFAULT_BUFFER_LIMIT),
            buffer_limit: DEFAULT_BUFFER_LIMIT,
        })
    }

    /// Cap on bytes held in the receive buffer. Anything beyond stays in the
    /// socket until the buffer has been read.
    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit.max(1);
        self
    }

    pub fn buffer_limit(&self) -> usize {
        self.buffer_limit
    }

    /// Address of the bridge.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Move socket bytes into `rx`, up to the buffer limit.
    fn fill(&mut self) -> io::Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        while self.rx.len() < self.buffer_limit {
            let want = READ_CHUNK.min(self.buffer_limit - self.rx.len());
            match self.stream.read(&mut chunk[..want]) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!("bridge {} closed the connection", self.peer),
                    ))
                }
                Ok(n) => {
                    trace!("TcpLink: read {} bytes", n);
                    self.rx.extend(&chunk[..n]);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl ByteStream for TcpLink {
    fn available(&mut self) -> io::Result<usize> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.len())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if self.rx.is_empty() {
            self.fill()?;
        }
        Ok(self.rx.pop_front())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.stream.write(data)
    }
}

//! Transport layer for LURK.
//!
//! Provides the [`Transport`] and [`Connection`] traits, the TCP
//! implementation of both, and the [`FrameReader`] that turns a byte
//! stream into whole frames using the protocol's layout table.
//!
//! Everything above this crate deals in complete frames: a `recv` returns
//! exactly one frame's bytes and a `send` writes one frame under a
//! deadline.

#![allow(async_fn_in_trait)]

mod error;
mod framing;
mod tcp;

pub use error::TransportError;
pub use framing::{DEFAULT_CHUNK_TIMEOUT, FrameReader};
pub use tcp::{DEFAULT_WRITE_TIMEOUT, Deadlines, TcpConnection, TcpTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Stops accepting new connections and releases the listener.
    ///
    /// Connections already accepted are unaffected.
    async fn shutdown(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// A single connection that carries whole frames.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Writes one encoded frame to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next complete frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Closes the sending side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

//! TCP transport: a listener plus framed, deadline-bounded connections.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lurk_protocol::FrameRegistry;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::framing::DEFAULT_CHUNK_TIMEOUT;
use crate::{Connection, ConnectionId, FrameReader, Transport, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Default bound on a single outbound frame write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Read and write deadlines applied to every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    /// Bound on each read while assembling a frame.
    pub chunk: Duration,
    /// Bound on writing one whole frame.
    pub write: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            chunk: DEFAULT_CHUNK_TIMEOUT,
            write: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// A TCP [`Transport`] that listens for LURK clients.
pub struct TcpTransport {
    listener: TcpListener,
    registry: FrameRegistry,
    deadlines: Deadlines,
}

impl TcpTransport {
    /// Binds a listener to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "TCP transport listening");
        Ok(Self {
            listener,
            registry: FrameRegistry::lurk(),
            deadlines: Deadlines::default(),
        })
    }

    /// Sets the deadlines given to connections accepted from now on.
    pub fn with_deadlines(mut self, deadlines: Deadlines) -> Self {
        self.deadlines = deadlines;
        self
    }

    /// The address the listener is actually bound to.
    ///
    /// Useful after binding port 0.
    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener
            .local_addr()
            .map_err(TransportError::AcceptFailed)
    }
}

impl Transport for TcpTransport {
    type Connection = TcpConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, addr) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;
        let conn =
            TcpConnection::from_stream(stream, self.registry.clone(), self.deadlines);
        tracing::debug!(id = %conn.id(), %addr, "accepted TCP connection");
        Ok(conn)
    }

    async fn shutdown(self) -> Result<(), Self::Error> {
        let addr = self.local_addr().ok();
        drop(self.listener);
        tracing::info!(?addr, "TCP transport closed");
        Ok(())
    }
}

/// A single framed TCP connection.
///
/// Reading and writing lock separate halves of the socket, so one task
/// can block in [`recv`](Connection::recv) while another sends.
pub struct TcpConnection {
    id: ConnectionId,
    peer: Option<SocketAddr>,
    reader: Mutex<FrameReader<OwnedReadHalf>>,
    writer: Mutex<OwnedWriteHalf>,
    write_timeout: Duration,
}

impl TcpConnection {
    /// Opens a client connection to a LURK server.
    pub async fn connect(
        addr: SocketAddr,
        deadlines: Deadlines,
    ) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        Ok(Self::from_stream(stream, FrameRegistry::lurk(), deadlines))
    }

    fn from_stream(
        stream: TcpStream,
        registry: FrameRegistry,
        deadlines: Deadlines,
    ) -> Self {
        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "could not disable Nagle");
        }
        let (read_half, write_half) = stream.into_split();
        Self {
            id: ConnectionId::new(
                NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            ),
            peer,
            reader: Mutex::new(FrameReader::with_registry(
                read_half,
                registry,
                deadlines.chunk,
            )),
            writer: Mutex::new(write_half),
            write_timeout: deadlines.write,
        }
    }

    /// The remote address, if the socket could report it.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Reads every frame that arrives before the peer goes quiet for
    /// `idle`. See [`FrameReader::drain`].
    pub async fn drain(
        &self,
        idle: Duration,
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        self.reader.lock().await.drain(idle).await
    }
}

impl Connection for TcpConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let mut writer = self.writer.lock().await;
        tokio::time::timeout(self.write_timeout, writer.write_all(data))
            .await
            .map_err(|_| TransportError::Timeout(self.write_timeout))?
            .map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        self.reader.lock().await.read_frame().await
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

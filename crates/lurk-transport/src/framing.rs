//! Socket framing: pulling whole LURK frames off a byte stream.
//!
//! A frame is read in up to three phases:
//!
//! 1. one byte, to learn the type;
//! 2. the rest of that type's fixed header;
//! 3. the variable payload, if the header declares one.
//!
//! Phase 1 waits indefinitely: an idle player is not an error. Phases 2
//! and 3 loop over short reads, and every individual read is bounded by
//! the chunk deadline so a peer that stalls halfway through a frame
//! cannot hold the session forever.

use std::time::Duration;

use lurk_protocol::FrameRegistry;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::timeout;

use crate::TransportError;

/// Default bound on each read while assembling a frame.
pub const DEFAULT_CHUNK_TIMEOUT: Duration = Duration::from_millis(500);

/// Reads complete frames from any [`AsyncRead`].
///
/// The reader never buffers past the end of the current frame, so the
/// bytes consumed for one frame are exactly its fixed header plus its
/// declared payload.
pub struct FrameReader<R> {
    inner: R,
    registry: FrameRegistry,
    chunk_timeout: Duration,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Wraps `inner` using the standard layout table and chunk deadline.
    pub fn new(inner: R) -> Self {
        Self::with_registry(inner, FrameRegistry::lurk(), DEFAULT_CHUNK_TIMEOUT)
    }

    pub fn with_registry(
        inner: R,
        registry: FrameRegistry,
        chunk_timeout: Duration,
    ) -> Self {
        Self {
            inner,
            registry,
            chunk_timeout,
        }
    }

    /// Reads the next complete frame.
    ///
    /// Returns `Ok(None)` if the stream ends cleanly before the first
    /// byte of a frame.
    ///
    /// # Errors
    /// - [`TransportError::Protocol`] for an unknown type byte
    /// - [`TransportError::Timeout`] if a chunk read exceeds the deadline
    /// - [`TransportError::ConnectionClosed`] if the stream ends mid-frame
    /// - [`TransportError::ReceiveFailed`] on any other I/O error
    pub async fn read_frame(
        &mut self,
    ) -> Result<Option<Vec<u8>>, TransportError> {
        let first = match self.inner.read_u8().await {
            Ok(byte) => byte,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                return Ok(None);
            }
            Err(e) => return Err(TransportError::ReceiveFailed(e)),
        };
        self.read_after(first).await.map(Some)
    }

    /// Reads every frame that arrives before the stream goes quiet for
    /// `idle`.
    ///
    /// A quiet stream ends the drain without error and without losing
    /// anything: the wait only ever covers the first byte of a frame, and
    /// once that byte is in the rest of the frame is read under the usual
    /// chunk deadline. A clean end of stream also ends the drain.
    pub async fn drain(
        &mut self,
        idle: Duration,
    ) -> Result<Vec<Vec<u8>>, TransportError> {
        let mut frames = Vec::new();
        loop {
            let first = match timeout(idle, self.inner.read_u8()).await {
                Err(_) => break,
                Ok(Ok(byte)) => byte,
                Ok(Err(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Ok(Err(e)) => return Err(TransportError::ReceiveFailed(e)),
            };
            frames.push(self.read_after(first).await?);
        }
        Ok(frames)
    }

    async fn read_after(
        &mut self,
        first: u8,
    ) -> Result<Vec<u8>, TransportError> {
        let layout = self.registry.layout_for_byte(first)?;
        let mut frame = vec![0u8; layout.header_len];
        frame[0] = first;
        self.fill(&mut frame[1..]).await?;

        if let Some(extra) = self.registry.variable_length(&frame)? {
            let start = frame.len();
            frame.resize(start + extra, 0);
            self.fill(&mut frame[start..]).await?;
        }
        Ok(frame)
    }

    async fn fill(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = timeout(self.chunk_timeout, self.inner.read(&mut buf[filled..]))
                .await
                .map_err(|_| TransportError::Timeout(self.chunk_timeout))?
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                return Err(TransportError::ConnectionClosed(format!(
                    "stream ended {} bytes short of a frame",
                    buf.len() - filled
                )));
            }
            filled += n;
        }
        Ok(())
    }
}

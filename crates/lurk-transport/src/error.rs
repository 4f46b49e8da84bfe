use std::time::Duration;

use lurk_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer closed the connection in the middle of a frame.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding or accepting connections failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A read chunk or a write did not complete within its deadline.
    #[error("deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// The frame header named an unknown type or was unreadable.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TransportError {
    /// Returns `true` if this error is a missed deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

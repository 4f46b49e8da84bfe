//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. A
//! `ProtocolError` always means the bytes themselves were wrong (too short,
//! unknown discriminant, bad error code) or a value could not be put on the
//! wire. Socket problems live in the transport layer.

/// Errors that can occur while encoding or decoding LURK frames.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer ends before the frame does.
    ///
    /// `needed` is the minimum number of bytes the frame requires given
    /// what has been parsed so far, `got` is what the buffer holds.
    #[error("frame too small: need {needed} bytes, got {got}")]
    FrameTooSmall { needed: usize, got: usize },

    /// The first byte is not one of the registered message types (1..=14).
    #[error("invalid message type: {0}")]
    InvalidMessageType(u8),

    /// An `Error` frame carried a code outside the closed error-code set.
    #[error("invalid error code: {0}")]
    InvalidErrCode(u8),

    /// A variable-length field does not fit in its 16-bit length prefix.
    #[error("field {field} is {len} bytes, longer than a u16 length allows")]
    FieldTooLong { field: &'static str, len: usize },
}

//! Error types for the session layer.

use lurk_protocol::ErrorCode;

/// Errors raised while registering or looking up players.
///
/// Every variant is recoverable: the session reports it to the client as
/// an `Error` frame and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Attack, defense and regen add up to more than the game allows.
    #[error("stats total {total}, only {limit} points are available")]
    StatError { total: u32, limit: u16 },

    /// Another connected player already uses this name.
    #[error("a player named {0} is already here")]
    AlreadyExists(String),

    /// No connected player has this name.
    #[error("no player named {0}")]
    NotFound(String),
}

impl SessionError {
    /// The wire error code this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::StatError { .. } => ErrorCode::StatError,
            Self::AlreadyExists(_) => ErrorCode::PlayerAlreadyExists,
            Self::NotFound(_) => ErrorCode::NoTarget,
        }
    }
}

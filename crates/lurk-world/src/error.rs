//! Error types for the world layer.

use lurk_protocol::{ErrorCode, Message};
use lurk_session::SessionError;

/// A gameplay action that the world refused.
///
/// All variants are recoverable. The session turns them into an `Error`
/// frame with [`code`](WorldError::code) and the display text, and keeps
/// reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The destination does not exist, is not connected to the current
    /// room, or is still locked for this player.
    #[error("{0}")]
    BadRoom(String),

    /// The named player or monster is not here.
    #[error("{0}")]
    NoTarget(String),

    /// Nothing to fight, or the fight is not allowed.
    #[error("{0}")]
    NoFight(String),

    /// Player-versus-player combat is not allowed.
    #[error("{0}")]
    NoPvp(String),

    /// A stat change was refused.
    #[error("{0}")]
    StatError(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl WorldError {
    /// The wire error code this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BadRoom(_) => ErrorCode::BadRoom,
            Self::NoTarget(_) => ErrorCode::NoTarget,
            Self::NoFight(_) => ErrorCode::NoFight,
            Self::NoPvp(_) => ErrorCode::NoPvp,
            Self::StatError(_) => ErrorCode::StatError,
            Self::Other(_) => ErrorCode::Other,
            Self::Session(e) => e.code(),
        }
    }

    /// Renders the error as the frame sent back to the player.
    pub fn to_message(&self) -> Message {
        Message::error(self.code(), self.to_string())
    }
}

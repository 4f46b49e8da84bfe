//! Unified error type for the LURK server.

use lurk_protocol::ProtocolError;
use lurk_session::SessionError;
use lurk_transport::TransportError;
use lurk_world::WorldError;

/// Top-level error that wraps every layer's errors.
///
/// The `#[from]` attribute on each variant generates the `From` impl, so
/// `?` converts layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LurkError {
    /// Socket, framing, or deadline failure. Fatal to the session.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure. Fatal once the player is in the game.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Registration failure.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A gameplay action was refused.
    #[error(transparent)]
    World(#[from] WorldError),
}

//! Per-connection handler: handshake, registration, and the gameplay loop.
//!
//! Each accepted connection gets its own Tokio task running this handler,
//! plus a writer task that owns outbound delivery. The flow is:
//!   1. Send Version and Game
//!   2. Loop until a valid Character registers the player
//!   3. Loop until Start, then enter Battle School
//!   4. Loop: receive a frame, dispatch it to the world, refresh status
//!
//! Leave, a clean close, or any framing error ends the session. The player
//! is then removed from the world and the writer gets a short grace period
//! to flush before the socket is dropped.

use std::sync::Arc;

use lurk_protocol::{ErrorCode, LurkCodec, Message, MessageType};
use lurk_session::{PlayerSender, SessionConfig, SessionState};
use lurk_transport::{Connection, ConnectionId, TcpConnection, TransportError};
use tokio::sync::{Notify, mpsc};

use crate::LurkError;
use crate::game::Game;

/// Drop guard that removes a registered player when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async lock.
struct PlayerGuard {
    name: String,
    game: Arc<Game>,
}

impl Drop for PlayerGuard {
    fn drop(&mut self) {
        let name = std::mem::take(&mut self.name);
        let game = Arc::clone(&self.game);
        tokio::spawn(async move {
            game.leave(&name).await;
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    game: Arc<Game>,
    config: SessionConfig,
) -> Result<(), LurkError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = ?conn.peer_addr(), "handling new connection");

    let (tx, rx) = mpsc::unbounded_channel();
    let stalled = Arc::new(Notify::new());
    let mut writer = tokio::spawn(write_frames(
        Arc::clone(&conn),
        rx,
        game.codec().clone(),
        Arc::clone(&stalled),
    ));

    let mut session = Session {
        conn: Arc::clone(&conn),
        game,
        tx,
        stalled,
        state: SessionState::Connecting,
        guard: None,
    };
    let result = session.run().await;
    session.transition(SessionState::Terminated);

    match &result {
        Ok(()) => tracing::info!(%conn_id, "session ended"),
        Err(e) => tracing::debug!(%conn_id, error = %e, "session ended with error"),
    }

    // Dropping the session removes the player, which releases the last
    // sender and lets the writer finish once its queue is empty.
    drop(session);
    let grace = config.termination_grace();
    if tokio::time::timeout(grace, &mut writer).await.is_err() {
        tracing::debug!(%conn_id, ?grace, "writer did not flush in time");
        writer.abort();
    }
    if let Err(e) = conn.close().await {
        tracing::trace!(%conn_id, error = %e, "close after session end");
    }

    result
}

/// Drains one player's outbound queue onto the socket.
///
/// Each write is bounded by the connection's write deadline. The first
/// failed write stops the writer and wakes the reader through `stalled`,
/// so a peer that stops reading is disconnected instead of buffering
/// forever.
async fn write_frames(
    conn: Arc<TcpConnection>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    codec: LurkCodec,
    stalled: Arc<Notify>,
) {
    while let Some(msg) = rx.recv().await {
        let bytes = match codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(conn_id = %conn.id(), error = %e, "dropping unencodable frame");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::info!(conn_id = %conn.id(), error = %e, "write failed");
            stalled.notify_one();
            return;
        }
    }
}

struct Session {
    conn: Arc<TcpConnection>,
    game: Arc<Game>,
    tx: PlayerSender,
    stalled: Arc<Notify>,
    state: SessionState,
    guard: Option<PlayerGuard>,
}

impl Session {
    fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    fn transition(&mut self, to: SessionState) {
        if !self.state.can_transition_to(to) {
            return;
        }
        tracing::debug!(conn_id = %self.id(), from = %self.state, %to, "session state");
        self.state = to;
    }

    /// Queues a frame for this connection's own writer.
    fn reply(&self, msg: Message) {
        // A closed queue means the writer already gave up on the socket;
        // the read side notices on its next frame.
        if let Err(e) = self.tx.send(msg) {
            tracing::trace!(conn_id = %self.id(), kind = %e.0.message_type(), "reply after writer stopped");
        }
    }

    async fn run(&mut self) -> Result<(), LurkError> {
        for msg in self.game.handshake().await {
            self.reply(msg);
        }
        self.transition(SessionState::AwaitCharacter);

        let Some(name) = self.await_character().await? else {
            return Ok(());
        };
        self.guard = Some(PlayerGuard {
            name: name.clone(),
            game: Arc::clone(&self.game),
        });

        self.transition(SessionState::AwaitStart);
        if !self.await_start().await? {
            return Ok(());
        }

        self.reply(Message::accept(MessageType::Start));
        self.transition(SessionState::Gameplay);
        self.game.enter(&name).await?;
        self.game.refresh_status(&name).await;
        tracing::info!(conn_id = %self.id(), player = %name, "player entered the game");

        self.gameplay(&name).await
    }

    /// Reads until a character registers. `None` if the session ended
    /// first.
    async fn await_character(&mut self) -> Result<Option<String>, LurkError> {
        loop {
            let character = match self.next_message().await? {
                None | Some(Message::Leave) => return Ok(None),
                Some(Message::Character(character)) => character,
                Some(other) => {
                    self.reject(other.message_type());
                    continue;
                }
            };
            match self
                .game
                .register(character, self.id(), self.tx.clone())
                .await
            {
                Ok(name) => return Ok(Some(name)),
                Err(e) => {
                    tracing::debug!(conn_id = %self.id(), error = %e, "character rejected");
                    self.reply(e.to_message());
                }
            }
        }
    }

    /// Reads until Start. `false` if the session ended first.
    async fn await_start(&mut self) -> Result<bool, LurkError> {
        loop {
            match self.next_message().await? {
                None | Some(Message::Leave) => return Ok(false),
                Some(Message::Start) => return Ok(true),
                Some(other) => self.reject(other.message_type()),
            }
        }
    }

    async fn gameplay(&mut self, name: &str) -> Result<(), LurkError> {
        loop {
            let msg = match self.next_message().await? {
                None => return Ok(()),
                Some(Message::Leave) => {
                    tracing::info!(conn_id = %self.id(), player = %name, "player sent leave");
                    return Ok(());
                }
                Some(msg) => msg,
            };
            let kind = msg.message_type();
            match self.game.act(name, msg).await {
                Ok(()) => self.game.refresh_status(name).await,
                Err(e) => {
                    tracing::debug!(player = %name, %kind, error = %e, "action refused");
                    self.reply(e.to_message());
                }
            }
        }
    }

    fn reject(&self, got: MessageType) {
        if let Some(rejection) = self.state.rejection(got) {
            self.reply(rejection);
        }
    }

    /// Reads and decodes the next frame.
    ///
    /// A frame that arrives whole but does not decode is reported to the
    /// client as `Error(Other)`. Before gameplay it is skipped; during
    /// gameplay it ends the session. Framing failures and a stalled writer
    /// always end the session.
    async fn next_message(&self) -> Result<Option<Message>, LurkError> {
        loop {
            let frame = tokio::select! {
                frame = self.conn.recv() => frame?,
                () = self.stalled.notified() => {
                    return Err(TransportError::ConnectionClosed(format!(
                        "{} stopped reading",
                        self.id()
                    ))
                    .into());
                }
            };
            let Some(frame) = frame else {
                tracing::debug!(conn_id = %self.id(), "connection closed cleanly");
                return Ok(None);
            };
            match self.game.codec().decode(&frame) {
                Ok(msg) => return Ok(Some(msg)),
                Err(e) => {
                    tracing::debug!(conn_id = %self.id(), state = %self.state, error = %e, "malformed frame");
                    self.reply(Message::error(
                        ErrorCode::Other,
                        format!("malformed frame: {e}"),
                    ));
                    if self.state == SessionState::Gameplay {
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

//! The world lock and everything that runs under it.
//!
//! [`Game`] owns the single mutex around the world and the heal timers.
//! Every method takes the lock, runs one synchronous world action, and
//! queues the resulting frames on the players' channels before releasing
//! it, so each player sees updates in the order the world changed.
//! Queueing never blocks; the sockets are written by per-player writer
//! tasks, never while the lock is held.

use std::sync::{Arc, Weak};

use lurk_protocol::{Character, LurkCodec, Message};
use lurk_session::{Outbox, PlayerSender};
use lurk_timer::KeyedTimer;
use lurk_transport::ConnectionId;
use lurk_world::{FightOutcome, GameConfig, World, WorldError};
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Everything guarded by the world lock.
#[derive(Debug)]
pub struct GameState {
    pub world: World,
    /// One pending heal per monster, keyed by monster name.
    pub heal_timers: KeyedTimer<String>,
}

/// Shared game state passed to each connection handler task.
#[derive(Debug)]
pub struct Game {
    state: Arc<Mutex<GameState>>,
    codec: LurkCodec,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(GameState {
                world: World::new(config),
                heal_timers: KeyedTimer::new(),
            })),
            codec: LurkCodec::default(),
        }
    }

    pub fn codec(&self) -> &LurkCodec {
        &self.codec
    }

    /// Takes the world lock.
    ///
    /// Hold it only for inspection; never across a socket operation.
    pub async fn lock(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().await
    }

    /// The `Version` and `Game` frames sent on accept.
    pub async fn handshake(&self) -> [Message; 2] {
        self.state.lock().await.world.handshake()
    }

    /// Registers a character and returns the name it was stored under.
    pub async fn register(
        &self,
        character: Character,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<String, WorldError> {
        let name = character.name.clone();
        let mut state = self.state.lock().await;
        state.world.register(character, connection, sender)?.dispatch();
        Ok(name)
    }

    /// Puts a registered player into Battle School.
    pub async fn enter(&self, name: &str) -> Result<(), WorldError> {
        let mut state = self.state.lock().await;
        state.world.enter(name)?.dispatch();
        Ok(())
    }

    /// Performs one gameplay action for `name`.
    ///
    /// # Errors
    /// The world's refusal, to be reported to the player. Frames that are
    /// not player actions are refused with `Other`.
    pub async fn act(&self, name: &str, msg: Message) -> Result<(), WorldError> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = Instant::now();

        let outbox = match msg {
            Message::Message(text) => state.world.message(name, text)?,
            Message::ChangeRoom { room } => state.world.change_room(name, room)?,
            Message::Fight => {
                let outcome = state.world.fight(name, now)?;
                self.arm_heals(state, outcome)
            }
            Message::PvpFight { target } => {
                let outcome = state.world.pvp_fight(name, &target, now)?;
                self.arm_heals(state, outcome)
            }
            Message::Loot { target } => state.world.loot(name, &target)?,
            Message::Character(character) => {
                state.world.update_character(name, character)?
            }
            other => {
                return Err(WorldError::Other(format!(
                    "{} is not a gameplay action",
                    other.message_type()
                )));
            }
        };
        outbox.dispatch();
        Ok(())
    }

    /// Upgrade prompt and unlock check, run after each successful action.
    pub async fn refresh_status(&self, name: &str) {
        let mut state = self.state.lock().await;
        state.world.refresh_status(name).dispatch();
    }

    /// Removes a player and tells their room. Unknown names are ignored.
    pub async fn leave(&self, name: &str) {
        let mut state = self.state.lock().await;
        state.world.leave(name).dispatch();
    }

    /// (Re)arms the heal timer of every monster drawn into a fight.
    fn arm_heals(&self, state: &mut GameState, outcome: FightOutcome) -> Outbox {
        let delay = state.world.config().heal_after();
        for monster in outcome.engaged {
            let shared = Arc::downgrade(&self.state);
            let key = monster.clone();
            state
                .heal_timers
                .arm(monster, delay, heal_when_due(shared, key));
        }
        outcome.outbox
    }
}

async fn heal_when_due(state: Weak<Mutex<GameState>>, monster: String) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock().await;
    state.heal_timers.forget(&monster);
    state.world.heal(&monster, Instant::now()).dispatch();
}

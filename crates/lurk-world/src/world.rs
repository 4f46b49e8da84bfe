//! The shared world and every gameplay action.
//!
//! Each action is a synchronous state transition: it runs while the caller
//! holds the world lock, mutates rooms, monsters and players, and returns
//! an [`Outbox`] of frames for the caller to queue before it lets go of
//! the lock. Nothing in here touches a socket or awaits.

use lurk_protocol::{Character, CharacterFlags, Message, MessageType, TextMessage};
use lurk_session::{Outbox, Player, PlayerRegistry, PlayerSender, SessionError};
use lurk_transport::ConnectionId;
use tokio::time::Instant;

use crate::combat::resolve_fight;
use crate::content::{
    self, BARRACKS, BATTLE_SCHOOL, COCOON, EARTH, EROS, FORMIC_FLEET,
    FORMIC_HOME_WORLD, HIVE_QUEEN, NARRATOR, SHAKESPEARE,
};
use crate::{GameConfig, MonsterRoster, WorldError, WorldMap};

const LOST_IN_BATTLE: &str =
    "You have lost in battle. Regenerate your health to fight again.";
const XENOCIDE: &str = "You have committed true Xenocide.";
const COCOON_NEEDS_PVP: &str =
    "If you wish to destroy the next hive queen, you must PVP fight.";

/// A narrated message from the server to `recipient`.
pub fn narrate(recipient: &str, text: impl Into<String>) -> Message {
    Message::Message(TextMessage::narration(recipient, NARRATOR, text))
}

/// Result of a `Fight` or `PvpFight`.
#[derive(Debug, Default)]
pub struct FightOutcome {
    pub outbox: Outbox,
    /// Monsters drawn into the fight. Each needs its heal timer re-armed.
    pub engaged: Vec<String>,
    /// Monsters that died.
    pub killed: Vec<String>,
}

/// Rooms, monsters and players.
///
/// ## Example
///
/// ```rust
/// use lurk_world::{GameConfig, World};
///
/// let world = World::new(GameConfig::default());
/// assert_eq!(world.map().len(), 10);
/// assert!(world.players().is_empty());
/// ```
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    map: WorldMap,
    monsters: MonsterRoster,
    players: PlayerRegistry,
}

impl World {
    /// Creates a world holding the standard campaign.
    pub fn new(config: GameConfig) -> Self {
        Self::with_content(config, content::world_map(), content::monsters())
    }

    pub fn with_content(
        config: GameConfig,
        map: WorldMap,
        monsters: MonsterRoster,
    ) -> Self {
        Self {
            config,
            map,
            monsters,
            players: PlayerRegistry::new(),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn map(&self) -> &WorldMap {
        &self.map
    }

    pub fn monsters(&self) -> &MonsterRoster {
        &self.monsters
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    /// The frames every connection receives first: `Version`, then `Game`.
    pub fn handshake(&self) -> [Message; 2] {
        [self.config.version(), self.config.game_info()]
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// Validates and stores a new character.
    ///
    /// The server overrides placement and status: the character starts in
    /// Battle School with starting health, no gold, and the Alive, Ready
    /// and Started flags set. The queued reply echoes that character and
    /// then accepts it.
    ///
    /// # Errors
    /// `StatError` or `PlayerAlreadyExists` via [`WorldError::Session`].
    /// The Narrator's name and every monster's name count as taken.
    pub fn register(
        &mut self,
        mut character: Character,
        connection: ConnectionId,
        sender: PlayerSender,
    ) -> Result<Outbox, WorldError> {
        if self.is_reserved(&character.name) {
            return Err(SessionError::AlreadyExists(character.name).into());
        }
        self.players
            .validate(&character, self.config.initial_points)?;

        character.flags = character
            .flags
            .with(CharacterFlags::READY, true)
            .with(CharacterFlags::MONSTER, false)
            .with(CharacterFlags::ALIVE, true)
            .with(CharacterFlags::STARTED, true);
        character.room = BATTLE_SCHOOL;
        character.health = self.config.starting_health;
        character.gold = 0;

        let unlocks =
            content::starting_unlocks(&character.name, &self.config.debug_player);
        let player =
            Player::new(character.clone(), connection, sender, unlocks);

        let mut outbox = Outbox::new();
        outbox.push(&player, Message::Character(character));
        outbox.push(&player, Message::accept(MessageType::Character));
        self.players.insert(player)?;
        Ok(outbox)
    }

    fn is_reserved(&self, name: &str) -> bool {
        name == NARRATOR || self.monsters.get(name).is_some()
    }

    /// Puts a registered player into the world.
    ///
    /// The player receives their room view; everyone already in that room
    /// receives the newcomer's character and an arrival notice.
    pub fn enter(&mut self, name: &str) -> Result<Outbox, WorldError> {
        let player = self.players.require(name)?;
        let mut outbox = Outbox::new();
        for msg in self.room_view(player) {
            outbox.push(player, msg);
        }

        let arrival = Message::Character(player.character.clone());
        let notice = format!("{name} joined battle school!");
        for other in self.players.in_room_except(player.room(), name) {
            outbox.push(other, arrival.clone());
            outbox.push(other, narrate(other.name(), notice.as_str()));
        }
        Ok(outbox)
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    /// Everything a player sees on entering their room: the room, every
    /// character and monster in it, then each connection open to them.
    pub fn room_view(&self, player: &Player) -> Vec<Message> {
        let Some(node) = self.map.get(player.room()) else {
            return Vec::new();
        };
        let mut view = vec![Message::Room(node.room.clone())];
        view.extend(self.characters_in_room(player.room()));
        view.extend(node.visible_to(player).cloned().map(Message::Connection));
        view
    }

    /// `Character` frames for every player and monster in `room`.
    pub fn characters_in_room(&self, room: u16) -> Vec<Message> {
        self.players
            .in_room(room)
            .map(|p| Message::Character(p.character.clone()))
            .chain(
                self.monsters
                    .in_room(room)
                    .map(|m| Message::Character(m.character.clone())),
            )
            .collect()
    }

    // -----------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------

    /// Relays a chat message, or performs a stat upgrade when it is
    /// addressed to the Narrator.
    ///
    /// The relayed frame always carries the real sender's name.
    ///
    /// # Errors
    /// `NoTarget` if the recipient is not connected; see
    /// [`upgrade`](Self::upgrade) for the Narrator case.
    pub fn message(
        &mut self,
        from: &str,
        msg: TextMessage,
    ) -> Result<Outbox, WorldError> {
        if msg.recipient == NARRATOR {
            return self.upgrade(from);
        }
        self.players.require(from)?;
        let Some(recipient) = self.players.get(&msg.recipient) else {
            return Err(WorldError::NoTarget(format!(
                "{} is not in the server",
                msg.recipient
            )));
        };

        let mut outbox = Outbox::new();
        outbox.push(
            recipient,
            Message::Message(TextMessage {
                recipient: msg.recipient.clone(),
                sender: from.to_string(),
                narration: false,
                text: msg.text,
            }),
        );
        tracing::debug!(sender = %from, recipient = %msg.recipient, "message relayed");
        Ok(outbox)
    }

    /// Spends gold in the Barracks on a stat increase.
    ///
    /// The upgraded character is sent to every connected player.
    ///
    /// # Errors
    /// `StatError` if the player is not in the Barracks, cannot afford
    /// it, or would pass the stat limit.
    pub fn upgrade(&mut self, name: &str) -> Result<Outbox, WorldError> {
        let cost = self.config.upgrade_cost;
        let step = self.config.upgrade_step;
        let limit = self.config.stat_limit;

        let player = self.players.require_mut(name)?;
        let c = &mut player.character;
        if c.gold < cost || c.room != BARRACKS {
            return Err(WorldError::StatError(format!(
                "You must be in the Battle School Barracks with at least {cost} gold to upgrade your stats"
            )));
        }
        let total = c.stat_total();
        if total + 3 * u32::from(step) > u32::from(limit) {
            return Err(WorldError::StatError(format!(
                "Your stat sum of {total} is too high to upgrade any further"
            )));
        }
        c.attack = c.attack.saturating_add(step);
        c.defense = c.defense.saturating_add(step);
        c.regen = c.regen.saturating_add(step);
        c.gold -= cost;
        let update = Message::Character(c.clone());
        tracing::info!(player = %name, "stats upgraded");

        let mut outbox = Outbox::new();
        outbox.broadcast(self.players.iter(), &update);
        Ok(outbox)
    }

    /// Moves a player to a connected, unlocked room.
    ///
    /// Entering the Barracks revives the player at starting health. The
    /// mover receives the new room view; players left behind and players
    /// in the destination receive the mover's updated character.
    ///
    /// # Errors
    /// `BadRoom` if the destination is not connected, not unlocked for
    /// this player, or does not exist. The player does not move.
    pub fn change_room(
        &mut self,
        name: &str,
        to: u16,
    ) -> Result<Outbox, WorldError> {
        let player = self.players.require(name)?;
        let from = player.room();
        if !self.map.can_move(player, from, to) {
            return Err(WorldError::BadRoom(format!(
                "rooms {from} and {to} are not connected"
            )));
        }
        if self.map.get(to).is_none() {
            return Err(WorldError::BadRoom(format!("invalid room number {to}")));
        }

        let starting_health = self.config.starting_health;
        let player = self.players.require_mut(name)?;
        player.character.room = to;
        if to == BARRACKS {
            player.character.set_alive(true);
            player.character.health = starting_health;
        }
        let update = Message::Character(player.character.clone());

        let mut outbox = Outbox::new();
        let player = self.players.require(name)?;
        for msg in self.room_view(player) {
            outbox.push(player, msg);
        }
        outbox.broadcast(self.players.in_room_except(from, name), &update);
        outbox.broadcast(self.players.in_room_except(to, name), &update);

        tracing::info!(player = %name, from, to, "player changed room");
        Ok(outbox)
    }

    /// Fights every living monster in the player's room, one exchange each.
    ///
    /// The sweep stops early if the player dies. Each monster killed
    /// while the player survives awards its gold, and killing the Hive
    /// Queen or the Formic Fleet records progress. Afterwards the player
    /// receives every character in the room, and a defeat notice if they
    /// died. The cocoon is never part of a sweep.
    ///
    /// # Errors
    /// - `NoFight` if the player is dead or no living monster is here
    /// - `Other` if the only living target is the cocoon
    pub fn fight(
        &mut self,
        name: &str,
        now: Instant,
    ) -> Result<FightOutcome, WorldError> {
        let player = self.players.require_mut(name)?;
        if !player.character.is_alive() {
            return Err(WorldError::NoFight(format!(
                "{name}, you cannot fight when you are dead"
            )));
        }
        let room = player.room();
        let (cocoon, targets): (Vec<String>, Vec<String>) = self
            .monsters
            .alive_in_room(room)
            .into_iter()
            .partition(|m| m == COCOON);
        if targets.is_empty() {
            if !cocoon.is_empty() {
                return Err(WorldError::Other(COCOON_NEEDS_PVP.to_string()));
            }
            let room_name = self
                .map
                .get(room)
                .map(|n| n.room.name.as_str())
                .unwrap_or_default();
            return Err(WorldError::NoFight(format!(
                "No live monsters to fight in the room {room_name}"
            )));
        }

        let mut outcome = FightOutcome::default();
        for target in targets {
            let Some(monster) = self.monsters.get_mut(&target) else {
                continue;
            };
            monster.last_engaged = Some(now);
            let exchange =
                resolve_fight(&mut player.character, &mut monster.character);

            if exchange.b_died {
                tracing::info!(player = %name, monster = %target, "monster killed");
                if player.character.is_alive() {
                    player.character.gold =
                        player.character.gold.saturating_add(monster.reward);
                }
                match target.as_str() {
                    HIVE_QUEEN => player.killed_queen = true,
                    FORMIC_FLEET => player.killed_fleet = true,
                    _ => {}
                }
                outcome.killed.push(target.clone());
            }
            outcome.engaged.push(target);
            if !player.character.is_alive() {
                break;
            }
        }
        let died = !player.character.is_alive();

        let player = self.players.require(name)?;
        for msg in self.characters_in_room(room) {
            outcome.outbox.push(player, msg);
        }
        if died {
            tracing::info!(player = %name, "player died fighting monsters");
            outcome.outbox.push(player, narrate(name, LOST_IN_BATTLE));
        }
        Ok(outcome)
    }

    /// Fights one named target: another player in the same room, or the
    /// cocoon.
    ///
    /// The target is told who engaged them before the exchange. Both
    /// sides then receive every character in the room, and each side that
    /// died receives a defeat notice.
    ///
    /// # Errors
    /// - `NoPvp` for a self-target or a monster other than the cocoon
    /// - `NoTarget` for an unknown name
    /// - `NoFight` if the target is elsewhere or either side is dead
    pub fn pvp_fight(
        &mut self,
        name: &str,
        target: &str,
        now: Instant,
    ) -> Result<FightOutcome, WorldError> {
        if target == COCOON {
            return self.fight_cocoon(name, now);
        }
        if target == name {
            return Err(WorldError::NoPvp("You cannot fight yourself".into()));
        }
        let attacker = self.players.require(name)?;
        let Some(defender) = self.players.get(target) else {
            if self.monsters.get(target).is_some() {
                return Err(WorldError::NoPvp(format!(
                    "{target} is not a player; use FIGHT"
                )));
            }
            return Err(WorldError::NoTarget(format!(
                "{target} is not in the server"
            )));
        };
        if attacker.room() != defender.room() {
            return Err(WorldError::NoFight(format!(
                "{target} is not in the same room as you"
            )));
        }
        if !attacker.character.is_alive() {
            return Err(WorldError::NoFight(format!(
                "{name}, you cannot fight when you are dead"
            )));
        }
        if !defender.character.is_alive() {
            return Err(WorldError::NoFight(format!("{target} is already dead!")));
        }

        let mut outcome = FightOutcome::default();
        outcome.outbox.push(
            defender,
            narrate(target, format!("You have been engaged in combat by {name}!")),
        );

        let room = attacker.room();
        let mut a = attacker.character.clone();
        let mut b = defender.character.clone();
        let exchange = resolve_fight(&mut a, &mut b);
        self.players.require_mut(name)?.character = a;
        self.players.require_mut(target)?.character = b;
        tracing::info!(
            attacker = %name,
            defender = %target,
            attacker_died = exchange.a_died,
            defender_died = exchange.b_died,
            "pvp exchange"
        );

        let view = self.characters_in_room(room);
        let attacker = self.players.require(name)?;
        let defender = self.players.require(target)?;
        for msg in &view {
            outcome.outbox.push(attacker, msg.clone());
        }
        for msg in view {
            outcome.outbox.push(defender, msg);
        }
        if exchange.a_died {
            outcome.outbox.push(attacker, narrate(name, LOST_IN_BATTLE));
        }
        if exchange.b_died {
            outcome.outbox.push(defender, narrate(target, LOST_IN_BATTLE));
        }
        Ok(outcome)
    }

    fn fight_cocoon(
        &mut self,
        name: &str,
        now: Instant,
    ) -> Result<FightOutcome, WorldError> {
        let player = self.players.require_mut(name)?;
        let Some(cocoon) = self.monsters.get_mut(COCOON) else {
            return Err(WorldError::NoTarget(format!("{COCOON} is not here")));
        };
        if player.room() != cocoon.character.room {
            return Err(WorldError::NoFight(format!(
                "{COCOON} is not in the same room as you"
            )));
        }
        if !player.character.is_alive() {
            return Err(WorldError::NoFight(format!(
                "{name}, you cannot fight when you are dead"
            )));
        }
        if !cocoon.character.is_alive() {
            return Err(WorldError::NoFight(format!("{COCOON} is already dead!")));
        }

        cocoon.last_engaged = Some(now);
        let exchange =
            resolve_fight(&mut player.character, &mut cocoon.character);
        let room = player.room();

        let mut outcome = FightOutcome {
            engaged: vec![COCOON.to_string()],
            ..FightOutcome::default()
        };
        let player = self.players.require(name)?;
        if exchange.b_died {
            tracing::info!(player = %name, "cocoon destroyed");
            outcome.killed.push(COCOON.to_string());
            outcome.outbox.push(player, narrate(name, XENOCIDE));
        }
        for msg in self.characters_in_room(room) {
            outcome.outbox.push(player, msg);
        }
        if exchange.a_died {
            outcome.outbox.push(player, narrate(name, LOST_IN_BATTLE));
        }
        Ok(outcome)
    }

    /// Accepted and ignored: there is nothing to loot yet.
    pub fn loot(&mut self, name: &str, target: &str) -> Result<Outbox, WorldError> {
        self.players.require(name)?;
        tracing::debug!(player = %name, %target, "loot ignored");
        Ok(Outbox::new())
    }

    /// Accepted and ignored: characters cannot be edited mid-game.
    pub fn update_character(
        &mut self,
        name: &str,
        _character: Character,
    ) -> Result<Outbox, WorldError> {
        self.players.require(name)?;
        tracing::debug!(player = %name, "character update ignored");
        Ok(Outbox::new())
    }

    /// Removes a player.
    ///
    /// Everyone left in their room receives the player's character with
    /// room 0 and a departure notice. Unknown names are ignored, so this
    /// is safe to call from every cleanup path.
    pub fn leave(&mut self, name: &str) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(mut player) = self.players.remove(name) else {
            return outbox;
        };
        let room = player.room();
        player.character.room = 0;

        let update = Message::Character(player.character);
        let notice = format!("{name} left the server!");
        for other in self.players.in_room(room) {
            outbox.push(other, update.clone());
            outbox.push(other, narrate(other.name(), notice.as_str()));
        }
        tracing::info!(player = %name, room, "player left");
        outbox
    }

    /// Re-evaluates a player's unlocks after an action.
    ///
    /// A player in the Barracks who can afford an upgrade is reminded of
    /// it. Gold past the Eros threshold opens Eros; killing the Hive Queen
    /// opens Earth and Shakespeare Colony; destroying the Formic Fleet
    /// opens the Formic Home World. Connections are re-sent only when the
    /// unlocked set actually changed.
    pub fn refresh_status(&mut self, name: &str) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(player) = self.players.get_mut(name) else {
            return outbox;
        };

        let cost = self.config.upgrade_cost;
        if player.character.gold >= cost && player.room() == BARRACKS {
            let prompt = format!(
                "Looks like some of your hard work is paying off, spend {cost} gold to upgrade your stats. (Message {NARRATOR} to increase all stats by {} points)",
                self.config.upgrade_step
            );
            outbox.push(player, narrate(name, prompt));
        }

        let before = player.unlocked_rooms();
        if player.character.gold > self.config.eros_gold {
            player.allowed_rooms.insert(EROS, true);
        }
        if player.killed_queen {
            player.allowed_rooms.insert(EARTH, true);
            player.allowed_rooms.insert(SHAKESPEARE, true);
        }
        if player.killed_fleet {
            player.allowed_rooms.insert(FORMIC_HOME_WORLD, true);
        }
        if player.unlocked_rooms() == before {
            return outbox;
        }

        tracing::info!(player = %name, rooms = ?player.unlocked_rooms(), "rooms unlocked");
        if let Some(node) = self.map.get(player.room()) {
            for conn in node.visible_to(player) {
                outbox.push(player, Message::Connection(conn.clone()));
            }
        }
        outbox
    }

    /// Heals a monster that has been left alone for the heal duration.
    ///
    /// Does nothing if it was engaged more recently than that. Otherwise
    /// the monster returns to full health and every player in its room
    /// receives its character.
    pub fn heal(&mut self, name: &str, now: Instant) -> Outbox {
        let mut outbox = Outbox::new();
        let heal_after = self.config.heal_after();
        let Some(monster) = self.monsters.get_mut(name) else {
            return outbox;
        };
        if !monster.idle_for(heal_after, now) {
            tracing::debug!(monster = %name, "re-engaged since timer was armed");
            return outbox;
        }
        monster.heal();
        let room = monster.character.room;
        let update = Message::Character(monster.character.clone());
        outbox.broadcast(self.players.in_room(room), &update);
        tracing::info!(monster = %name, room, "monster healed");
        outbox
    }
}

//! The room graph. Fixed at startup and never mutated, so it is read
//! freely while the world lock is held for other reasons.

use std::collections::BTreeMap;

use lurk_protocol::{Connection, Room};
use lurk_session::Player;

/// One room and its outgoing connections.
#[derive(Debug, Clone)]
pub struct RoomNode {
    pub room: Room,
    /// Navigable edges, in the order they are listed to players. Secret
    /// edges are included; the per-player gate decides what is shown.
    pub connections: Vec<Connection>,
}

impl RoomNode {
    /// Returns `true` if an edge leads from this room to `target`.
    pub fn links_to(&self, target: u16) -> bool {
        self.connections.iter().any(|c| c.number == target)
    }

    /// The connections this player is allowed to see.
    pub fn visible_to<'a>(
        &'a self,
        player: &'a Player,
    ) -> impl Iterator<Item = &'a Connection> {
        self.connections
            .iter()
            .filter(move |c| player.may_enter(c.number))
    }
}

/// Every room, keyed by room number.
#[derive(Debug, Clone, Default)]
pub struct WorldMap {
    rooms: BTreeMap<u16, RoomNode>,
}

impl WorldMap {
    pub fn new(rooms: BTreeMap<u16, RoomNode>) -> Self {
        Self { rooms }
    }

    pub fn get(&self, number: u16) -> Option<&RoomNode> {
        self.rooms.get(&number)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoomNode> {
        self.rooms.values()
    }

    /// Returns `true` if `player` may walk from `from` to `to`.
    ///
    /// The edge must exist and the destination must be unlocked for the
    /// player. A locked edge is indistinguishable from a missing one.
    pub fn can_move(&self, player: &Player, from: u16, to: u16) -> bool {
        self.get(from)
            .is_some_and(|node| node.links_to(to) && player.may_enter(to))
    }
}

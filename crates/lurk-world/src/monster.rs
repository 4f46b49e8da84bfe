//! Monsters: server-owned characters that revive after being left alone.

use std::collections::BTreeMap;

use lurk_protocol::Character;
use tokio::time::Instant;

/// A monster and its bookkeeping.
#[derive(Debug, Clone)]
pub struct Monster {
    /// What players see. Mutated by combat and healing.
    pub character: Character,
    /// Health restored by a heal.
    pub heal_to: i16,
    /// Gold awarded to the player who kills it.
    pub reward: u16,
    /// When it was last drawn into a fight.
    pub last_engaged: Option<Instant>,
}

impl Monster {
    pub fn new(character: Character, heal_to: i16, reward: u16) -> Self {
        Self {
            character,
            heal_to,
            reward,
            last_engaged: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.character.name
    }

    /// Returns `true` if nothing has fought it for at least `idle` as of
    /// `now`.
    pub fn idle_for(&self, idle: std::time::Duration, now: Instant) -> bool {
        match self.last_engaged {
            Some(at) => now.saturating_duration_since(at) >= idle,
            None => true,
        }
    }

    /// Restores full health and revives.
    pub fn heal(&mut self) {
        self.character.health = self.heal_to;
        self.character.set_alive(true);
    }
}

/// All monsters, keyed and ordered by name.
#[derive(Debug, Clone, Default)]
pub struct MonsterRoster {
    monsters: BTreeMap<String, Monster>,
}

impl MonsterRoster {
    pub fn get(&self, name: &str) -> Option<&Monster> {
        self.monsters.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Monster> {
        self.monsters.get_mut(name)
    }

    pub fn len(&self) -> usize {
        self.monsters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monsters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// Monsters standing in `room`, dead or alive.
    pub fn in_room(&self, room: u16) -> impl Iterator<Item = &Monster> {
        self.monsters
            .values()
            .filter(move |m| m.character.room == room)
    }

    /// Names of living monsters in `room`.
    pub fn alive_in_room(&self, room: u16) -> Vec<String> {
        self.in_room(room)
            .filter(|m| m.character.is_alive())
            .map(|m| m.name().to_string())
            .collect()
    }
}

impl FromIterator<Monster> for MonsterRoster {
    fn from_iter<I: IntoIterator<Item = Monster>>(iter: I) -> Self {
        Self {
            monsters: iter
                .into_iter()
                .map(|m| (m.name().to_string(), m))
                .collect(),
        }
    }
}

//! The player registry: every registered player, keyed by name.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is a plain `HashMap` wrapper with no locking of its
//! own. It lives inside the world, and the world is only ever touched
//! through the single world lock.

use std::collections::HashMap;

use lurk_protocol::Character;

use crate::{Player, SessionError};

/// All players that have passed registration and not yet left.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: HashMap<String, Player>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a submitted character against the registration rules.
    ///
    /// # Errors
    /// - [`SessionError::StatError`] if attack + defense + regen exceeds
    ///   `initial_points`
    /// - [`SessionError::AlreadyExists`] if the name is taken
    pub fn validate(
        &self,
        character: &Character,
        initial_points: u16,
    ) -> Result<(), SessionError> {
        let total = character.stat_total();
        if total > u32::from(initial_points) {
            return Err(SessionError::StatError {
                total,
                limit: initial_points,
            });
        }
        if self.players.contains_key(&character.name) {
            return Err(SessionError::AlreadyExists(character.name.clone()));
        }
        Ok(())
    }

    /// Adds a player.
    ///
    /// # Errors
    /// [`SessionError::AlreadyExists`] if the name is taken.
    pub fn insert(&mut self, player: Player) -> Result<(), SessionError> {
        let name = player.name().to_string();
        if self.players.contains_key(&name) {
            return Err(SessionError::AlreadyExists(name));
        }
        tracing::info!(player = %name, "player registered");
        self.players.insert(name, player);
        Ok(())
    }

    /// Removes a player, returning the record if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Player> {
        let removed = self.players.remove(name);
        if removed.is_some() {
            tracing::info!(player = %name, "player removed");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Option<&Player> {
        self.players.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.get_mut(name)
    }

    /// Like [`get`](Self::get), but a missing player is an error.
    pub fn require(&self, name: &str) -> Result<&Player, SessionError> {
        self.get(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    /// Like [`get_mut`](Self::get_mut), but a missing player is an error.
    pub fn require_mut(
        &mut self,
        name: &str,
    ) -> Result<&mut Player, SessionError> {
        self.players
            .get_mut(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Players standing in `room`.
    pub fn in_room(&self, room: u16) -> impl Iterator<Item = &Player> {
        self.players.values().filter(move |p| p.room() == room)
    }

    /// Players standing in `room`, other than `except`.
    pub fn in_room_except<'a>(
        &'a self,
        room: u16,
        except: &'a str,
    ) -> impl Iterator<Item = &'a Player> {
        self.in_room(room).filter(move |p| p.name() != except)
    }
}

#[cfg(test)]
mod tests {
    use lurk_protocol::ErrorCode;
    use lurk_transport::ConnectionId;
    use tokio::sync::mpsc;

    use super::*;

    fn character(name: &str, attack: u16, defense: u16, regen: u16) -> Character {
        Character {
            name: name.into(),
            attack,
            defense,
            regen,
            ..Character::default()
        }
    }

    fn player(name: &str, room: u16) -> Player {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut c = character(name, 0, 0, 0);
        c.room = room;
        Player::new(c, ConnectionId::new(1), tx, HashMap::new())
    }

    // =====================================================================
    // Validation
    // =====================================================================

    #[test]
    fn test_stat_total_at_budget_is_accepted() {
        let registry = PlayerRegistry::new();
        assert_eq!(registry.validate(&character("Ender", 40, 30, 30), 100), Ok(()));
    }

    #[test]
    fn test_stat_total_over_budget_is_rejected() {
        let registry = PlayerRegistry::new();
        let err = registry
            .validate(&character("Ender", 40, 30, 31), 100)
            .unwrap_err();
        assert_eq!(err, SessionError::StatError { total: 101, limit: 100 });
        assert_eq!(err.code(), ErrorCode::StatError);
    }

    #[test]
    fn test_huge_stats_do_not_wrap() {
        let registry = PlayerRegistry::new();
        let err = registry
            .validate(&character("Ender", u16::MAX, u16::MAX, 2), 100)
            .unwrap_err();
        assert!(matches!(err, SessionError::StatError { .. }));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = PlayerRegistry::new();
        registry.insert(player("Bean", 1)).unwrap();

        let err = registry
            .validate(&character("Bean", 10, 10, 10), 100)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::PlayerAlreadyExists);
        assert!(registry.insert(player("Bean", 2)).is_err());
        assert_eq!(registry.len(), 1);
    }

    // =====================================================================
    // Lookup
    // =====================================================================

    #[test]
    fn test_in_room_filters_by_room() {
        let mut registry = PlayerRegistry::new();
        registry.insert(player("Alai", 1)).unwrap();
        registry.insert(player("Shen", 1)).unwrap();
        registry.insert(player("Dink", 3)).unwrap();

        let mut names: Vec<&str> =
            registry.in_room(1).map(Player::name).collect();
        names.sort_unstable();
        assert_eq!(names, ["Alai", "Shen"]);

        let others: Vec<&str> =
            registry.in_room_except(1, "Alai").map(Player::name).collect();
        assert_eq!(others, ["Shen"]);
    }

    #[test]
    fn test_require_missing_player() {
        let registry = PlayerRegistry::new();
        let err = registry.require("Nobody").unwrap_err();
        assert_eq!(err.code(), ErrorCode::NoTarget);
    }

    #[test]
    fn test_remove_frees_the_name() {
        let mut registry = PlayerRegistry::new();
        registry.insert(player("Petra", 3)).unwrap();
        assert!(registry.remove("Petra").is_some());
        assert!(registry.remove("Petra").is_none());
        assert!(registry.validate(&character("Petra", 1, 1, 1), 100).is_ok());
    }
}

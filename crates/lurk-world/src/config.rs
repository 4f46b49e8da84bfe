//! Game rules and constants.

use std::time::Duration;

use lurk_protocol::{GameInfo, Message, Version};
use serde::{Deserialize, Serialize};

use crate::content::GAME_DESCRIPTION;

/// Tunable rules of the game.
///
/// Every field has a default, so a config file only needs to name what it
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Stat points a new character may spend on attack, defense and regen.
    pub initial_points: u16,

    /// Ceiling on the stat sum, advertised to clients and enforced on
    /// upgrades.
    pub stat_limit: u16,

    pub version_major: u8,
    pub version_minor: u8,

    /// How long a monster must be left alone before it heals.
    pub heal_after_secs: u64,

    /// Health of a new character, and of one revived in the Barracks.
    pub starting_health: i16,

    /// Gold spent by one upgrade.
    pub upgrade_cost: u16,

    /// Points added to each of attack, defense and regen by one upgrade.
    pub upgrade_step: u16,

    /// Holding more than this much gold unlocks Eros.
    pub eros_gold: u16,

    /// A character with this name starts with every secret room open.
    /// Empty disables it.
    pub debug_player: String,

    pub description: String,
}

impl GameConfig {
    pub fn heal_after(&self) -> Duration {
        Duration::from_secs(self.heal_after_secs)
    }

    /// The `Game` frame sent at handshake.
    pub fn game_info(&self) -> Message {
        Message::Game(GameInfo {
            initial_points: self.initial_points,
            stat_limit: self.stat_limit,
            description: self.description.clone(),
        })
    }

    /// The `Version` frame sent at handshake. No extensions are offered.
    pub fn version(&self) -> Message {
        Message::Version(Version {
            major: self.version_major,
            minor: self.version_minor,
            extensions: Vec::new(),
        })
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_points: 100,
            stat_limit: u16::MAX,
            version_major: 2,
            version_minor: 3,
            heal_after_secs: 10,
            starting_health: 100,
            upgrade_cost: 50,
            upgrade_step: 5,
            eros_gold: 100,
            debug_player: "Beans Shumaker".to_string(),
            description: GAME_DESCRIPTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.initial_points, 100);
        assert_eq!(config.stat_limit, 65535);
        assert_eq!(config.heal_after(), Duration::from_secs(10));
        assert_eq!(
            config.version(),
            Message::Version(Version {
                major: 2,
                minor: 3,
                extensions: vec![],
            })
        );
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config: GameConfig =
            toml::from_str("initial_points = 120\nheal_after_secs = 3").unwrap();
        assert_eq!(config.initial_points, 120);
        assert_eq!(config.heal_after(), Duration::from_secs(3));
        assert_eq!(config.upgrade_cost, 50);
        assert_eq!(config.debug_player, "Beans Shumaker");
    }
}

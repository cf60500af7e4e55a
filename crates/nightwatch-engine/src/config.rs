//! Game configuration: what a lobby hands to `START_GAME`.

use nightwatch_protocol::{Role, RoleChoice};
use serde::{Deserialize, Serialize};

use crate::{EngineError, RoleDistribution};

/// Smallest supported table.
pub const MIN_PLAYERS: usize = 5;

/// Largest supported table.
pub const MAX_PLAYERS: usize = 100;

/// Settings for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    /// Total seats, human included. Must be in `MIN_PLAYERS..=MAX_PLAYERS`.
    pub player_count: usize,

    /// The role the human asks for.
    pub selected_role: RoleChoice,

    /// Display name for the human seat.
    pub human_name: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 8,
            selected_role: RoleChoice::Random,
            human_name: "You".to_string(),
        }
    }
}

impl GameConfig {
    /// A config with the given size and role choice, other fields default.
    pub fn new(player_count: usize, selected_role: RoleChoice) -> Self {
        Self {
            player_count,
            selected_role,
            ..Self::default()
        }
    }

    /// Checks the config can produce a game.
    ///
    /// Rejects a player count outside the supported range, and a
    /// concrete role that does not occur at this table size (for
    /// example an Accomplice at five players).
    pub fn validated(self) -> Result<Self, EngineError> {
        let distribution = RoleDistribution::for_player_count(self.player_count)?;
        if let RoleChoice::Role(role) = self.selected_role {
            if distribution.count(role) == 0 {
                return Err(EngineError::InvalidConfig(format!(
                    "role {role} is not dealt at {} players",
                    self.player_count
                )));
            }
        }
        if self.human_name.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "human name must not be empty".into(),
            ));
        }
        Ok(self)
    }

    /// The concrete role requested, if any.
    pub fn requested_role(&self) -> Option<Role> {
        match self.selected_role {
            RoleChoice::Random => None,
            RoleChoice::Role(role) => Some(role),
        }
    }
}

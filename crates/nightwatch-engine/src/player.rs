//! A seat at the table.

use nightwatch_protocol::{DeathCause, Faction, PlayerId, Role};
use serde::{Deserialize, Serialize};

/// One player. Created at game start, never removed; death only flips
/// `is_alive` and records how and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub role: Role,
    pub is_alive: bool,
    pub is_ai: bool,
    /// Set once any investigator has checked this player.
    pub checked_by_investigator: bool,
    /// `Some(true)` if the latest check found a saboteur.
    pub last_check_result: Option<bool>,
    pub death_cause: Option<DeathCause>,
    pub death_day: Option<u32>,
    /// Votes received in the most recent day settlement.
    pub votes_received: Option<u32>,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, role: Role, is_ai: bool) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            is_alive: true,
            is_ai,
            checked_by_investigator: false,
            last_check_result: None,
            death_cause: None,
            death_day: None,
            votes_received: None,
        }
    }

    pub fn faction(&self) -> Faction {
        self.role.faction()
    }

    /// Checked and found to be a saboteur.
    pub fn is_exposed_saboteur(&self) -> bool {
        self.checked_by_investigator && self.last_check_result == Some(true)
    }

    /// Checked and found not to be a saboteur.
    pub fn is_cleared(&self) -> bool {
        self.checked_by_investigator && self.last_check_result == Some(false)
    }

    pub(crate) fn kill(&mut self, cause: DeathCause, day: u32) {
        self.is_alive = false;
        self.death_cause = Some(cause);
        self.death_day = Some(day);
    }
}

//! Win conditions, checked after every settlement.

use nightwatch_protocol::{Faction, Role};
use serde::{Deserialize, Serialize};

use crate::Player;

pub const SABOTEURS_ELIMINATED: &str = "saboteurs eliminated";
pub const GOOD_FACTION_ELIMINATED: &str = "good faction eliminated";

/// A decided game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub winner: Faction,
    pub reason: String,
}

/// `Some(verdict)` if a faction has won, `None` to keep playing.
///
/// Good wins as soon as no saboteur is alive, even with accomplices left.
/// Evil wins when no good player is alive. The saboteur check runs first,
/// so a board where both hold resolves to good.
pub fn evaluate(players: &[Player]) -> Option<Verdict> {
    let mut alive_saboteurs = 0usize;
    let mut alive_good = 0usize;
    for player in players.iter().filter(|p| p.is_alive) {
        match player.role {
            Role::Saboteur => alive_saboteurs += 1,
            Role::Accomplice => {}
            Role::Civilian | Role::Investigator | Role::Protector => alive_good += 1,
        }
    }

    if alive_saboteurs == 0 {
        Some(Verdict {
            winner: Faction::Good,
            reason: SABOTEURS_ELIMINATED.to_string(),
        })
    } else if alive_good == 0 {
        Some(Verdict {
            winner: Faction::Evil,
            reason: GOOD_FACTION_ELIMINATED.to_string(),
        })
    } else {
        None
    }
}

//! Role dealing.
//!
//! Small tables (up to ten seats) use a fixed lookup; larger tables use
//! percentages with per-role floors, civilians taking the remainder.

use nightwatch_protocol::Role;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{MAX_PLAYERS, MIN_PLAYERS};
use crate::{EngineError, GameConfig, GameRng};

/// How many of each role are dealt at a given table size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDistribution {
    pub saboteur: usize,
    pub accomplice: usize,
    pub civilian: usize,
    pub investigator: usize,
    pub protector: usize,
}

impl RoleDistribution {
    const fn of(
        saboteur: usize,
        accomplice: usize,
        civilian: usize,
        investigator: usize,
        protector: usize,
    ) -> Self {
        Self {
            saboteur,
            accomplice,
            civilian,
            investigator,
            protector,
        }
    }

    /// The distribution for `player_count` seats.
    ///
    /// # Errors
    /// `InvalidConfig` when the count is outside `5..=100`.
    pub fn for_player_count(player_count: usize) -> Result<Self, EngineError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(EngineError::InvalidConfig(format!(
                "player count {player_count} outside {MIN_PLAYERS}..={MAX_PLAYERS}"
            )));
        }

        let table = match player_count {
            5 => Some(Self::of(1, 0, 2, 1, 1)),
            6 => Some(Self::of(1, 1, 2, 1, 1)),
            7 => Some(Self::of(1, 1, 3, 1, 1)),
            8 => Some(Self::of(1, 1, 3, 1, 2)),
            9 => Some(Self::of(1, 1, 4, 1, 2)),
            10 => Some(Self::of(1, 1, 5, 1, 2)),
            _ => None,
        };
        if let Some(distribution) = table {
            return Ok(distribution);
        }

        // Integer forms of floor(0.10 n), floor(0.05 n), floor(0.15 n).
        let saboteur = (player_count / 10).max(1);
        let accomplice = (player_count / 20).max(1);
        let investigator = (player_count / 10).max(2);
        let protector = (player_count * 15 / 100).max(2);
        let special = saboteur + accomplice + investigator + protector;
        let civilian = player_count.checked_sub(special).ok_or_else(|| {
            EngineError::InvalidConfig(format!(
                "{special} special roles do not fit {player_count} seats"
            ))
        })?;

        Ok(Self::of(saboteur, accomplice, civilian, investigator, protector))
    }

    /// How many copies of `role` are dealt.
    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::Saboteur => self.saboteur,
            Role::Accomplice => self.accomplice,
            Role::Civilian => self.civilian,
            Role::Investigator => self.investigator,
            Role::Protector => self.protector,
        }
    }

    /// Total seats covered.
    pub fn total(&self) -> usize {
        Role::ALL.iter().map(|role| self.count(*role)).sum()
    }

    /// The multiset as a flat list, in `Role::ALL` order.
    pub fn pool(&self) -> Vec<Role> {
        Role::ALL
            .iter()
            .flat_map(|role| std::iter::repeat_n(*role, self.count(*role)))
            .collect()
    }
}

/// Deals one role per seat. Index 0 is the human seat.
///
/// A requested role that is present in the multiset goes to the human;
/// otherwise the human draws uniformly from the full multiset. The rest
/// are shuffled over the AI seats.
pub fn assign_roles(config: &GameConfig, rng: &mut GameRng) -> Result<Vec<Role>, EngineError> {
    let distribution = RoleDistribution::for_player_count(config.player_count)?;
    let mut pool = distribution.pool();

    let requested = config
        .requested_role()
        .and_then(|role| pool.iter().position(|r| *r == role));
    let human_index = match requested {
        Some(index) => index,
        None => rng.index(pool.len()),
    };
    let human_role = pool.remove(human_index);

    rng.shuffle(&mut pool);

    let mut roles = Vec::with_capacity(config.player_count);
    roles.push(human_role);
    roles.extend(pool);

    debug!(
        players = roles.len(),
        human_role = %human_role,
        saboteurs = distribution.saboteur,
        "roles dealt"
    );
    Ok(roles)
}

//! Batch resolution of a completed interactive phase.
//!
//! Both functions take the collector that was just closed, mutate the
//! players in `state`, append narration, and return an immutable record
//! of what happened. Neither depends on submission order except for the
//! order of narration lines.

use std::collections::BTreeMap;

use nightwatch_protocol::{DeathCause, NightActionKind, Phase, PlayerId, Role};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{DayVotes, EntryKind, GameRng, GameState, NightActions};

// ---------------------------------------------------------------------------
// Day
// ---------------------------------------------------------------------------

/// Votes received by one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTally {
    pub target: PlayerId,
    pub votes: u32,
    /// In submission order.
    pub voters: Vec<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySettlement {
    pub day: u32,
    /// Sorted by votes descending, then by target id.
    pub tally: Vec<VoteTally>,
    pub eliminated: Option<PlayerId>,
    pub cause: Option<DeathCause>,
}

impl DaySettlement {
    /// Votes `id` received; 0 if nobody voted for them.
    pub fn votes_for(&self, id: PlayerId) -> u32 {
        self.tally
            .iter()
            .find(|t| t.target == id)
            .map_or(0, |t| t.votes)
    }
}

/// Tally the day vote and eliminate the top target.
///
/// A unique maximum is eliminated with `Voted`. A tie picks uniformly at
/// random among the tied targets and records `TiedVote`. No votes, no
/// elimination.
pub fn settle_day(state: &mut GameState, votes: &DayVotes, rng: &mut GameRng) -> DaySettlement {
    let day = state.current_day;

    let mut by_target: BTreeMap<PlayerId, Vec<PlayerId>> = BTreeMap::new();
    for submission in votes.submissions() {
        by_target
            .entry(submission.action)
            .or_default()
            .push(submission.actor);
    }

    let max_votes = by_target.values().map(Vec::len).max().unwrap_or(0);
    let top: Vec<PlayerId> = by_target
        .iter()
        .filter(|(_, voters)| voters.len() == max_votes)
        .map(|(target, _)| *target)
        .collect();

    let (eliminated, cause) = match top.as_slice() {
        [] => (None, None),
        [only] => (Some(*only), Some(DeathCause::Voted)),
        tied => (rng.choose(tied).copied(), Some(DeathCause::TiedVote)),
    };

    let mut tally: Vec<VoteTally> = by_target
        .into_iter()
        .map(|(target, voters)| VoteTally {
            target,
            votes: voters.len() as u32,
            voters,
        })
        .collect();
    tally.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.target.cmp(&b.target)));

    for player in &mut state.players {
        player.votes_received = Some(
            tally
                .iter()
                .find(|t| t.target == player.id)
                .map_or(0, |t| t.votes),
        );
    }

    if let (Some(target), Some(cause)) = (eliminated, cause) {
        if let Some(player) = state.player_mut(target) {
            player.kill(cause, day);
        }
    }

    // Narration: the tally block first, then the outcome line.
    let lines: Vec<String> = tally
        .iter()
        .map(|row| {
            let voters: Vec<String> = row.voters.iter().map(|v| state.name_of(*v)).collect();
            format!(
                "{}: {} vote{} ({})",
                state.name_of(row.target),
                row.votes,
                if row.votes == 1 { "" } else { "s" },
                voters.join(", ")
            )
        })
        .collect();
    for line in lines {
        state.log.push(day, Phase::DaySettlement, EntryKind::Vote, line);
    }

    let outcome = match (eliminated, cause) {
        (Some(target), Some(DeathCause::TiedVote)) => {
            let tied: Vec<String> = top.iter().map(|t| state.name_of(*t)).collect();
            format!(
                "The vote was tied between {}. {} was eliminated by lot.",
                tied.join(" and "),
                state.name_of(target)
            )
        }
        (Some(target), _) => format!("{} was voted out.", state.name_of(target)),
        (None, _) => "No votes were cast. Nobody was eliminated.".to_string(),
    };
    state
        .log
        .push(day, Phase::DaySettlement, EntryKind::Death, outcome);

    info!(
        game_id = %state.game_id,
        day,
        eliminated = ?eliminated,
        cause = ?cause,
        "day settled"
    );

    DaySettlement {
        day,
        tally,
        eliminated,
        cause,
    }
}

// ---------------------------------------------------------------------------
// Night
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub investigator: PlayerId,
    pub target: PlayerId,
    pub is_saboteur: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightSettlement {
    pub day: u32,
    pub checks: Vec<CheckOutcome>,
    pub protected: Vec<PlayerId>,
    pub attacked: Vec<PlayerId>,
    /// Attacked and not protected.
    pub deaths: Vec<PlayerId>,
    /// Attacked and protected.
    pub saved: Vec<PlayerId>,
}

impl NightSettlement {
    pub fn is_peaceful(&self) -> bool {
        self.deaths.is_empty()
    }
}

/// Resolve checks, protections and attacks.
///
/// Check results are written onto the target. They are narrated only
/// when the human made the check; AI checks stay out of the shared log.
/// Any protect on a player cancels every attack on them.
pub fn settle_night(state: &mut GameState, actions: &NightActions) -> NightSettlement {
    let day = state.current_day;
    let human = state.human_player_id;

    let mut checks = Vec::new();
    for (investigator, target) in actions.pairs(NightActionKind::Check) {
        let Some(player) = state.player_mut(target) else {
            continue;
        };
        let is_saboteur = match player.role {
            Role::Saboteur => true,
            Role::Accomplice | Role::Civilian | Role::Investigator | Role::Protector => false,
        };
        player.checked_by_investigator = true;
        player.last_check_result = Some(is_saboteur);
        checks.push(CheckOutcome {
            investigator,
            target,
            is_saboteur,
        });

        if investigator == human {
            let verdict = if is_saboteur {
                "IS a Saboteur"
            } else {
                "is not a Saboteur"
            };
            let text = format!(
                "Your investigation shows that {} {verdict}.",
                state.name_of(target)
            );
            state
                .log
                .push(day, Phase::NightSettlement, EntryKind::Reveal, text);
        }
    }

    let protected = actions.targets(NightActionKind::Protect);
    let attacked = actions.targets(NightActionKind::Disgust);
    let deaths: Vec<PlayerId> = attacked.difference(&protected).copied().collect();
    let saved: Vec<PlayerId> = attacked.intersection(&protected).copied().collect();

    for id in &deaths {
        if let Some(player) = state.player_mut(*id) {
            player.kill(DeathCause::Disgusted, day);
        }
    }

    if deaths.is_empty() && saved.is_empty() {
        state.log.push(
            day,
            Phase::NightSettlement,
            EntryKind::Death,
            "The night passed peacefully.",
        );
    }
    for id in &deaths {
        let text = format!("{} was found dead at dawn.", state.name_of(*id));
        state
            .log
            .push(day, Phase::NightSettlement, EntryKind::Death, text);
    }
    for id in &saved {
        let text = format!("{} was attacked but saved.", state.name_of(*id));
        state
            .log
            .push(day, Phase::NightSettlement, EntryKind::Death, text);
    }

    info!(
        game_id = %state.game_id,
        day,
        deaths = deaths.len(),
        saved = saved.len(),
        checks = checks.len(),
        "night settled"
    );

    NightSettlement {
        day,
        checks,
        protected: protected.into_iter().collect(),
        attacked: attacked.into_iter().collect(),
        deaths,
        saved,
    }
}

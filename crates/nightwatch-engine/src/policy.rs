//! Decision policies for AI-controlled seats.
//!
//! A policy sees the whole [`GameState`], including check results that
//! were never narrated to the human.

use nightwatch_protocol::{PlayerId, Role};

use crate::{GameRng, GameState, NightAction, Player};

/// Decides what an AI seat submits.
///
/// Implementations must be pure with respect to the game: read the
/// state, draw from `rng`, return a choice. The scheduler validates and
/// submits the result like any other command.
pub trait DecisionPolicy: Send + Sync + 'static {
    /// The night action for `actor`, or `None` if it has none to make.
    fn night_action(&self, state: &GameState, actor: PlayerId, rng: &mut GameRng)
    -> Option<NightAction>;

    /// The day-vote target for `voter`, or `None` if nobody is eligible.
    fn day_vote(&self, state: &GameState, voter: PlayerId, rng: &mut GameRng) -> Option<PlayerId>;
}

/// The built-in heuristics.
///
/// Night:
/// - Protector shields an investigator, else anyone.
/// - Investigator checks someone unchecked, else anyone.
/// - Saboteur goes after an investigator, else a good player, else anyone.
///
/// Day:
/// - Evil never votes its own faction and prefers players a check has
///   cleared.
/// - Good votes an exposed saboteur when there is one. An investigator
///   skips cleared players. Otherwise the least-voted players of the
///   previous day are the suspects, or anyone on day one.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

fn pick<'a>(rng: &mut GameRng, candidates: impl IntoIterator<Item = &'a Player>) -> Option<PlayerId> {
    let ids: Vec<PlayerId> = candidates.into_iter().map(|p| p.id).collect();
    rng.choose(&ids).copied()
}

impl DecisionPolicy for StandardPolicy {
    fn night_action(
        &self,
        state: &GameState,
        actor: PlayerId,
        rng: &mut GameRng,
    ) -> Option<NightAction> {
        let me = state.player(actor).filter(|p| p.is_alive)?;
        let kind = me.role.night_action()?;
        let others: Vec<&Player> = state.alive_players().filter(|p| p.id != actor).collect();

        let target = match me.role {
            Role::Protector => pick(
                rng,
                others.iter().copied().filter(|p| p.role == Role::Investigator),
            )
            .or_else(|| pick(rng, others.iter().copied())),
            Role::Investigator => pick(
                rng,
                others.iter().copied().filter(|p| !p.checked_by_investigator),
            )
            .or_else(|| pick(rng, others.iter().copied())),
            Role::Saboteur => pick(
                rng,
                others.iter().copied().filter(|p| p.role == Role::Investigator),
            )
            .or_else(|| pick(rng, others.iter().copied().filter(|p| !p.role.is_evil())))
            .or_else(|| pick(rng, others.iter().copied())),
            Role::Accomplice | Role::Civilian => None,
        }?;

        Some(NightAction { kind, target })
    }

    fn day_vote(&self, state: &GameState, voter: PlayerId, rng: &mut GameRng) -> Option<PlayerId> {
        let me = state.player(voter).filter(|p| p.is_alive)?;
        let others: Vec<&Player> = state.alive_players().filter(|p| p.id != voter).collect();

        match me.role {
            Role::Saboteur | Role::Accomplice => {
                let innocents: Vec<&Player> =
                    others.iter().copied().filter(|p| !p.role.is_evil()).collect();
                pick(rng, innocents.iter().copied().filter(|p| p.is_cleared()))
                    .or_else(|| pick(rng, innocents.iter().copied()))
                    .or_else(|| pick(rng, others.iter().copied()))
            }
            Role::Civilian | Role::Investigator | Role::Protector => {
                if let Some(exposed) =
                    pick(rng, others.iter().copied().filter(|p| p.is_exposed_saboteur()))
                {
                    return Some(exposed);
                }

                let mut suspects = others.clone();
                if me.role == Role::Investigator {
                    let uncleared: Vec<&Player> =
                        suspects.iter().copied().filter(|p| !p.is_cleared()).collect();
                    if !uncleared.is_empty() {
                        suspects = uncleared;
                    }
                }

                match &state.last_day_settlement {
                    Some(last) => {
                        let fewest = suspects.iter().map(|p| last.votes_for(p.id)).min()?;
                        pick(
                            rng,
                            suspects
                                .iter()
                                .copied()
                                .filter(|p| last.votes_for(p.id) == fewest),
                        )
                    }
                    None => pick(rng, suspects.iter().copied()),
                }
            }
        }
    }
}

//! The single mutable root of a game, and the read-only views derived from it.
//!
//! `GameState` is owned by [`GameMachine`](crate::GameMachine) and only
//! mutated through its commands. Everything here is either plain data or
//! a `&self` query, so a snapshot clone can be handed to any reader.

use std::collections::BTreeSet;

use nightwatch_protocol::{Faction, GameId, NightActionKind, Phase, PlayerId, Progress};
use serde::{Deserialize, Serialize};

use crate::{DaySettlement, DayVotes, EventLog, NightActions, NightSettlement, Player};

/// The human always sits in seat 1.
pub const HUMAN_PLAYER_ID: PlayerId = PlayerId(1);

/// What an accepted submission was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RecordedAction {
    Vote {
        target: PlayerId,
    },
    Night {
        kind: NightActionKind,
        target: PlayerId,
    },
}

/// One entry of the action history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub day: u32,
    pub phase: Phase,
    pub actor: PlayerId,
    pub action: RecordedAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub game_id: GameId,
    pub current_day: u32,
    pub current_phase: Phase,
    /// Bumped on every phase entry. Timers carry the epoch they were
    /// armed for; a mismatch means the timer is stale.
    pub phase_epoch: u64,
    pub players: Vec<Player>,
    pub human_player_id: PlayerId,
    /// Present only during `dayVoting`.
    pub current_day_votes: Option<DayVotes>,
    /// Present only during `nightAction`.
    pub current_night_actions: Option<NightActions>,
    pub last_day_settlement: Option<DaySettlement>,
    pub last_night_settlement: Option<NightSettlement>,
    pub action_history: Vec<ActionRecord>,
    pub winner: Option<Faction>,
    pub game_end_reason: Option<String>,
    pub log: EventLog,
}

impl GameState {
    /// An empty table waiting for `START_GAME`.
    pub fn new(game_id: GameId) -> Self {
        Self {
            game_id,
            current_day: 1,
            current_phase: Phase::GameStart,
            phase_epoch: 0,
            players: Vec::new(),
            human_player_id: HUMAN_PLAYER_ID,
            current_day_votes: None,
            current_night_actions: None,
            last_day_settlement: None,
            last_night_settlement: None,
            action_history: Vec::new(),
            winner: None,
            game_end_reason: None,
            log: EventLog::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Display name, or the id if the seat is unknown.
    pub fn name_of(&self, id: PlayerId) -> String {
        self.player(id)
            .map_or_else(|| id.to_string(), |p| p.name.clone())
    }

    pub fn human_player(&self) -> Option<&Player> {
        self.player(self.human_player_id)
    }

    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive)
    }

    pub fn alive_count(&self) -> usize {
        self.alive_players().count()
    }

    pub fn is_game_over(&self) -> bool {
        self.current_phase == Phase::GameOver
    }

    /// The required set of the current interactive phase; empty otherwise.
    pub fn required_now(&self) -> BTreeSet<PlayerId> {
        match self.current_phase {
            Phase::DayVoting => self
                .current_day_votes
                .as_ref()
                .map(|v| v.required().clone())
                .unwrap_or_default(),
            Phase::NightAction => self
                .current_night_actions
                .as_ref()
                .map(|n| n.required().clone())
                .unwrap_or_default(),
            Phase::GameStart
            | Phase::NightBegin
            | Phase::NightSettlement
            | Phase::DayBegin
            | Phase::DayDiscussion
            | Phase::DaySettlement
            | Phase::GameOver => BTreeSet::new(),
        }
    }

    /// Whether `id` is required in the current phase and still owes an action.
    pub fn owes_action(&self, id: PlayerId) -> bool {
        match self.current_phase {
            Phase::DayVoting => self
                .current_day_votes
                .as_ref()
                .is_some_and(|v| v.is_required(id) && !v.has_submitted(id)),
            Phase::NightAction => self
                .current_night_actions
                .as_ref()
                .is_some_and(|n| n.is_required(id) && !n.has_submitted(id)),
            _ => false,
        }
    }

    /// True iff the human is alive, required this phase, and has not yet acted.
    pub fn can_act(&self) -> bool {
        self.human_player().is_some_and(|p| p.is_alive) && self.owes_action(self.human_player_id)
    }

    pub fn vote_progress(&self) -> Progress {
        self.current_day_votes
            .as_ref()
            .map(|v| v.progress())
            .unwrap_or_default()
    }

    pub fn night_action_progress(&self) -> Progress {
        self.current_night_actions
            .as_ref()
            .map(|n| n.progress())
            .unwrap_or_default()
    }
}

//! Game rules and the authoritative phase scheduler for Nightwatch.
//!
//! Everything in this crate is synchronous and deterministic given a
//! seed. Time, channels and tasks live in `nightwatch-table`; this crate
//! only answers "what happens when this command arrives".
//!
//! # Key types
//!
//! - [`GameMachine`]: the single writer of a game's state
//! - [`GameState`]: the state itself, cloneable as a snapshot
//! - [`ActionCollector`]: per-phase submission tracking
//! - [`DecisionPolicy`]: how AI seats choose their actions
//! - [`GameConfig`] / [`RoleDistribution`]: setup and role dealing

mod collector;
mod config;
mod error;
mod log;
mod machine;
mod player;
mod policy;
mod rng;
mod roles;
mod settlement;
mod state;
mod win;

pub use collector::{ActionCollector, DayVotes, NightAction, NightActions, Submission};
pub use config::{GameConfig, MAX_PLAYERS, MIN_PLAYERS};
pub use error::EngineError;
pub use log::{EntryKind, EventLog, LogEntry};
pub use machine::GameMachine;
pub use player::Player;
pub use policy::{DecisionPolicy, StandardPolicy};
pub use rng::GameRng;
pub use roles::{RoleDistribution, assign_roles};
pub use settlement::{
    CheckOutcome, DaySettlement, NightSettlement, VoteTally, settle_day, settle_night,
};
pub use state::{ActionRecord, GameState, HUMAN_PLAYER_ID, RecordedAction};
pub use win::{GOOD_FACTION_ELIMINATED, SABOTEURS_ELIMINATED, Verdict, evaluate};

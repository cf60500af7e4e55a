//! Error types for the engine.

use nightwatch_protocol::{Phase, PlayerId};

/// Why a command was rejected.
///
/// Every variant is recoverable: a rejected command leaves the game state
/// exactly as it was, so the caller can correct the input and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The command is not legal in the current phase.
    #[error("cannot {action} during {phase}")]
    InvalidPhase { action: &'static str, phase: Phase },

    /// The actor is unknown, dead, lacks the role for this action, or is
    /// not in the current phase's required set.
    #[error("player {player} may not act: {reason}")]
    UnauthorizedActor {
        player: PlayerId,
        reason: &'static str,
    },

    /// The actor already has a recorded action this phase.
    /// The first submission stands.
    #[error("player {0} has already submitted this phase")]
    DuplicateSubmission(PlayerId),

    /// The target is unknown, dead, or not allowed for this action.
    #[error("invalid target {target}: {reason}")]
    InvalidTarget {
        target: PlayerId,
        reason: &'static str,
    },

    /// `START_GAME` was given a config that cannot produce a game.
    #[error("invalid game config: {0}")]
    InvalidConfig(String),
}

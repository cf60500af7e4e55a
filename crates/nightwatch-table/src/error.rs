//! Error types for the table layer.

use nightwatch_engine::EngineError;
use nightwatch_protocol::{GameId, ProtocolError};

/// Errors that can occur when talking to a table.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// No table with this id is registered.
    #[error("game {0} not found")]
    NotFound(GameId),

    /// The table's actor has stopped or its channel is closed.
    #[error("game {0} is unavailable")]
    Unavailable(GameId),

    /// The engine refused the command. The game state is unchanged.
    #[error(transparent)]
    Rejected(#[from] EngineError),

    /// A wire command could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl TableError {
    /// Whether the caller can retry with a different command.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_) | Self::Protocol(_))
    }
}

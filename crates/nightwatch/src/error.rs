//! Unified error type for Nightwatch.

use nightwatch_engine::EngineError;
use nightwatch_protocol::ProtocolError;
use nightwatch_table::TableError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NightwatchError {
    /// Encoding or decoding a wire message failed.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The engine refused a command (wrong phase, bad target, bad config).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A table could not be found or has stopped.
    #[error(transparent)]
    Table(#[from] TableError),
}

impl NightwatchError {
    /// The engine error underneath, however it was wrapped.
    pub fn as_engine(&self) -> Option<&EngineError> {
        match self {
            Self::Engine(err) | Self::Table(TableError::Rejected(err)) => Some(err),
            Self::Protocol(_) | Self::Table(_) => None,
        }
    }
}

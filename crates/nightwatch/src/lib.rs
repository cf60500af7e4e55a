//! # Nightwatch
//!
//! A turn-based social-deduction game engine. One human and a table of
//! AI seats are dealt hidden roles; nights and days alternate until the
//! saboteurs are voted out or the good faction is gone.
//!
//! The engine is authoritative: every game runs in its own actor task
//! that owns the state, applies commands one at a time, and drives the
//! phase timers and AI turns.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nightwatch::prelude::*;
//!
//! # async fn run() -> Result<(), NightwatchError> {
//! let mut tables = TableManager::new();
//! let game = tables.create_game(TableConfig::default());
//! let mut updates = game.subscribe().await?;
//! game.start(GameConfig::new(8, RoleChoice::Random)).await?;
//!
//! while let Some(update) = updates.recv().await {
//!     if let TableUpdate::Narration(entry) = update {
//!         println!("{}", entry.text);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod error;

pub use error::NightwatchError;

pub use nightwatch_engine as engine;
pub use nightwatch_protocol as protocol;
pub use nightwatch_table as table;
pub use nightwatch_timer as timer;

/// Install a `tracing` subscriber that prints to stderr.
///
/// The filter comes from `RUST_LOG` when set, otherwise `default_filter`
/// (for example `"info"` or `"nightwatch_engine=debug"`). Calling this
/// more than once keeps the first subscriber.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Everything needed to create, drive and observe games.
pub mod prelude {
    pub use crate::NightwatchError;
    pub use nightwatch_engine::{
        DecisionPolicy, EngineError, EntryKind, GameConfig, GameMachine, GameState, LogEntry,
        Player, StandardPolicy,
    };
    pub use nightwatch_protocol::{
        Codec, DeathCause, Faction, GameCommand, GameId, NightActionKind, Phase, PlayerId, Role,
        RoleChoice,
    };
    #[cfg(feature = "json")]
    pub use nightwatch_protocol::JsonCodec;
    pub use nightwatch_table::{GameHandle, TableConfig, TableError, TableManager, TableUpdate};
    pub use nightwatch_timer::PhaseTimings;
}

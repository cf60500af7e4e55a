//! Shared vocabulary for Nightwatch.
//!
//! - **Types** ([`PlayerId`], [`Role`], [`Phase`], [`GameCommand`], ...):
//!   the values that cross crate and wire boundaries.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how commands and
//!   snapshots become bytes.
//! - **Errors** ([`ProtocolError`]): malformed input.
//!
//! ```text
//! Presentation (bytes) → Protocol (GameCommand) → Table actor → Engine
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    DeathCause, Faction, GameCommand, GameId, NightActionKind, Phase, PlayerId, Progress,
    Role, RoleChoice,
};

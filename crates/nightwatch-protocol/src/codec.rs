//! Codec trait and implementations for serializing commands and snapshots.
//!
//! The engine never touches bytes. A presentation collaborator that talks
//! to a table over some byte channel picks a [`Codec`], and the table
//! handle decodes commands with it. [`JsonCodec`] is the only
//! implementation today; it is readable in logs and in browser tools.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so one codec value can be shared by every
/// task that talks to a table.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do
    /// not match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// Behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use nightwatch_protocol::{Codec, GameCommand, JsonCodec, PlayerId};
///
/// let codec = JsonCodec;
/// let cmd = GameCommand::SubmitVote {
///     voter_id: PlayerId(1),
///     target_id: PlayerId(4),
/// };
///
/// let bytes = codec.encode(&cmd).unwrap();
/// let decoded: GameCommand = codec.decode(&bytes).unwrap();
/// assert_eq!(cmd, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{GameCommand, RoleChoice};

    #[test]
    fn test_decode_rejects_unknown_command() {
        let codec = JsonCodec;
        let result: Result<GameCommand, _> = codec.decode(br#"{"type":"CAST_SPELL"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_rejects_unknown_role_choice() {
        let codec = JsonCodec;
        let result: Result<GameCommand, _> =
            codec.decode(br#"{"type":"START_GAME","playerCount":6,"selectedRole":"wizard"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_start_game_defaults_to_random_role() {
        let codec = JsonCodec;
        let cmd: GameCommand = codec
            .decode(br#"{"type":"START_GAME","playerCount":6}"#)
            .unwrap();
        assert_eq!(
            cmd,
            GameCommand::StartGame {
                player_count: 6,
                selected_role: RoleChoice::Random,
            }
        );
    }
}

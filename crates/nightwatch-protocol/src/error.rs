//! Error types for the protocol layer.
//!
//! Each crate in Nightwatch defines its own error enum. A `ProtocolError`
//! always means the bytes or strings coming in were malformed, never that
//! a game rule was broken.

/// Errors that can occur while encoding, decoding or parsing wire values.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (Rust value to bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value parsed but is not a valid protocol value,
    /// e.g. an unknown role name.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

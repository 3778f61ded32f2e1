//! Error types for the protocol layer.

/// Errors raised while turning frames into bytes and back.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serializing a value failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are not a well-formed frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A frame decoded fine but its game payload (join options or an
    /// action) is missing fields or carries wrong-typed values.
    ///
    /// The action is dropped; nothing reaches the room.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The frame violates the protocol itself, e.g. a first frame that is
    /// not a handshake or a version mismatch.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

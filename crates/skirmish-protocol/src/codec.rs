//! Codec trait and the JSON implementation.
//!
//! The rest of the stack only talks to [`Codec`]; swapping JSON for a
//! binary format touches nothing outside this file.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Turns values into bytes and back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a whole frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Deserializes a game payload nested inside a frame.
    ///
    /// Failures here mean the client sent a well-formed frame carrying a
    /// bad action or bad join options, so they are reported as
    /// [`ProtocolError::InvalidPayload`] instead of a frame-level error.
    fn decode_payload<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        self.decode(data)
            .map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
    }
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable frames make browser clients and log inspection easy.
/// Enabled by the default `json` feature.
///
/// ```rust
/// use skirmish_protocol::{Codec, Envelope, JsonCodec, Payload, SystemMessage};
///
/// let codec = JsonCodec;
/// let envelope = Envelope {
///     seq: 1,
///     timestamp: 5000,
///     payload: Payload::System(SystemMessage::Heartbeat { client_time: 5000 }),
/// };
///
/// let bytes = codec.encode(&envelope).unwrap();
/// let decoded: Envelope = codec.decode(&bytes).unwrap();
/// assert_eq!(envelope, decoded);
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

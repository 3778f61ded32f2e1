//! Unified error type for the Skirmish server.

use skirmish_protocol::ProtocolError;
use skirmish_room::RoomError;

use crate::transport::TransportError;

/// Top-level error wrapping every layer's errors.
///
/// `#[from]` on each variant lets `?` convert layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Connection, send or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode/decode failure or a protocol violation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Room missing, full, or otherwise refusing the request.
    #[error(transparent)]
    Room(#[from] RoomError),
}

#[cfg(test)]
mod tests {
    use skirmish_protocol::{RoomId, SessionId};

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::SendFailed(std::io::Error::other("gone"));
        let err: SkirmishError = err.into();
        assert!(matches!(err, SkirmishError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: SkirmishError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, SkirmishError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: SkirmishError = RoomError::NotFound(RoomId(1)).into();
        assert!(matches!(err, SkirmishError::Room(_)));

        let err: SkirmishError = RoomError::NotInAnyRoom(SessionId(3)).into();
        assert_eq!(err.to_string(), "session S-3 is not in any room");
    }
}

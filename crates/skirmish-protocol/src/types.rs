//! Frame types exchanged between clients and the server.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier of one connected session.
///
/// Minted by the server when the handshake completes and stable for the
/// lifetime of that connection. The server never hands the same value to
/// two connections, so it doubles as the player key inside a room.
///
/// Serialized as a plain number (`#[serde(transparent)]`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

/// Identifier of one room (one independent match).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a server message is addressed to.
///
/// Room logic returns `(Recipient, message)` pairs; the room actor resolves
/// them against its live connection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every connected session in the room.
    All,
    /// Exactly the connection whose session id matches.
    Session(SessionId),
    /// Every connected session except this one (relays).
    AllExcept(SessionId),
}

// ---------------------------------------------------------------------------
// SystemMessage
// ---------------------------------------------------------------------------

/// A summary of a joinable room, as returned by [`SystemMessage::RoomList`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    pub clients: usize,
    pub max_clients: usize,
}

/// Framework-level messages: handshake, heartbeat, room membership, errors.
///
/// Internally tagged, so `Heartbeat { client_time: 5 }` is
/// `{"type": "Heartbeat", "client_time": 5}` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    /// Client → Server: first frame of every connection.
    Handshake { version: u32 },

    /// Server → Client: the session id assigned to this connection.
    HandshakeAck {
        session_id: SessionId,
        server_time: u64,
    },

    /// Either direction: the connection is about to close.
    Disconnect { reason: String },

    /// Client → Server keep-alive, echoed back with the server clock.
    Heartbeat { client_time: u64 },

    /// Server → Client: reply to [`SystemMessage::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Client → Server: join a specific room.
    /// `options` are the game's join options, encoded with the codec.
    JoinRoom { room_id: RoomId, options: Vec<u8> },

    /// Client → Server: join any room with a free slot, creating one if
    /// none is available.
    JoinOrCreate { options: Vec<u8> },

    /// Client → Server: leave the current room but keep the connection.
    LeaveRoom,

    /// Client → Server: list rooms that accept joins.
    ListRooms,

    /// Server → Client: reply to [`SystemMessage::ListRooms`].
    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: the room's full state snapshot, encoded with the
    /// codec. Sent on join and on every patch where something changed.
    RoomState { data: Vec<u8> },

    /// Server → Client: the join succeeded.
    RoomJoined {
        room_id: RoomId,
        session_id: SessionId,
    },

    /// Server → Client: a request was rejected. HTTP-style codes
    /// (400 bad payload, 404 unknown room, 409 room full or busy).
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of an [`Envelope`].
///
/// Adjacently tagged: `{"type": "System", "data": {...}}` or
/// `{"type": "Game", "data": [bytes]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    /// A game action (client → server) or game event (server → client),
    /// encoded by the codec. Opaque to the framework.
    Game(Vec<u8>),
}

/// The top-level frame. Every WebSocket message carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-direction sequence number, starting at 0 with the handshake.
    pub seq: u64,
    /// Milliseconds since the sender's connection started.
    pub timestamp: u64,
    pub payload: Payload,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&SessionId(42)).unwrap();
        assert_eq!(json, "42");
        let back: SessionId = serde_json::from_str("42").unwrap();
        assert_eq!(back, SessionId(42));
    }

    #[test]
    fn test_session_id_display() {
        assert_eq!(SessionId(7).to_string(), "S-7");
    }

    #[test]
    fn test_room_id_display() {
        assert_eq!(RoomId(3).to_string(), "R-3");
    }

    #[test]
    fn test_session_id_orders_numerically() {
        let mut ids = vec![SessionId(10), SessionId(2), SessionId(7)];
        ids.sort();
        assert_eq!(ids, vec![SessionId(2), SessionId(7), SessionId(10)]);
    }

    #[test]
    fn test_handshake_json_format() {
        let msg = SystemMessage::Handshake { version: 1 };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Handshake");
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn test_handshake_ack_carries_session_id_as_number() {
        let msg = SystemMessage::HandshakeAck {
            session_id: SessionId(9),
            server_time: 12,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "HandshakeAck");
        assert_eq!(json["session_id"], 9);
    }

    #[test]
    fn test_join_or_create_accepts_options_bytes() {
        let json = r#"{"type": "JoinOrCreate", "options": [123, 125]}"#;
        let msg: SystemMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            SystemMessage::JoinOrCreate {
                options: b"{}".to_vec()
            }
        );
    }

    #[test]
    fn test_error_json_format() {
        let msg = SystemMessage::Error {
            code: 409,
            message: "room R-1 is full".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 409);
    }

    #[test]
    fn test_payload_game_json_format() {
        let payload = Payload::Game(vec![1, 2, 3]);
        let json: serde_json::Value = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "Game");
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_envelope_system_payload_parses_from_client_json() {
        let json = r#"{
            "seq": 3,
            "timestamp": 100,
            "payload": {"type": "System", "data": {"type": "ListRooms"}}
        }"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.seq, 3);
        assert_eq!(env.payload, Payload::System(SystemMessage::ListRooms));
    }

    #[test]
    fn test_unknown_system_message_is_rejected() {
        let unknown = r#"{"type": "FlyToMoon", "speed": 9000}"#;
        assert!(serde_json::from_str::<SystemMessage>(unknown).is_err());
    }

    #[test]
    fn test_envelope_missing_payload_is_rejected() {
        let wrong = r#"{"seq": 1, "timestamp": 0}"#;
        assert!(serde_json::from_str::<Envelope>(wrong).is_err());
    }
}

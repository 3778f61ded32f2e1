//! Error types for the room layer.

use skirmish_protocol::{RoomId, SessionId};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every client slot of the room is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The session is already a member of this room.
    #[error("session {0} already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),

    /// The session is a member of a different room.
    #[error("session {0} is already in room {1}")]
    InAnotherRoom(SessionId, RoomId),

    /// The session is not a member of this room.
    #[error("session {0} not in room {1}")]
    NotInRoom(SessionId, RoomId),

    /// The session is not a member of any room.
    #[error("session {0} is not in any room")]
    NotInAnyRoom(SessionId),

    /// The room is shutting down.
    #[error("room {0} is disposing")]
    Disposing(RoomId),

    /// The game refused to build its state from the room options.
    #[error("room creation failed: {0}")]
    CreateFailed(String),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

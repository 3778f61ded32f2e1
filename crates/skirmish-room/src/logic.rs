//! The `RoomLogic` trait: the extension point a game implements.
//!
//! The room actor owns the state and calls these hooks one at a time, in
//! arrival order. Hooks are synchronous and must not block.

use serde::{Serialize, de::DeserializeOwned};
use skirmish_protocol::{Recipient, SessionId};

use crate::RoomConfig;

/// Messages produced by a hook, each paired with its addressee.
pub type Outbox<M> = Vec<(Recipient, M)>;

/// The rules of one kind of room.
///
/// Associated types describe the game's data:
/// - `Options`: per-room settings chosen at creation
/// - `JoinOptions`: what a client declares when joining
/// - `State`: the authoritative room aggregate, never leaves the actor
/// - `Snapshot`: the published view of `State`
/// - `ClientMessage` / `ServerMessage`: actions in, events out
pub trait RoomLogic: Send + Sync + 'static {
    /// Room settings, fixed for the room's lifetime.
    type Options: Send + Sync + Clone + Default + 'static;

    /// Client-declared join data, decoded at the boundary.
    type JoinOptions: Send + Clone + DeserializeOwned + 'static;

    /// The authoritative state.
    type State: Send + 'static;

    /// What clients see of the state.
    type Snapshot: Send + Clone + Serialize + 'static;

    /// Actions clients send, decoded at the boundary.
    type ClientMessage: Send + DeserializeOwned + 'static;

    /// Events the room sends back.
    type ServerMessage: Send + Sync + Clone + Serialize + 'static;

    /// Why `create` refused the options.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Builds the initial state when the room is created.
    fn create(options: &Self::Options) -> Result<Self::State, Self::Error>;

    /// A client joined. Runs after the room accepted the join (capacity
    /// and membership were checked).
    fn on_join(
        state: &mut Self::State,
        session: SessionId,
        options: Self::JoinOptions,
    ) -> Outbox<Self::ServerMessage>;

    /// A member sent an action.
    fn on_message(
        state: &mut Self::State,
        sender: SessionId,
        msg: Self::ClientMessage,
    ) -> Outbox<Self::ServerMessage>;

    /// A client left or disconnected. Default: no-op.
    fn on_leave(
        _state: &mut Self::State,
        _session: SessionId,
    ) -> Outbox<Self::ServerMessage> {
        Vec::new()
    }

    /// The view published to clients.
    fn snapshot(state: &Self::State) -> Self::Snapshot;

    /// Rejects a message before `on_message` runs. Rejected messages are
    /// dropped with a debug log. Default: accept all.
    fn validate_message(
        _state: &Self::State,
        _sender: SessionId,
        _msg: &Self::ClientMessage,
    ) -> Result<(), String> {
        Ok(())
    }

    /// Room configuration for rooms built from `options`.
    /// Default: [`RoomConfig::default()`].
    fn room_config(_options: &Self::Options) -> RoomConfig {
        RoomConfig::default()
    }
}

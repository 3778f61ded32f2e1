//! # Skirmish
//!
//! WebSocket server for authoritative multiplayer rooms.
//!
//! A game implements [`RoomLogic`](skirmish_room::RoomLogic); the server
//! handles the socket, handshake, matchmaking and state publishing, and
//! each room runs as its own actor task.
//!
//! ```rust,ignore
//! use skirmish::prelude::*;
//! use skirmish_arena::{Arena, ArenaOptions};
//!
//! let server = SkirmishServerBuilder::new()
//!     .bind("0.0.0.0:2567")
//!     .build::<Arena>(ArenaOptions::default())
//!     .await?;
//! server.run().await
//! ```

mod error;
mod handler;
mod server;
mod settings;
mod transport;

pub use error::SkirmishError;
pub use server::{PROTOCOL_VERSION, SkirmishServer, SkirmishServerBuilder};
pub use settings::ServerSettings;
pub use transport::{ConnectionId, TransportError, WebSocketConnection, WebSocketTransport};

pub mod prelude {
    pub use crate::{
        PROTOCOL_VERSION, ServerSettings, SkirmishError, SkirmishServer, SkirmishServerBuilder,
    };
    pub use skirmish_protocol::{
        Codec, Envelope, JsonCodec, Payload, Recipient, RoomId, RoomListEntry, SessionId,
        SystemMessage,
    };
    pub use skirmish_room::{Outbox, RoomConfig, RoomError, RoomLogic, RoomStatus};
}

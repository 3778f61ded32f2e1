//! Wire protocol for Skirmish.
//!
//! Everything that crosses the socket lives here:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`Recipient`], ids): the
//!   frames exchanged between clients and the server.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how frames and game
//!   payloads become bytes.
//! - **Errors** ([`ProtocolError`]): encode/decode failures and payloads
//!   rejected at the boundary.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Room (typed actions)
//! ```
//!
//! The protocol knows nothing about rooms or game rules. Game actions and
//! join options travel as opaque bytes inside [`Payload::Game`] and
//! [`SystemMessage::JoinOrCreate`]; the room layer decodes them into its
//! own types.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Envelope, Payload, Recipient, RoomId, RoomListEntry, SessionId,
    SystemMessage,
};

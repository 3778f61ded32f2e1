//! Room lifecycle management for Skirmish.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! game state outright. Commands are drained one at a time, so game logic
//! never sees two actions interleave and never needs a lock.
//!
//! # Key types
//!
//! - [`RoomLogic`]: the trait a game implements
//! - [`RoomManager`]: creates/destroys rooms, routes sessions
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomStatus`]: lifecycle state machine
//! - [`RoomConfig`]: capacity, patch rate, auto-dispose

mod config;
mod error;
mod logic;
mod manager;
mod room;

pub use config::{RoomConfig, RoomStatus};
pub use error::RoomError;
pub use logic::{Outbox, RoomLogic};
pub use manager::{RoomManager, joinable_rooms};
pub use room::{ClientSender, RoomHandle, RoomInfo, RoomOutbound};

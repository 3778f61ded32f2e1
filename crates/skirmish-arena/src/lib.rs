//! Authoritative state and rules for a Skirmish arena room.
//!
//! One [`ArenaState`] per room owns everything the room decides on:
//!
//! - [`PlayerRegistry`]: players keyed by session, together with their
//!   spawn ([`SpawnAllocator`]) and color ([`ColorPool`]) allocators
//! - [`ResourcePool`]: apples with stable ids, seeded at start and
//!   dropped on game over
//! - the resolver methods on [`ArenaState`]: movement, damage and respawn,
//!   collection, weapons, game over
//!
//! [`Arena`] plugs the state into a room actor through
//! [`skirmish_room::RoomLogic`]. Actions come in, targeted or relayed
//! events go out.

mod color;
mod config;
mod controller;
mod error;
mod player;
mod point;
mod resolver;
mod resource;
mod spawn;
mod state;

pub use color::{ColorPolicy, ColorPool};
pub use config::ArenaOptions;
pub use controller::{Action, Arena, ArenaEvent, GREETING};
pub use error::ArenaError;
pub use player::{JoinOptions, MoveDelta, Player, PlayerRegistry, Rotation, parts_for_score};
pub use point::{Point, Vec3};
pub use resolver::DamageOutcome;
pub use resource::{Apple, ResourcePool};
pub use spawn::{SpawnAllocator, SpawnLayout, SpawnOverflow, random_field_point};
pub use state::{ArenaSnapshot, ArenaState};

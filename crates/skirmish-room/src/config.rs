//! Room configuration and lifecycle state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
///
/// Games provide one through [`RoomLogic::room_config`](crate::RoomLogic::room_config),
/// usually derived from their own room options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Maximum connected clients. Joins beyond this are rejected with
    /// [`RoomError::RoomFull`](crate::RoomError::RoomFull).
    pub max_clients: usize,

    /// How often the room publishes its state snapshot to every client
    /// (only when something changed since the last publish).
    pub patch_interval: Duration,

    /// Dispose the room once its last client leaves.
    pub auto_dispose: bool,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_clients: 8,
            patch_interval: Duration::from_millis(50),
            auto_dispose: true,
        }
    }
}

impl RoomConfig {
    /// Shortest accepted patch interval.
    pub const MIN_PATCH_INTERVAL: Duration = Duration::from_millis(1);

    /// Clamps out-of-range values so the actor can run with this config.
    ///
    /// - `max_clients` is at least 1.
    /// - `patch_interval` is at least [`Self::MIN_PATCH_INTERVAL`].
    pub fn validated(mut self) -> Self {
        if self.max_clients == 0 {
            tracing::warn!("max_clients is 0, raising to 1");
            self.max_clients = 1;
        }
        if self.patch_interval < Self::MIN_PATCH_INTERVAL {
            tracing::warn!(
                interval = ?self.patch_interval,
                "patch interval below minimum, clamping"
            );
            self.patch_interval = Self::MIN_PATCH_INTERVAL;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// RoomStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// Open ⇄ Locked
///   \     /
///  Disposing
/// ```
///
/// - **Open**: accepting joins.
/// - **Locked**: every slot is taken; reopens as soon as a client leaves.
/// - **Disposing**: shutting down; terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomStatus {
    Open,
    Locked,
    Disposing,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new clients.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Status a live room should have with `clients` of `max_clients`
    /// slots taken. A disposing room stays disposing.
    pub fn for_occupancy(self, clients: usize, max_clients: usize) -> Self {
        match self {
            Self::Disposing => Self::Disposing,
            _ if clients >= max_clients => Self::Locked,
            _ => Self::Open,
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "Open"),
            Self::Locked => write!(f, "Locked"),
            Self::Disposing => write!(f, "Disposing"),
        }
    }
}

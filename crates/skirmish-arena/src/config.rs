use std::time::Duration;

use serde::{Deserialize, Serialize};
use skirmish_room::RoomConfig;

use crate::color::{ColorPolicy, ColorPool};
use crate::error::ArenaError;
use crate::point::Point;
use crate::spawn::{SpawnAllocator, SpawnLayout, SpawnOverflow, default_spawn_points};

/// Per-room arena settings.
///
/// Every field has a default, so a TOML `[arena]` table only needs the keys
/// it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaOptions {
    pub max_clients: usize,
    pub colors_length: u32,
    pub color_policy: ColorPolicy,
    /// Side of the square field, centered at the origin.
    pub field_size: u32,
    pub initial_resources: usize,
    pub spawn_layout: SpawnLayout,
    pub spawn_points: Vec<Point>,
    pub spawn_overflow: SpawnOverflow,
    pub default_max_health: u32,
    /// Fixed RNG seed. `None` seeds each room from the OS.
    pub seed: Option<u64>,
    pub patch_interval_ms: u64,
    pub auto_dispose: bool,
}

impl Default for ArenaOptions {
    fn default() -> Self {
        Self {
            max_clients: 8,
            colors_length: 8,
            color_policy: ColorPolicy::default(),
            field_size: 40,
            initial_resources: 10,
            spawn_layout: SpawnLayout::default(),
            spawn_points: default_spawn_points(),
            spawn_overflow: SpawnOverflow::default(),
            default_max_health: 100,
            seed: None,
            patch_interval_ms: 50,
            auto_dispose: true,
        }
    }
}

impl ArenaOptions {
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.colors_length == 0 {
            return Err(ArenaError::InvalidConfig(
                "colors_length must be at least 1".into(),
            ));
        }
        if self.field_size < 2 {
            return Err(ArenaError::InvalidConfig(format!(
                "field_size must be at least 2, got {}",
                self.field_size
            )));
        }
        if self.spawn_layout == SpawnLayout::Fixed && self.spawn_points.is_empty() {
            return Err(ArenaError::InvalidConfig(
                "fixed spawn layout needs at least one spawn point".into(),
            ));
        }
        if let Some(p) = self.spawn_points.iter().find(|p| !p.is_finite()) {
            return Err(ArenaError::InvalidConfig(format!(
                "spawn point ({}, {}) is not finite",
                p.x, p.z
            )));
        }
        Ok(())
    }

    pub(crate) fn spawn_allocator(&self) -> SpawnAllocator {
        SpawnAllocator::new(
            self.spawn_layout,
            self.spawn_points.clone(),
            self.spawn_overflow,
            self.field_size,
        )
    }

    pub(crate) fn color_pool(&self) -> ColorPool {
        ColorPool::new(self.color_policy, self.colors_length)
    }

    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            max_clients: self.max_clients,
            patch_interval: Duration::from_millis(self.patch_interval_ms),
            auto_dispose: self.auto_dispose,
        }
    }
}

//! The per-room arena aggregate.

use std::collections::{BTreeMap, HashSet};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use skirmish_protocol::SessionId;
use tracing::info;

use crate::config::ArenaOptions;
use crate::error::ArenaError;
use crate::player::{JoinOptions, Player, PlayerRegistry};
use crate::resource::{Apple, ResourcePool};

/// Everything one arena room owns.
///
/// Only the room actor touches it, one command at a time.
#[derive(Debug)]
pub struct ArenaState {
    pub(crate) players: PlayerRegistry,
    pub(crate) resources: ResourcePool,
    pub(crate) game_overs: HashSet<SessionId>,
    pub(crate) rng: StdRng,
}

/// Published view of an arena: every player and every apple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaSnapshot {
    pub players: BTreeMap<SessionId, Player>,
    pub apples: Vec<Apple>,
}

impl ArenaState {
    /// Builds a fresh arena and seeds its initial apples.
    pub fn new(options: &ArenaOptions) -> Result<Self, ArenaError> {
        options.validate()?;
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let mut resources = ResourcePool::new(options.field_size);
        resources.seed(options.initial_resources, &mut rng);
        Ok(Self {
            players: PlayerRegistry::new(
                options.spawn_allocator(),
                options.color_pool(),
                options.default_max_health,
            ),
            resources,
            game_overs: HashSet::new(),
            rng,
        })
    }

    /// Creates the player for a joining session.
    ///
    /// A session that reported game over earlier is allowed to report again
    /// once it has a new player.
    pub fn join(&mut self, id: SessionId, options: JoinOptions) -> &Player {
        self.game_overs.remove(&id);
        let player = self.players.create(id, options, &mut self.rng);
        info!(
            %id,
            color = player.color(),
            x = player.position().x,
            z = player.position().z,
            "player joined"
        );
        player
    }

    pub fn leave(&mut self, id: SessionId) -> Option<Player> {
        let player = self.players.remove(id);
        if player.is_some() {
            info!(%id, "player left");
        }
        player
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn resources(&self) -> &ResourcePool {
        &self.resources
    }

    pub fn has_reported_game_over(&self, id: SessionId) -> bool {
        self.game_overs.contains(&id)
    }

    pub fn snapshot(&self) -> ArenaSnapshot {
        ArenaSnapshot {
            players: self.players.to_map(),
            apples: self.resources.iter().copied().collect(),
        }
    }
}

//! Applies player actions to the arena.
//!
//! Every operation accepts whatever a client claims: any target, any
//! damage, any apple id, any drop list. Stale references are no-ops rather
//! than errors, since a late message racing a leave is normal traffic.

use skirmish_protocol::SessionId;
use tracing::{debug, info};

use crate::player::MoveDelta;
use crate::point::{Point, Vec3};
use crate::spawn::random_field_point;
use crate::state::ArenaState;

/// Result of [`ArenaState::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// No player with that id.
    Missed,
    /// Damage taken, still alive.
    Wounded { health: u32 },
    /// Health ran out: the player was healed and moved to `at`.
    Respawned { at: Point },
}

impl ArenaState {
    pub fn move_player(&mut self, id: SessionId, delta: &MoveDelta) -> bool {
        let moved = self.players.move_player(id, delta);
        if !moved {
            debug!(%id, "move for unknown player ignored");
        }
        moved
    }

    /// Overwrites the equipped weapon. Any id is accepted.
    pub fn equip_weapon(&mut self, id: SessionId, weapon: u32) -> bool {
        match self.players.get_mut(id) {
            Some(player) => {
                player.weapon = weapon;
                true
            }
            None => {
                debug!(%id, weapon, "weapon change for unknown player ignored");
                false
            }
        }
    }

    /// Deals `value` damage to `target`. Negative values count as zero.
    ///
    /// Damage that brings health to zero respawns the player on the spot:
    /// one more loss, full health, a random field position, no velocity.
    // TODO: check attacker range and line of sight once weapons carry range data.
    pub fn apply_damage(&mut self, target: SessionId, value: i64) -> DamageOutcome {
        let amount = u32::try_from(value.max(0)).unwrap_or(u32::MAX);
        let Self { players, rng, .. } = self;

        let field_size = players.spawns().field_size();
        let Some(player) = players.get_mut(target) else {
            debug!(%target, value, "damage for unknown player ignored");
            return DamageOutcome::Missed;
        };

        if amount < player.current_health {
            player.current_health -= amount;
            debug!(%target, amount, health = player.current_health, "player wounded");
            return DamageOutcome::Wounded {
                health: player.current_health,
            };
        }

        let at = random_field_point(field_size, rng);
        player.loss = player.loss.saturating_add(1);
        player.current_health = player.max_health();
        player.position = Vec3::on_ground(at);
        player.velocity = Vec3::ZERO;
        info!(%target, loss = player.loss, x = at.x, z = at.z, "player respawned");
        DamageOutcome::Respawned { at }
    }

    /// Credits `collector` with apple `apple_id` and relocates the apple.
    ///
    /// Nothing happens unless both the player and the apple exist.
    pub fn collect_apple(&mut self, collector: SessionId, apple_id: u64) -> bool {
        let Self {
            players,
            resources,
            rng,
            ..
        } = self;

        let Some(player) = players.get_mut(collector) else {
            debug!(%collector, apple_id, "collect by unknown player ignored");
            return false;
        };
        if !resources.collect(apple_id, rng) {
            debug!(%collector, apple_id, "collect of unknown apple ignored");
            return false;
        }
        player.award_point();
        debug!(%collector, apple_id, score = player.score(), "apple collected");
        true
    }

    /// Ends `id`'s run: removes the player and drops one apple per position,
    /// in order.
    ///
    /// Reports after the first are ignored until the session joins again.
    /// Returns the number of apples dropped, or `None` for a repeat report.
    pub fn game_over(&mut self, id: SessionId, drops: &[Point]) -> Option<usize> {
        if !self.game_overs.insert(id) {
            debug!(%id, "repeated game over ignored");
            return None;
        }
        self.players.remove(id);
        for &at in drops {
            self.resources.create(at);
        }
        info!(%id, dropped = drops.len(), "game over");
        Some(drops.len())
    }
}

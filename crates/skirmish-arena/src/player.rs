//! Players and the per-room registry.

use std::collections::BTreeMap;

use rand::Rng;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use skirmish_protocol::SessionId;
use tracing::debug;

use crate::color::ColorPool;
use crate::point::{Point, Vec3};
use crate::spawn::SpawnAllocator;

/// Parts level earned by a score: `round(score / 3)`, halves rounding up.
pub fn parts_for_score(score: u32) -> u32 {
    score / 3 + u32::from(score % 3 == 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub x: f32,
    pub y: f32,
}

/// What a client declares when joining an arena room.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(deserialize_with = "finite_f32")]
    pub speed: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weapon: Option<u32>,
    /// Cosmetic level shown by the client. Unrelated to score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<u32>,
}

/// Decodes an `f32`, refusing values that overflowed to infinity or NaN.
fn finite_f32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    let value = f32::deserialize(deserializer)?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom(format!("expected a finite number, got {value}")))
    }
}

/// A movement update. Position on the ground plane is required, the rest
/// overwrites the player's fields only when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveDelta {
    #[serde(rename = "pX")]
    pub p_x: f32,
    #[serde(rename = "pZ")]
    pub p_z: f32,
    #[serde(rename = "pY", default, skip_serializing_if = "Option::is_none")]
    pub p_y: Option<f32>,
    #[serde(rename = "vX", default, skip_serializing_if = "Option::is_none")]
    pub v_x: Option<f32>,
    #[serde(rename = "vY", default, skip_serializing_if = "Option::is_none")]
    pub v_y: Option<f32>,
    #[serde(rename = "vZ", default, skip_serializing_if = "Option::is_none")]
    pub v_z: Option<f32>,
    #[serde(rename = "rX", default, skip_serializing_if = "Option::is_none")]
    pub r_x: Option<f32>,
    #[serde(rename = "rY", default, skip_serializing_if = "Option::is_none")]
    pub r_y: Option<f32>,
    #[serde(rename = "cr", default, skip_serializing_if = "Option::is_none")]
    pub crouch: Option<bool>,
}

impl MoveDelta {
    pub fn to(x: f32, z: f32) -> Self {
        Self {
            p_x: x,
            p_z: z,
            ..Self::default()
        }
    }

    /// Whether every number carried by the update is finite.
    pub fn is_finite(&self) -> bool {
        let optional = [self.p_y, self.v_x, self.v_y, self.v_z, self.r_x, self.r_y];
        self.p_x.is_finite()
            && self.p_z.is_finite()
            && optional.into_iter().flatten().all(f32::is_finite)
    }
}

/// A player's authoritative record.
///
/// Serializes with a `parts` field computed from `score`; an incoming
/// `parts` is ignored on decode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    speed: f32,
    pub(crate) position: Vec3,
    pub(crate) velocity: Vec3,
    pub(crate) rotation: Rotation,
    pub(crate) crouching: bool,
    pub(crate) weapon: u32,
    max_health: u32,
    pub(crate) current_health: u32,
    score: u32,
    pub(crate) loss: u32,
    color: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cosmetic_parts: Option<u32>,
}

impl Player {
    fn new(options: JoinOptions, spawn: Point, color: u32, default_max_health: u32) -> Self {
        let max_health = options.health.unwrap_or(default_max_health);
        Self {
            nickname: options.nickname,
            speed: options.speed,
            position: Vec3::on_ground(spawn),
            velocity: Vec3::ZERO,
            rotation: Rotation::default(),
            crouching: false,
            weapon: options.weapon.unwrap_or(0),
            max_health,
            current_health: max_health,
            score: 0,
            loss: 0,
            color,
            cosmetic_parts: options.parts,
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn is_crouching(&self) -> bool {
        self.crouching
    }

    pub fn weapon(&self) -> u32 {
        self.weapon
    }

    pub fn max_health(&self) -> u32 {
        self.max_health
    }

    pub fn current_health(&self) -> u32 {
        self.current_health
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Parts level derived from score.
    pub fn parts(&self) -> u32 {
        parts_for_score(self.score)
    }

    pub fn loss(&self) -> u32 {
        self.loss
    }

    pub fn color(&self) -> u32 {
        self.color
    }

    /// Parts level the client declared at join.
    pub fn cosmetic_parts(&self) -> Option<u32> {
        self.cosmetic_parts
    }

    pub(crate) fn award_point(&mut self) {
        self.score = self.score.saturating_add(1);
    }

    fn apply_move(&mut self, delta: &MoveDelta) {
        self.position.x = delta.p_x;
        self.position.z = delta.p_z;
        if let Some(y) = delta.p_y {
            self.position.y = y;
        }
        if let Some(x) = delta.v_x {
            self.velocity.x = x;
        }
        if let Some(y) = delta.v_y {
            self.velocity.y = y;
        }
        if let Some(z) = delta.v_z {
            self.velocity.z = z;
        }
        if let Some(x) = delta.r_x {
            self.rotation.x = x;
        }
        if let Some(y) = delta.r_y {
            self.rotation.y = y;
        }
        if let Some(crouch) = delta.crouch {
            self.crouching = crouch;
        }
    }
}

impl Serialize for Player {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = 12
            + usize::from(self.nickname.is_some())
            + usize::from(self.cosmetic_parts.is_some());
        let mut s = serializer.serialize_struct("Player", len)?;
        if let Some(nickname) = &self.nickname {
            s.serialize_field("nickname", nickname)?;
        } else {
            s.skip_field("nickname")?;
        }
        s.serialize_field("speed", &self.speed)?;
        s.serialize_field("position", &self.position)?;
        s.serialize_field("velocity", &self.velocity)?;
        s.serialize_field("rotation", &self.rotation)?;
        s.serialize_field("crouching", &self.crouching)?;
        s.serialize_field("weapon", &self.weapon)?;
        s.serialize_field("maxHealth", &self.max_health)?;
        s.serialize_field("currentHealth", &self.current_health)?;
        s.serialize_field("score", &self.score)?;
        s.serialize_field("parts", &self.parts())?;
        s.serialize_field("loss", &self.loss)?;
        s.serialize_field("color", &self.color)?;
        if let Some(parts) = &self.cosmetic_parts {
            s.serialize_field("cosmeticParts", parts)?;
        } else {
            s.skip_field("cosmeticParts")?;
        }
        s.end()
    }
}

/// Players in a room, keyed by session.
///
/// The registry owns the spawn and color allocators so that every path that
/// adds or drops a player also takes or returns its color.
#[derive(Debug, Clone)]
pub struct PlayerRegistry {
    players: BTreeMap<SessionId, Player>,
    spawns: SpawnAllocator,
    colors: ColorPool,
    default_max_health: u32,
}

impl PlayerRegistry {
    pub fn new(spawns: SpawnAllocator, colors: ColorPool, default_max_health: u32) -> Self {
        Self {
            players: BTreeMap::new(),
            spawns,
            colors,
            default_max_health,
        }
    }

    /// Adds a player for `id`, placed by occupancy and given a color.
    ///
    /// An existing player with the same id is replaced and its color
    /// returned to the pool first.
    pub fn create<R: Rng>(&mut self, id: SessionId, options: JoinOptions, rng: &mut R) -> &Player {
        if let Some(previous) = self.players.remove(&id) {
            debug!(%id, "replacing existing player");
            self.colors.release(previous.color);
        }
        let spawn = self.spawns.initial_spawn(self.players.len(), rng);
        let color = self.colors.allocate(rng);
        let player = Player::new(options, spawn, color, self.default_max_health);
        self.players.entry(id).or_insert(player)
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.colors.release(player.color);
        Some(player)
    }

    pub fn get(&self, id: SessionId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: SessionId) -> Option<&mut Player> {
        self.players.get_mut(&id)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.players.contains_key(&id)
    }

    /// Applies a movement update. Returns `false` for an unknown id, which
    /// happens when a move races the sender's own leave.
    pub fn move_player(&mut self, id: SessionId, delta: &MoveDelta) -> bool {
        match self.players.get_mut(&id) {
            Some(player) => {
                player.apply_move(delta);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SessionId, &Player)> {
        self.players.iter()
    }

    pub fn spawns(&self) -> &SpawnAllocator {
        &self.spawns
    }

    pub fn colors(&self) -> &ColorPool {
        &self.colors
    }

    pub(crate) fn to_map(&self) -> BTreeMap<SessionId, Player> {
        self.players.clone()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::color::ColorPolicy;
    use crate::spawn::{SpawnLayout, SpawnOverflow, default_spawn_points};

    fn registry(colors_length: u32) -> PlayerRegistry {
        PlayerRegistry::new(
            SpawnAllocator::new(
                SpawnLayout::Fixed,
                default_spawn_points(),
                SpawnOverflow::Wrap,
                40,
            ),
            ColorPool::new(ColorPolicy::ScanUnique, colors_length),
            100,
        )
    }

    fn join(speed: f32) -> JoinOptions {
        JoinOptions {
            speed,
            ..JoinOptions::default()
        }
    }

    #[test]
    fn test_parts_rounds_score_thirds() {
        let expected = [0, 0, 1, 1, 1, 2, 2, 2, 3, 3];
        for (score, parts) in expected.into_iter().enumerate() {
            assert_eq!(parts_for_score(score as u32), parts, "score {score}");
        }
        assert_eq!(parts_for_score(u32::MAX), u32::MAX / 3);
    }

    #[test]
    fn test_create_uses_join_options() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);

        let options = JoinOptions {
            nickname: Some("ana".into()),
            speed: 4.5,
            health: Some(250),
            weapon: Some(3),
            parts: Some(7),
        };
        let player = players.create(SessionId(1), options, &mut rng);

        assert_eq!(player.nickname.as_deref(), Some("ana"));
        assert_eq!(player.speed(), 4.5);
        assert_eq!(player.max_health(), 250);
        assert_eq!(player.current_health(), 250);
        assert_eq!(player.weapon(), 3);
        assert_eq!(player.cosmetic_parts(), Some(7));
        assert_eq!(player.parts(), 0);
        assert_eq!(player.score(), 0);
    }

    #[test]
    fn test_create_defaults_health() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);

        let player = players.create(SessionId(1), join(1.0), &mut rng);

        assert_eq!(player.max_health(), 100);
        assert_eq!(player.current_health(), 100);
        assert_eq!(player.weapon(), 0);
    }

    #[test]
    fn test_create_places_by_occupancy() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);

        let a = players.create(SessionId(1), join(1.0), &mut rng).position();
        let b = players.create(SessionId(2), join(1.0), &mut rng).position();

        assert_eq!(a, Vec3::on_ground(Point::new(10.0, 10.0)));
        assert_eq!(b, Vec3::on_ground(Point::new(-10.0, 10.0)));
    }

    #[test]
    fn test_colors_unique_while_within_capacity() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(3);

        for id in 1..=3 {
            players.create(SessionId(id), join(1.0), &mut rng);
        }
        players.remove(SessionId(2));
        players.create(SessionId(4), join(1.0), &mut rng);

        let mut colors: Vec<u32> = players.iter().map(|(_, p)| p.color()).collect();
        colors.sort_unstable();
        assert_eq!(colors, vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_releases_color() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);
        players.create(SessionId(1), join(1.0), &mut rng);
        players.create(SessionId(2), join(1.0), &mut rng);

        let removed = players.remove(SessionId(1)).unwrap();
        assert_eq!(removed.color(), 0);
        assert_eq!(players.colors().in_use(), &[1]);

        let again = players.create(SessionId(3), join(1.0), &mut rng);
        assert_eq!(again.color(), 0);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut players = registry(4);
        assert!(players.remove(SessionId(9)).is_none());
        assert!(players.colors().in_use().is_empty());
    }

    #[test]
    fn test_create_over_existing_id_replaces() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);
        players.create(SessionId(1), join(1.0), &mut rng);

        let player = players.create(SessionId(1), join(2.0), &mut rng);

        assert_eq!(player.speed(), 2.0);
        assert_eq!(player.color(), 0);
        assert_eq!(players.len(), 1);
        assert_eq!(players.colors().in_use(), &[0]);
    }

    #[test]
    fn test_move_overwrites_present_fields() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);
        players.create(SessionId(1), join(1.0), &mut rng);

        let delta = MoveDelta {
            p_y: Some(2.0),
            v_x: Some(0.5),
            r_y: Some(1.25),
            crouch: Some(true),
            ..MoveDelta::to(3.0, -4.0)
        };
        assert!(players.move_player(SessionId(1), &delta));

        let player = players.get(SessionId(1)).unwrap();
        assert_eq!(player.position(), Vec3 { x: 3.0, y: 2.0, z: -4.0 });
        assert_eq!(player.velocity(), Vec3 { x: 0.5, y: 0.0, z: 0.0 });
        assert_eq!(player.rotation(), Rotation { x: 0.0, y: 1.25 });
        assert!(player.is_crouching());
    }

    #[test]
    fn test_move_unknown_id_is_noop() {
        let mut players = registry(4);
        assert!(!players.move_player(SessionId(5), &MoveDelta::to(1.0, 1.0)));
        assert!(players.is_empty());
    }

    #[test]
    fn test_move_delta_wire_names() {
        let delta: MoveDelta =
            serde_json::from_str(r#"{"pX":1.0,"pZ":2.0,"vY":3.0,"cr":false,"extra":1}"#).unwrap();
        assert_eq!(delta.p_x, 1.0);
        assert_eq!(delta.p_z, 2.0);
        assert_eq!(delta.v_y, Some(3.0));
        assert_eq!(delta.crouch, Some(false));
        assert_eq!(delta.r_x, None);
    }

    #[test]
    fn test_join_options_require_speed() {
        assert!(serde_json::from_str::<JoinOptions>(r#"{"nickname":"x"}"#).is_err());
        let opts: JoinOptions = serde_json::from_str(r#"{"speed":3}"#).unwrap();
        assert_eq!(opts.speed, 3.0);
        assert_eq!(opts.health, None);
    }

    #[test]
    fn test_join_options_reject_overflowing_speed() {
        assert!(serde_json::from_str::<JoinOptions>(r#"{"speed":1e39}"#).is_err());
        assert!(serde_json::from_str::<JoinOptions>(r#"{"speed":-1e39}"#).is_err());
        let opts: JoinOptions = serde_json::from_str(r#"{"speed":1e3}"#).unwrap();
        assert_eq!(opts.speed, 1000.0);
    }

    #[test]
    fn test_parts_follow_score() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut players = registry(4);
        players.create(SessionId(1), join(1.0), &mut rng);

        let player = players.get_mut(SessionId(1)).unwrap();
        for _ in 0..5 {
            player.award_point();
        }
        assert_eq!(player.score(), 5);
        assert_eq!(player.parts(), 2);

        let mut json = serde_json::to_value(&*player).unwrap();
        assert_eq!(json["parts"], 2);
        assert_eq!(json["score"], 5);
        assert!(json.get("nickname").is_none());

        json["parts"] = serde_json::json!(99);
        let decoded: Player = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.parts(), 2);
        assert_eq!(&decoded, &*player);
    }
}

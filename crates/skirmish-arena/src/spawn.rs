//! Spawn placement.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::point::Point;

/// Where new players are placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnLayout {
    /// Pick from the configured spawn points by current occupancy.
    #[default]
    Fixed,
    /// Uniformly random integer point on the field.
    Random,
}

/// What a fixed layout does once occupancy reaches the number of points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnOverflow {
    /// Start again from the first point.
    #[default]
    Wrap,
    /// Keep reusing the last point.
    Clamp,
}

/// Default spawn points: the four corners of a 20x20 square.
pub(crate) fn default_spawn_points() -> Vec<Point> {
    vec![
        Point::new(10.0, 10.0),
        Point::new(-10.0, 10.0),
        Point::new(10.0, -10.0),
        Point::new(-10.0, -10.0),
    ]
}

/// Uniform integer coordinates over `[-field_size/2, field_size/2)` on both
/// axes.
///
/// `field_size` below 2 collapses the range to the origin.
pub fn random_field_point<R: Rng>(field_size: u32, rng: &mut R) -> Point {
    let half = i64::from(field_size / 2);
    if half == 0 {
        return Point::default();
    }
    let x = rng.random_range(-half..half);
    let z = rng.random_range(-half..half);
    Point::new(x as f32, z as f32)
}

#[derive(Debug, Clone)]
pub struct SpawnAllocator {
    layout: SpawnLayout,
    points: Vec<Point>,
    overflow: SpawnOverflow,
    field_size: u32,
}

impl SpawnAllocator {
    pub fn new(
        layout: SpawnLayout,
        points: Vec<Point>,
        overflow: SpawnOverflow,
        field_size: u32,
    ) -> Self {
        Self {
            layout,
            points,
            overflow,
            field_size,
        }
    }

    /// Spawn point for a player joining when `occupancy` players are
    /// already present.
    ///
    /// A fixed layout with no points behaves like a random one.
    pub fn initial_spawn<R: Rng>(&self, occupancy: usize, rng: &mut R) -> Point {
        if self.layout == SpawnLayout::Random || self.points.is_empty() {
            return self.random_point(rng);
        }
        let last = self.points.len() - 1;
        let index = match self.overflow {
            SpawnOverflow::Wrap => occupancy % self.points.len(),
            SpawnOverflow::Clamp => occupancy.min(last),
        };
        self.points[index]
    }

    /// Random point anywhere on this allocator's field. Used for respawns.
    pub fn random_point<R: Rng>(&self, rng: &mut R) -> Point {
        random_field_point(self.field_size, rng)
    }

    pub fn field_size(&self) -> u32 {
        self.field_size
    }
}

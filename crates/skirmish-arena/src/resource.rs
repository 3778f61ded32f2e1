//! Collectible apples.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::point::Point;
use crate::spawn::random_field_point;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Apple {
    pub id: u64,
    pub x: f32,
    pub z: f32,
}

impl Apple {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.z)
    }
}

/// Apples on the field, keyed by a room-wide id.
///
/// Ids start at 1, increase by one per apple created and are never reused.
/// Collecting an apple relocates it and keeps its id.
#[derive(Debug, Clone)]
pub struct ResourcePool {
    apples: Vec<Apple>,
    last_id: u64,
    field_size: u32,
}

impl ResourcePool {
    pub fn new(field_size: u32) -> Self {
        Self {
            apples: Vec::new(),
            last_id: 0,
            field_size,
        }
    }

    /// Creates `count` apples at random field points.
    pub fn seed<R: Rng>(&mut self, count: usize, rng: &mut R) {
        for _ in 0..count {
            let at = random_field_point(self.field_size, rng);
            self.create(at);
        }
    }

    /// Places one apple at `at` and returns its id.
    pub fn create(&mut self, at: Point) -> u64 {
        self.last_id += 1;
        self.apples.push(Apple {
            id: self.last_id,
            x: at.x,
            z: at.z,
        });
        self.last_id
    }

    /// Moves apple `id` to a fresh random point.
    ///
    /// Returns `false` when no apple has that id; nothing changes then.
    pub fn collect<R: Rng>(&mut self, id: u64, rng: &mut R) -> bool {
        let Some(apple) = self.apples.iter_mut().find(|a| a.id == id) else {
            return false;
        };
        let at = random_field_point(self.field_size, rng);
        apple.x = at.x;
        apple.z = at.z;
        true
    }

    pub fn get(&self, id: u64) -> Option<&Apple> {
        self.apples.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.apples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apples.is_empty()
    }

    /// Apples in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Apple> {
        self.apples.iter()
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_seed_assigns_sequential_ids() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = ResourcePool::new(40);

        pool.seed(5, &mut rng);

        let ids: Vec<u64> = pool.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(pool.last_id(), 5);
    }

    #[test]
    fn test_create_continues_sequence() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut pool = ResourcePool::new(40);
        pool.seed(2, &mut rng);

        let id = pool.create(Point::new(1.5, -2.5));

        assert_eq!(id, 3);
        let apple = pool.get(3).unwrap();
        assert_eq!(apple.position(), Point::new(1.5, -2.5));
    }

    #[test]
    fn test_collect_relocates_and_keeps_id() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = ResourcePool::new(10);
        pool.create(Point::new(0.5, 0.5));

        assert!(pool.collect(1, &mut rng));

        let apple = pool.get(1).unwrap();
        assert_eq!(apple.id, 1);
        // relocation lands on integer coordinates, never the hand-placed half
        assert_ne!(apple.position(), Point::new(0.5, 0.5));
        assert!((-5.0..5.0).contains(&apple.x));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_collect_unknown_id_changes_nothing() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut pool = ResourcePool::new(40);
        pool.seed(3, &mut rng);
        let before: Vec<Apple> = pool.iter().copied().collect();

        assert!(!pool.collect(999, &mut rng));

        let after: Vec<Apple> = pool.iter().copied().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_empty_pool() {
        let pool = ResourcePool::new(40);
        assert!(pool.is_empty());
        assert!(pool.get(1).is_none());
    }
}

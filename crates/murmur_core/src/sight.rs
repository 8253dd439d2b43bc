//! Line-of-sight predicates.
//!
//! The hunt only ever asks one question: is the straight segment between two
//! points free of obstacle geometry. Hosts with their own physics plug in a
//! closure; the simulation ships an open field and a sphere-obstacle world.

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub trait LineOfSight {
    /// `true` iff no obstacle intersects the segment `from -> to`.
    fn has_clear_path(&self, from: Vec3, to: Vec3) -> bool;
}

impl<F> LineOfSight for F
where
    F: Fn(Vec3, Vec3) -> bool,
{
    fn has_clear_path(&self, from: Vec3, to: Vec3) -> bool {
        self(from, to)
    }
}

/// Nothing ever blocks sight.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenField;

impl LineOfSight for OpenField {
    fn has_clear_path(&self, _from: Vec3, _to: Vec3) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereObstacle {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereObstacle {
    /// Segment/sphere intersection via the closest point on the segment.
    #[must_use]
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let seg = to - from;
        let len_sq = seg.length_squared();
        let t = if len_sq > 0.0 {
            ((self.center - from).dot(seg) / len_sq).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = from + seg * t;
        closest.distance_squared(self.center) <= self.radius * self.radius
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SphereObstacles {
    pub obstacles: Vec<SphereObstacle>,
}

impl SphereObstacles {
    #[must_use]
    pub fn new(obstacles: Vec<SphereObstacle>) -> Self {
        Self { obstacles }
    }
}

impl LineOfSight for SphereObstacles {
    fn has_clear_path(&self, from: Vec3, to: Vec3) -> bool {
        !self.obstacles.iter().any(|o| o.blocks(from, to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_between_points_blocks() {
        let world = SphereObstacles::new(vec![SphereObstacle {
            center: Vec3::new(5.0, 0.0, 0.0),
            radius: 1.0,
        }]);
        assert!(!world.has_clear_path(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
        assert!(world.has_clear_path(Vec3::ZERO, Vec3::new(0.0, 0.0, 10.0)));
    }

    #[test]
    fn test_sphere_behind_target_does_not_block() {
        let o = SphereObstacle {
            center: Vec3::new(12.0, 0.0, 0.0),
            radius: 1.0,
        };
        assert!(!o.blocks(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_closure_and_open_field() {
        let never = |_: Vec3, _: Vec3| false;
        assert!(!never.has_clear_path(Vec3::ZERO, Vec3::ONE));
        assert!(OpenField.has_clear_path(Vec3::ZERO, Vec3::ONE));
    }
}

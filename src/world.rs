//! World collision queries used by physics modules

use glam::DVec3;

/// Result of a successful trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionHit {
    /// Fraction of the segment travelled before the hit, in `[0, 1]`
    pub fraction: f64,
    /// Unit normal of the surface that was hit
    pub normal: DVec3,
}

impl CollisionHit {
    /// Point of impact on the segment `from -> to`
    #[must_use]
    pub fn point(&self, from: DVec3, to: DVec3) -> DVec3 {
        from + (to - from) * self.fraction
    }
}

/// Host collaborator answering "does moving from A to B hit something solid?"
pub trait WorldQuery: Send + Sync {
    /// Trace the segment `from -> to` and return the nearest hit, if any.
    fn trace(&self, from: DVec3, to: DVec3) -> Option<CollisionHit>;
}

/// An axis-aligned solid box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolidBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl SolidBox {
    /// Create a box from two opposite corners
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Slab test against the segment `from -> from + delta`.
    ///
    /// Segments starting inside the box do not hit it, so particles that
    /// spawn embedded in geometry can still escape.
    fn intersect(&self, from: DVec3, delta: DVec3) -> Option<CollisionHit> {
        let mut t_enter = 0.0_f64;
        let mut t_exit = 1.0_f64;
        let mut normal = DVec3::ZERO;

        for axis in 0..3 {
            let origin = from[axis];
            let d = delta[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < f64::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let (mut t0, mut t1) = ((lo - origin) / d, (hi - origin) / d);
            // Face crossed on entry along this axis points against the motion
            let mut face = DVec3::ZERO;
            face[axis] = -d.signum();
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_enter {
                t_enter = t0;
                normal = face;
            }
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }

        // A zero normal means the segment started inside the box
        if normal == DVec3::ZERO {
            return None;
        }
        Some(CollisionHit {
            fraction: t_enter,
            normal,
        })
    }
}

/// A world made of solid axis-aligned boxes
#[derive(Debug, Clone, Default)]
pub struct BoxWorld {
    boxes: Vec<SolidBox>,
}

impl BoxWorld {
    /// An empty world where nothing collides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A world with a single thick floor whose top face is at `height`
    #[must_use]
    pub fn ground(height: f64) -> Self {
        let extent = 1.0e6;
        Self::new().with_box(SolidBox::new(
            DVec3::new(-extent, height - extent, -extent),
            DVec3::new(extent, height, extent),
        ))
    }

    /// Add a solid box
    #[must_use]
    pub fn with_box(mut self, solid: SolidBox) -> Self {
        self.boxes.push(solid);
        self
    }

    /// Add a solid box in place
    pub fn add_box(&mut self, solid: SolidBox) {
        self.boxes.push(solid);
    }

    /// Number of boxes
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether the world has no boxes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl WorldQuery for BoxWorld {
    fn trace(&self, from: DVec3, to: DVec3) -> Option<CollisionHit> {
        let delta = to - from;
        self.boxes
            .iter()
            .filter_map(|solid| solid.intersect(from, delta))
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_hit() {
        let world = BoxWorld::ground(0.0);
        let hit = world
            .trace(DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, -1.0, 0.0))
            .unwrap();

        assert!((hit.fraction - 0.5).abs() < 1e-9);
        assert_eq!(hit.normal, DVec3::Y);
        assert_eq!(
            hit.point(DVec3::new(0.0, 1.0, 0.0), DVec3::new(0.0, -1.0, 0.0)),
            DVec3::ZERO
        );
    }

    #[test]
    fn test_miss() {
        let world = BoxWorld::ground(0.0);
        assert!(
            world
                .trace(DVec3::new(0.0, 2.0, 0.0), DVec3::new(5.0, 1.0, 0.0))
                .is_none()
        );
        assert!(BoxWorld::new().trace(DVec3::ZERO, DVec3::ONE).is_none());
    }

    #[test]
    fn test_wall_normal() {
        let world = BoxWorld::new().with_box(SolidBox::new(
            DVec3::new(1.0, -1.0, -1.0),
            DVec3::new(2.0, 1.0, 1.0),
        ));
        let hit = world.trace(DVec3::ZERO, DVec3::new(4.0, 0.0, 0.0)).unwrap();

        assert!((hit.fraction - 0.25).abs() < 1e-9);
        assert_eq!(hit.normal, DVec3::NEG_X);
    }

    #[test]
    fn test_nearest_box_wins() {
        let far = SolidBox::new(DVec3::new(3.0, -1.0, -1.0), DVec3::new(4.0, 1.0, 1.0));
        let near = SolidBox::new(DVec3::new(1.0, -1.0, -1.0), DVec3::new(2.0, 1.0, 1.0));
        let world = BoxWorld::new().with_box(far).with_box(near);

        let hit = world.trace(DVec3::ZERO, DVec3::new(5.0, 0.0, 0.0)).unwrap();
        assert!((hit.fraction - 0.2).abs() < 1e-9);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_start_inside_does_not_hit() {
        let world = BoxWorld::ground(0.0);
        assert!(
            world
                .trace(DVec3::new(0.0, -1.0, 0.0), DVec3::new(0.0, -2.0, 0.0))
                .is_none()
        );
    }
}

//! Back-to-front ordering for alpha blended particles

use super::ParticleGlobalUpdateModule;
use crate::bindings::Binding;
use crate::error::Result;
use crate::system::{ParticlePool, SortOrder};

/// Writes each particle's distance from a viewpoint into `depth` and orders
/// rendering farthest-first.
///
/// Only the pool's traversal order changes; records stay where they are.
/// Particles at equal depth keep their previous relative order.
///
/// Spawns queued during a tick are admitted after this module runs and are
/// appended to the end of the order, so they render last (regardless of
/// depth) until the next tick sorts them in.
#[derive(Debug, Clone)]
pub struct DepthSortModule {
    position: Binding,
    depth: Binding,
    viewpoint: Binding,
}

impl DepthSortModule {
    /// Create the module.
    ///
    /// `viewpoint` is read per particle, so a constant binding gives a fixed
    /// camera and a callback binding can track a moving one.
    ///
    /// # Errors
    ///
    /// `Configuration` if `position` or `viewpoint` is narrower than three
    /// values or `depth` is empty or read-only.
    pub fn new(
        position: impl Into<Binding>,
        depth: impl Into<Binding>,
        viewpoint: impl Into<Binding>,
    ) -> Result<Self> {
        let position = position.into();
        let depth = depth.into();
        let viewpoint = viewpoint.into();

        position.require(3, "position")?;
        depth.require(1, "depth")?;
        depth.require_writable("depth")?;
        viewpoint.require(3, "viewpoint")?;

        Ok(Self {
            position,
            depth,
            viewpoint,
        })
    }
}

impl ParticleGlobalUpdateModule for DepthSortModule {
    fn update(&mut self, pool: &mut ParticlePool) -> Result<()> {
        pool.try_for_each_mut(|particle| {
            let position = self.position.get_vec3(particle)?;
            let viewpoint = self.viewpoint.get_vec3(particle)?;
            self.depth
                .set(particle, 0, position.distance(viewpoint))
        })?;

        pool.sort_render_order_by_key(|particle| self.depth.get(particle, 0), SortOrder::Descending)
    }

    fn bindings(&self) -> Vec<&Binding> {
        vec![&self.position, &self.depth, &self.viewpoint]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{ConstantBinding, StoredBinding};
    use crate::error::ParticleError;

    #[test]
    fn test_farthest_first() {
        let mut module = DepthSortModule::new(
            StoredBinding::new(0, 3),
            StoredBinding::new(3, 1),
            ConstantBinding::new([0.0, 0.0, 0.0]),
        )
        .unwrap();

        let mut pool = ParticlePool::new(4);
        pool.acquire(10, &[0.0, 0.0, 5.0]);
        pool.acquire(10, &[1.0, 0.0, 0.0]);
        pool.acquire(10, &[0.0, -3.0, 0.0]);

        module.update(&mut pool).unwrap();

        let depths: Vec<f64> = pool.iter().map(|r| r[3]).collect();
        assert_eq!(depths, vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn test_rejects_constant_depth() {
        let result = DepthSortModule::new(
            StoredBinding::new(0, 3),
            ConstantBinding::scalar(0.0),
            ConstantBinding::new([0.0; 3]),
        );
        assert!(matches!(result, Err(ParticleError::Configuration(_))));
    }
}

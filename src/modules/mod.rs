//! Update and render modules
//!
//! Modules are the units of particle behavior. Update modules mutate one
//! particle record per call during a tick, global update modules see the whole
//! pool once per tick, and render modules turn one record into geometry per
//! frame. All of them reach particle fields only through their bindings.

mod depth_sort;
mod physics;
mod sprite;
mod velocity;

use crate::bindings::Binding;
use crate::error::Result;
use crate::render::DrawBuffer;
use crate::system::ParticlePool;

pub use depth_sort::DepthSortModule;
pub use physics::BasicPhysicsUpdateModule;
pub use sprite::SpriteRenderModule;
pub use velocity::VelocityUpdateModule;

/// Per-particle, per-tick mutation.
pub trait ParticleUpdateModule: Send + Sync {
    /// Update a single particle record in place.
    fn update(&self, particle: &mut [f64]) -> Result<()>;

    /// Every binding this module reads or writes.
    fn bindings(&self) -> Vec<&Binding>;
}

/// Whole-pool mutation, run once per tick after the per-particle modules.
pub trait ParticleGlobalUpdateModule: Send + Sync {
    /// Update the pool, including its render order.
    fn update(&mut self, pool: &mut ParticlePool) -> Result<()>;

    /// Every binding this module reads or writes.
    fn bindings(&self) -> Vec<&Binding>;
}

/// Per-particle, per-frame geometry emission.
///
/// Render modules only ever see an immutable record.
pub trait ParticleRenderModule: Send + Sync {
    /// Emit geometry for one particle.
    ///
    /// `partial_tick` is the fraction of time elapsed between the last two
    /// ticks, in `[0, 1]`.
    fn render(&self, particle: &[f64], partial_tick: f32, target: &mut dyn DrawBuffer)
    -> Result<()>;

    /// Every binding this module reads.
    fn bindings(&self) -> Vec<&Binding>;
}

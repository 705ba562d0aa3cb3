//! A data-oriented particle simulation core
//!
//! This crate provides:
//! - Flat `f64` particle records addressed through bindings
//! - Composable per-tick update modules (velocity, physics, depth sorting)
//! - Per-frame render modules emitting sprite quads to a host draw buffer
//! - A particle system tying pool, modules and spawning together

pub mod bindings;
pub mod core;
pub mod error;
pub mod modules;
pub mod render;
pub mod system;
pub mod world;

pub use error::{ParticleError, Result};

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::bindings::{
        Binding, CallbackBinding, ConstantBinding, ParticleBinding, StoredBinding,
    };
    pub use crate::core::{OverflowPolicy, ParticleDensity, SystemConfig, TickClock};
    pub use crate::error::{ParticleError, Result};
    pub use crate::modules::{
        BasicPhysicsUpdateModule, DepthSortModule, ParticleGlobalUpdateModule,
        ParticleRenderModule, ParticleUpdateModule, SpriteRenderModule, VelocityUpdateModule,
    };
    pub use crate::render::{
        Billboard, BlendMode, DrawBuffer, QuadBuffer, SpriteMaterial, SpriteQuad,
    };
    pub use crate::system::{ParticleId, ParticlePool, ParticleSystem, SpawnQueue};
    pub use crate::world::{BoxWorld, CollisionHit, SolidBox, WorldQuery};
    pub use glam::{DVec3, Vec3};
}

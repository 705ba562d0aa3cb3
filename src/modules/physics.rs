//! Gravity, collision and drag

use std::fmt;
use std::sync::Arc;

use glam::DVec3;

use super::ParticleUpdateModule;
use crate::bindings::{Binding, ConstantBinding};
use crate::error::Result;
use crate::world::WorldQuery;

/// Distance particles are pushed off a surface after a hit
const COLLISION_EPSILON: f64 = 1.0e-3;

/// Simple particle physics.
///
/// Each tick runs these steps in order:
///
/// 1. **Gravity**: `velocity.y -= gravity`
/// 2. **Integrate**: the particle moves by `velocity`
/// 3. **Collision**: if the move crosses a surface reported by the world, the
///    particle stops just above the hit point and the normal component of its
///    velocity is reflected and scaled by `bounciness`
/// 4. **Friction and damping**: after a hit, velocity along the surface is
///    scaled by `1 - friction * (1 - fraction)`, where `fraction` is the part
///    of the tick spent before the hit; then all velocity is scaled by
///    `1 - damping`
///
/// `previous_position` (when bound) receives the position from before step 2.
pub struct BasicPhysicsUpdateModule {
    position: Binding,
    velocity: Binding,
    previous_position: Option<Binding>,
    gravity: Binding,
    bounciness: Binding,
    friction: Binding,
    damping: Binding,
    enable_collision: bool,
    world: Option<Arc<dyn WorldQuery>>,
}

impl BasicPhysicsUpdateModule {
    /// Default downward acceleration per tick
    pub const DEFAULT_GRAVITY: f64 = 0.04;
    /// Default fraction of normal velocity kept on a bounce
    pub const DEFAULT_BOUNCINESS: f64 = 0.2;
    /// Default surface friction
    pub const DEFAULT_FRICTION: f64 = 0.2;
    /// Default per-tick velocity loss
    pub const DEFAULT_DAMPING: f64 = 0.01;

    /// Create the module with default physical constants and no collision.
    ///
    /// # Errors
    ///
    /// `Configuration` if `position` or `velocity` is narrower than three
    /// values or read-only.
    pub fn new(position: impl Into<Binding>, velocity: impl Into<Binding>) -> Result<Self> {
        let position = position.into();
        let velocity = velocity.into();

        position.require(3, "position")?;
        position.require_writable("position")?;
        velocity.require(3, "velocity")?;
        velocity.require_writable("velocity")?;

        Ok(Self {
            position,
            velocity,
            previous_position: None,
            gravity: ConstantBinding::scalar(Self::DEFAULT_GRAVITY).into(),
            bounciness: ConstantBinding::scalar(Self::DEFAULT_BOUNCINESS).into(),
            friction: ConstantBinding::scalar(Self::DEFAULT_FRICTION).into(),
            damping: ConstantBinding::scalar(Self::DEFAULT_DAMPING).into(),
            enable_collision: false,
            world: None,
        })
    }

    /// Record the pre-move position each tick.
    pub fn with_previous_position(mut self, previous: impl Into<Binding>) -> Result<Self> {
        let previous = previous.into();
        previous.require(3, "previous position")?;
        previous.require_writable("previous position")?;
        self.previous_position = Some(previous);
        Ok(self)
    }

    /// Set the gravity binding.
    pub fn with_gravity(mut self, gravity: impl Into<Binding>) -> Result<Self> {
        self.gravity = scalar(gravity, "gravity")?;
        Ok(self)
    }

    /// Set the bounciness binding.
    pub fn with_bounciness(mut self, bounciness: impl Into<Binding>) -> Result<Self> {
        self.bounciness = scalar(bounciness, "bounciness")?;
        Ok(self)
    }

    /// Set the friction binding.
    pub fn with_friction(mut self, friction: impl Into<Binding>) -> Result<Self> {
        self.friction = scalar(friction, "friction")?;
        Ok(self)
    }

    /// Set the damping binding.
    pub fn with_damping(mut self, damping: impl Into<Binding>) -> Result<Self> {
        self.damping = scalar(damping, "damping")?;
        Ok(self)
    }

    /// Collide against `world`.
    #[must_use]
    pub fn with_world(mut self, world: Arc<dyn WorldQuery>) -> Self {
        self.world = Some(world);
        self.enable_collision = true;
        self
    }

    /// Enable or disable collision without dropping the world.
    #[must_use]
    pub fn with_collision(mut self, enable: bool) -> Self {
        self.enable_collision = enable;
        self
    }
}

fn scalar(binding: impl Into<Binding>, role: &str) -> Result<Binding> {
    let binding = binding.into();
    binding.require(1, role)?;
    Ok(binding)
}

impl fmt::Debug for BasicPhysicsUpdateModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicPhysicsUpdateModule")
            .field("position", &self.position)
            .field("velocity", &self.velocity)
            .field("previous_position", &self.previous_position)
            .field("enable_collision", &self.enable_collision)
            .field("has_world", &self.world.is_some())
            .finish_non_exhaustive()
    }
}

impl ParticleUpdateModule for BasicPhysicsUpdateModule {
    fn update(&self, particle: &mut [f64]) -> Result<()> {
        let start = self.position.get_vec3(particle)?;
        if let Some(previous) = &self.previous_position {
            previous.set_vec3(particle, start)?;
        }

        let mut velocity = self.velocity.get_vec3(particle)?;
        velocity.y -= self.gravity.get(particle, 0)?;

        let target = start + velocity;
        let mut end = target;

        let world = self.world.as_deref().filter(|_| self.enable_collision);
        if let Some(hit) = world.and_then(|world| world.trace(start, target)) {
            end = hit.point(start, target) + hit.normal * COLLISION_EPSILON;

            let normal_speed = velocity.dot(hit.normal);
            let slide = 1.0 - hit.fraction;
            let tangent = (velocity - hit.normal * normal_speed)
                * (1.0 - self.friction.get(particle, 0)? * slide);
            let bounce = -hit.normal * normal_speed * self.bounciness.get(particle, 0)?;
            velocity = tangent + bounce;
        }

        velocity *= 1.0 - self.damping.get(particle, 0)?;

        self.position.set_vec3(particle, end)?;
        self.velocity.set_vec3(particle, velocity)
    }

    fn bindings(&self) -> Vec<&Binding> {
        let mut bindings = vec![
            &self.position,
            &self.velocity,
            &self.gravity,
            &self.bounciness,
            &self.friction,
            &self.damping,
        ];
        bindings.extend(self.previous_position.as_ref());
        bindings
    }
}

//! Plain velocity integration

use super::ParticleUpdateModule;
use crate::bindings::Binding;
use crate::error::Result;

/// Moves `position` by `velocity` once per tick.
///
/// Each axis first copies the current position into `previous_position` (when
/// bound) and then adds the velocity.
#[derive(Debug, Clone)]
pub struct VelocityUpdateModule {
    position: Binding,
    velocity: Binding,
    previous_position: Option<Binding>,
}

impl VelocityUpdateModule {
    /// Create the module.
    ///
    /// # Errors
    ///
    /// `Configuration` if `position` or `previous_position` is narrower than
    /// three values or read-only, or if `velocity` is narrower than three.
    pub fn new(
        position: impl Into<Binding>,
        velocity: impl Into<Binding>,
        previous_position: Option<Binding>,
    ) -> Result<Self> {
        let position = position.into();
        let velocity = velocity.into();

        position.require(3, "position")?;
        position.require_writable("position")?;
        velocity.require(3, "velocity")?;
        if let Some(previous) = &previous_position {
            previous.require(3, "previous position")?;
            previous.require_writable("previous position")?;
        }

        Ok(Self {
            position,
            velocity,
            previous_position,
        })
    }
}

impl ParticleUpdateModule for VelocityUpdateModule {
    fn update(&self, particle: &mut [f64]) -> Result<()> {
        for axis in 0..3 {
            let pos = self.position.get(particle, axis)?;
            if let Some(previous) = &self.previous_position {
                previous.set(particle, axis, pos)?;
            }
            let velocity = self.velocity.get(particle, axis)?;
            self.position.set(particle, axis, pos + velocity)?;
        }
        Ok(())
    }

    fn bindings(&self) -> Vec<&Binding> {
        let mut bindings = vec![&self.position, &self.velocity];
        bindings.extend(self.previous_position.as_ref());
        bindings
    }
}

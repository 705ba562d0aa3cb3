//! Particle bindings
//!
//! A binding is a fixed-width, bounds-checked view over part of a particle
//! record. Modules never index records directly; they read and write fields
//! through the bindings they were constructed with. One binding instance is
//! shared by every particle in a system.

mod callback;
mod constant;
mod stored;

use std::fmt;
use std::ops::{Deref, Range};
use std::sync::Arc;

use crate::error::{ParticleError, Result};

pub use callback::CallbackBinding;
pub use constant::ConstantBinding;
pub use stored::StoredBinding;

// ============================================================================
// Binding Trait
// ============================================================================

/// A view over a window of a particle record.
pub trait ParticleBinding: Send + Sync {
    /// Number of values this binding exposes.
    fn size(&self) -> usize;

    /// Read the value at `index`.
    ///
    /// # Errors
    ///
    /// [`ParticleError::IndexOutOfRange`] when `index >= self.size()`.
    fn get(&self, particle: &[f64], index: usize) -> Result<f64>;

    /// Write the value at `index`.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Unsupported`] for read-only bindings and
    /// [`ParticleError::IndexOutOfRange`] when `index >= self.size()`.
    fn set(&self, particle: &mut [f64], index: usize, value: f64) -> Result<()>;

    /// Whether `set` is supported.
    fn is_writable(&self) -> bool {
        false
    }

    /// The record window this binding touches, if it is backed by the record.
    fn stored_range(&self) -> Option<Range<usize>> {
        None
    }

    /// Short name used in diagnostics.
    fn kind(&self) -> &'static str;
}

/// Fail with [`ParticleError::IndexOutOfRange`] unless `index < size`.
#[inline]
pub(crate) fn check_index(index: usize, size: usize) -> Result<()> {
    if index < size {
        Ok(())
    } else {
        Err(ParticleError::IndexOutOfRange { index, size })
    }
}

// ============================================================================
// Shared Handle
// ============================================================================

/// Cloneable handle to any binding, held by modules.
#[derive(Clone)]
pub struct Binding(Arc<dyn ParticleBinding>);

impl Binding {
    /// Wrap a binding in a shared handle.
    pub fn new(binding: impl ParticleBinding + 'static) -> Self {
        Self(Arc::new(binding))
    }

    /// Ensure the binding exposes at least `min` values.
    ///
    /// `role` names the module parameter in the error message.
    pub fn require(&self, min: usize, role: &str) -> Result<()> {
        if self.size() < min {
            return Err(ParticleError::configuration(format!(
                "{role} binding needs at least {min} values, {} binding has {}",
                self.kind(),
                self.size()
            )));
        }
        Ok(())
    }

    /// Ensure the binding accepts writes.
    pub fn require_writable(&self, role: &str) -> Result<()> {
        if !self.is_writable() {
            return Err(ParticleError::configuration(format!(
                "{role} binding must be writable, got a {} binding",
                self.kind()
            )));
        }
        Ok(())
    }

    /// Read the first three values as a vector.
    pub(crate) fn get_vec3(&self, particle: &[f64]) -> Result<glam::DVec3> {
        Ok(glam::DVec3::new(
            self.get(particle, 0)?,
            self.get(particle, 1)?,
            self.get(particle, 2)?,
        ))
    }

    /// Write a vector into the first three values.
    pub(crate) fn set_vec3(&self, particle: &mut [f64], value: glam::DVec3) -> Result<()> {
        self.set(particle, 0, value.x)?;
        self.set(particle, 1, value.y)?;
        self.set(particle, 2, value.z)
    }
}

impl Deref for Binding {
    type Target = dyn ParticleBinding;

    fn deref(&self) -> &Self::Target {
        &*self.0
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("kind", &self.kind())
            .field("size", &self.size())
            .field("range", &self.stored_range())
            .finish()
    }
}

impl From<StoredBinding> for Binding {
    fn from(binding: StoredBinding) -> Self {
        Self::new(binding)
    }
}

impl From<ConstantBinding> for Binding {
    fn from(binding: ConstantBinding) -> Self {
        Self::new(binding)
    }
}

impl From<CallbackBinding> for Binding {
    fn from(binding: CallbackBinding) -> Self {
        Self::new(binding)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_narrow_binding() {
        let binding = Binding::from(StoredBinding::new(0, 2));
        assert!(binding.require(2, "velocity").is_ok());

        let err = binding.require(3, "velocity").unwrap_err();
        assert!(matches!(err, ParticleError::Configuration(_)));
    }

    #[test]
    fn test_require_writable() {
        let stored = Binding::from(StoredBinding::new(0, 1));
        let constant = Binding::from(ConstantBinding::new([1.0]));

        assert!(stored.require_writable("depth").is_ok());
        assert!(constant.require_writable("depth").is_err());
    }

    #[test]
    fn test_vec3_helpers() {
        let binding = Binding::from(StoredBinding::new(1, 3));
        let mut record = [0.0; 4];

        binding
            .set_vec3(&mut record, glam::DVec3::new(1.0, 2.0, 3.0))
            .unwrap();
        assert_eq!(record, [0.0, 1.0, 2.0, 3.0]);
        assert_eq!(
            binding.get_vec3(&record).unwrap(),
            glam::DVec3::new(1.0, 2.0, 3.0)
        );
    }
}

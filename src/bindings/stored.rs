//! Bindings backed by a window of the particle record

use std::ops::Range;

use super::{ParticleBinding, check_index};
use crate::error::{ParticleError, Result};

/// A read-write binding over `particle[offset..offset + size]`.
///
/// Whether the window fits inside the record is checked once, when the owning
/// system is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredBinding {
    offset: usize,
    size: usize,
}

impl StoredBinding {
    /// Create a binding over `size` values starting at `offset`.
    #[must_use]
    pub const fn new(offset: usize, size: usize) -> Self {
        Self { offset, size }
    }

    /// First record index covered by this binding.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Write all `size` values at once.
    ///
    /// # Errors
    ///
    /// [`ParticleError::Configuration`] if `values.len() != self.size()`.
    pub fn set_all(&self, particle: &mut [f64], values: &[f64]) -> Result<()> {
        if values.len() != self.size {
            return Err(ParticleError::configuration(format!(
                "stored binding of size {} given {} values",
                self.size,
                values.len()
            )));
        }
        let record_len = particle.len();
        let end = self.offset.saturating_add(self.size);
        let window = particle
            .get_mut(self.offset..end)
            .ok_or(ParticleError::IndexOutOfRange {
                index: end.saturating_sub(1),
                size: record_len,
            })?;
        window.copy_from_slice(values);
        Ok(())
    }

    fn slot(&self, index: usize, record_len: usize) -> Result<usize> {
        check_index(index, self.size)?;
        let slot = self
            .offset
            .checked_add(index)
            .ok_or(ParticleError::IndexOutOfRange {
                index: usize::MAX,
                size: record_len,
            })?;
        // A too-short record means the binding was used outside its system.
        check_index(slot, record_len)?;
        Ok(slot)
    }
}

impl ParticleBinding for StoredBinding {
    fn size(&self) -> usize {
        self.size
    }

    #[inline]
    fn get(&self, particle: &[f64], index: usize) -> Result<f64> {
        let slot = self.slot(index, particle.len())?;
        Ok(particle[slot])
    }

    #[inline]
    fn set(&self, particle: &mut [f64], index: usize, value: f64) -> Result<()> {
        let slot = self.slot(index, particle.len())?;
        particle[slot] = value;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn stored_range(&self) -> Option<Range<usize>> {
        // Saturates so an overflowing window still fails the record check
        Some(self.offset..self.offset.saturating_add(self.size))
    }

    fn kind(&self) -> &'static str {
        "stored"
    }
}

//! Read-only bindings with fixed values

use smallvec::SmallVec;

use super::{ParticleBinding, check_index};
use crate::error::{ParticleError, Result};

/// A binding that returns the same values for every particle.
///
/// Used for parameters such as gravity or sprite size that do not vary per
/// particle and so cost no record space.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantBinding {
    values: SmallVec<[f64; 4]>,
}

impl ConstantBinding {
    /// Create a binding from one or more values.
    ///
    /// An empty value list yields a zero-sized binding, which any module's
    /// size check will reject.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// A single-value binding.
    #[must_use]
    pub fn scalar(value: f64) -> Self {
        Self::new([value])
    }

    /// The constant values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl From<f64> for ConstantBinding {
    fn from(value: f64) -> Self {
        Self::scalar(value)
    }
}

impl From<glam::DVec3> for ConstantBinding {
    fn from(value: glam::DVec3) -> Self {
        Self::new(value.to_array())
    }
}

impl ParticleBinding for ConstantBinding {
    fn size(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn get(&self, _particle: &[f64], index: usize) -> Result<f64> {
        check_index(index, self.values.len())?;
        Ok(self.values[index])
    }

    fn set(&self, _particle: &mut [f64], _index: usize, _value: f64) -> Result<()> {
        Err(ParticleError::Unsupported("constant bindings are read-only"))
    }

    fn kind(&self) -> &'static str {
        "constant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignores_particle_record() {
        let binding = ConstantBinding::new([0.5, 2.0]);

        assert_eq!(binding.size(), 2);
        assert_eq!(binding.get(&[], 0).unwrap(), 0.5);
        assert_eq!(binding.get(&[], 1).unwrap(), 2.0);
        assert_eq!(binding.get(&[7.0, 7.0, 7.0], 1).unwrap(), 2.0);
    }

    #[test]
    fn test_set_unsupported() {
        let binding = ConstantBinding::scalar(1.0);
        let mut record = [0.0; 2];

        assert!(matches!(
            binding.set(&mut record, 0, 3.0),
            Err(ParticleError::Unsupported(_))
        ));
        assert_eq!(record, [0.0; 2]);
        assert!(!binding.is_writable());
    }

    #[test]
    fn test_index_out_of_range() {
        let binding = ConstantBinding::scalar(1.0);
        assert_eq!(
            binding.get(&[], 1),
            Err(ParticleError::IndexOutOfRange { index: 1, size: 1 })
        );
    }

    #[test]
    fn test_from_vector() {
        let binding = ConstantBinding::from(glam::DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(binding.values(), &[1.0, 2.0, 3.0]);
    }
}

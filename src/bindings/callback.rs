//! Read-only bindings computed from the particle record

use std::fmt;
use std::sync::Arc;

use smallvec::{SmallVec, smallvec};

use super::{ParticleBinding, check_index};
use crate::error::{ParticleError, Result};

type Callback = dyn Fn(&[f64], &mut [f64]) + Send + Sync;

/// A derived binding whose contents are computed on every read.
///
/// The callback receives the particle record and fills a buffer of `size`
/// values. Typical uses are values derived from other fields, e.g. a color
/// fading with a stored age.
#[derive(Clone)]
pub struct CallbackBinding {
    size: usize,
    callback: Arc<Callback>,
}

impl CallbackBinding {
    /// Create a derived binding of `size` values.
    pub fn new(size: usize, callback: impl Fn(&[f64], &mut [f64]) + Send + Sync + 'static) -> Self {
        Self {
            size,
            callback: Arc::new(callback),
        }
    }

    /// Compute every value at once.
    #[must_use]
    pub fn load(&self, particle: &[f64]) -> SmallVec<[f64; 4]> {
        let mut contents: SmallVec<[f64; 4]> = smallvec![0.0; self.size];
        (self.callback)(particle, &mut contents);
        contents
    }
}

impl fmt::Debug for CallbackBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBinding")
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ParticleBinding for CallbackBinding {
    fn size(&self) -> usize {
        self.size
    }

    fn get(&self, particle: &[f64], index: usize) -> Result<f64> {
        check_index(index, self.size)?;
        Ok(self.load(particle)[index])
    }

    fn set(&self, _particle: &mut [f64], _index: usize, _value: f64) -> Result<()> {
        Err(ParticleError::Unsupported("callback bindings are read-only"))
    }

    fn kind(&self) -> &'static str {
        "callback"
    }
}

//! Particle system configuration

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// What `add_particle` does when the pool is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverflowPolicy {
    /// Silently discard the new particle
    #[default]
    Drop,
    /// Return [`ParticleError::CapacityExceeded`](crate::ParticleError::CapacityExceeded)
    Reject,
    /// Ignore the limit and keep growing the pool
    Grow,
}

/// Host-wide particle density setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleDensity {
    /// Spawn counts are used as given
    #[default]
    All,
    /// Spawn counts are halved
    Decreased,
    /// Spawn counts are quartered
    Minimal,
}

impl ParticleDensity {
    /// Multiplier applied to spawn counts
    #[must_use]
    pub const fn factor(self) -> f64 {
        match self {
            Self::All => 1.0,
            Self::Decreased => 0.5,
            Self::Minimal => 0.25,
        }
    }
}

/// Particle system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Maximum number of live particles (`None` for unbounded)
    pub max_particles: Option<usize>,
    /// What happens when `max_particles` is reached
    pub overflow: OverflowPolicy,
    /// Density used by `adjust_particle_count`
    pub density: ParticleDensity,
    /// Whether `adjust_particle_count` ignores `density`
    pub ignore_density: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            max_particles: None,
            overflow: OverflowPolicy::Drop,
            density: ParticleDensity::All,
            ignore_density: false,
        }
    }
}

impl SystemConfig {
    /// Parse a config from RON text
    ///
    /// # Errors
    ///
    /// [`ParticleError::Config`](crate::ParticleError::Config) if the text is
    /// not a valid config.
    pub fn from_ron(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Set maximum particles
    #[must_use]
    pub const fn with_max_particles(mut self, max: usize) -> Self {
        self.max_particles = Some(max);
        self
    }

    /// Set overflow policy
    #[must_use]
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set density
    #[must_use]
    pub const fn with_density(mut self, density: ParticleDensity) -> Self {
        self.density = density;
        self
    }

    /// Ignore the density setting
    #[must_use]
    pub const fn with_ignore_density(mut self, ignore: bool) -> Self {
        self.ignore_density = ignore;
        self
    }
}

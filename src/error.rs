//! Error types shared by bindings, modules and systems

use thiserror::Error;

/// Errors raised by the particle core.
///
/// `Configuration` is reported while wiring a system together.
/// `IndexOutOfRange` and `Unsupported` indicate a binding wiring bug and are
/// not expected once construction has succeeded. `CapacityExceeded` is the
/// only recoverable variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParticleError {
    /// Invalid binding sizes, record layouts or module parameters
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A binding was accessed past its declared size
    #[error("binding index {index} out of range for size {size}")]
    IndexOutOfRange {
        /// Requested local index
        index: usize,
        /// Declared binding size
        size: usize,
    },

    /// Write attempted on a read-only binding
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Spawn request on a full pool with the `Reject` overflow policy
    #[error("particle capacity of {max} exceeded")]
    CapacityExceeded {
        /// Configured maximum particle count
        max: usize,
    },

    /// A configuration file could not be parsed
    #[error("failed to parse config: {0}")]
    Config(String),
}

impl ParticleError {
    /// Shorthand for a [`ParticleError::Configuration`] error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<ron::error::SpannedError> for ParticleError {
    fn from(err: ron::error::SpannedError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ParticleError>;

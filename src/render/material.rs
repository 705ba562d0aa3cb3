//! Sprite material descriptors

use serde::{Deserialize, Serialize};

/// How sprite fragments combine with what is already drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// Standard alpha blending (needs back-to-front order)
    #[default]
    Alpha,
    /// Additive glow, order independent
    Additive,
    /// No blending
    Opaque,
}

/// Render state for a batch of sprites.
///
/// Built once when a render module is constructed; the host maps it onto its
/// own pipeline objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteMaterial {
    /// Texture identifier understood by the host
    pub texture: String,
    /// Blend mode
    pub blend: BlendMode,
    /// Whether sprites write to the depth buffer
    pub write_depth: bool,
    /// Linear (true) or nearest (false) texture filtering
    pub blur: bool,
}

impl SpriteMaterial {
    /// Create a material with alpha blending and depth writes
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            blend: BlendMode::Alpha,
            write_depth: true,
            blur: false,
        }
    }

    /// Set blend mode
    #[must_use]
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Enable or disable depth writes
    #[must_use]
    pub fn with_write_depth(mut self, write_depth: bool) -> Self {
        self.write_depth = write_depth;
        self
    }

    /// Enable or disable linear filtering
    #[must_use]
    pub fn with_blur(mut self, blur: bool) -> Self {
        self.blur = blur;
        self
    }
}

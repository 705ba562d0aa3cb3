//! Rendering boundary
//!
//! Render modules emit [`SpriteQuad`]s into a host-supplied [`DrawBuffer`].
//! [`QuadBuffer`] is a ready-made buffer producing camera-facing vertices.

mod billboard;
mod buffer;
mod material;

pub use billboard::Billboard;
pub use buffer::{QuadBuffer, SpriteBatch, SpriteVertex};
pub use material::{BlendMode, SpriteMaterial};

/// One sprite emitted by a render module
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteQuad {
    /// Interpolated world position of the sprite center
    pub position: [f32; 3],
    /// Color (RGBA)
    pub color: [f32; 4],
    /// Edge length in world units
    pub size: f32,
    /// Top-left texture coordinate
    pub uv_min: [f32; 2],
    /// Bottom-right texture coordinate
    pub uv_max: [f32; 2],
}

/// Host collaborator receiving emitted geometry
pub trait DrawBuffer {
    /// Accept one quad drawn with `material`.
    fn push_quad(&mut self, material: &SpriteMaterial, quad: SpriteQuad);
}

impl DrawBuffer for Vec<(SpriteMaterial, SpriteQuad)> {
    fn push_quad(&mut self, material: &SpriteMaterial, quad: SpriteQuad) {
        self.push((material.clone(), quad));
    }
}

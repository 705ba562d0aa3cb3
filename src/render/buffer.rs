//! CPU-side sprite vertex batches

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::{Billboard, DrawBuffer, SpriteMaterial, SpriteQuad};

/// Vertex with position, color, and UV coordinates
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
    pub uv: [f32; 2],
}

/// Consecutive quads sharing one material
#[derive(Debug, Clone)]
pub struct SpriteBatch {
    /// Material all vertices in this batch are drawn with
    pub material: SpriteMaterial,
    /// Four vertices per quad, counter-clockwise from bottom-left
    pub vertices: Vec<SpriteVertex>,
}

impl SpriteBatch {
    /// Number of quads in the batch
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Raw vertex bytes for GPU upload
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// A [`DrawBuffer`] that expands quads into camera-facing vertices.
///
/// A new batch starts whenever the material changes, so the emission order of
/// render modules is the draw order.
#[derive(Debug, Clone, Default)]
pub struct QuadBuffer {
    billboard: Billboard,
    batches: Vec<SpriteBatch>,
}

impl QuadBuffer {
    /// Create an empty buffer facing the given viewer
    #[must_use]
    pub fn new(billboard: Billboard) -> Self {
        Self {
            billboard,
            batches: Vec::new(),
        }
    }

    /// Update the viewer orientation for subsequent quads
    pub fn set_billboard(&mut self, billboard: Billboard) {
        self.billboard = billboard;
    }

    /// Emitted batches in draw order
    #[must_use]
    pub fn batches(&self) -> &[SpriteBatch] {
        &self.batches
    }

    /// Total number of quads across all batches
    #[must_use]
    pub fn quad_count(&self) -> usize {
        self.batches.iter().map(SpriteBatch::quad_count).sum()
    }

    /// Drop all batches, keeping nothing for the next frame
    pub fn clear(&mut self) {
        self.batches.clear();
    }

    fn batch_for(&mut self, material: &SpriteMaterial) -> &mut Vec<SpriteVertex> {
        let reuse = self
            .batches
            .last()
            .is_some_and(|batch| batch.material == *material);
        if !reuse {
            self.batches.push(SpriteBatch {
                material: material.clone(),
                vertices: Vec::new(),
            });
        }
        let last = self.batches.len() - 1;
        &mut self.batches[last].vertices
    }
}

impl DrawBuffer for QuadBuffer {
    fn push_quad(&mut self, material: &SpriteMaterial, quad: SpriteQuad) {
        let half = quad.size * 0.5;
        let right = self.billboard.right() * half;
        let up = self.billboard.screen_up() * half;
        let center = Vec3::from(quad.position);
        let [u0, v0] = quad.uv_min;
        let [u1, v1] = quad.uv_max;

        let corners = [
            (center - right - up, [u0, v1]),
            (center + right - up, [u1, v1]),
            (center + right + up, [u1, v0]),
            (center - right + up, [u0, v0]),
        ];

        let vertices = self.batch_for(material);
        vertices.extend(corners.iter().map(|(position, uv)| SpriteVertex {
            position: position.to_array(),
            color: quad.color,
            uv: *uv,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BlendMode;

    fn quad(x: f32) -> SpriteQuad {
        SpriteQuad {
            position: [x, 0.0, 0.0],
            color: [1.0, 0.5, 0.25, 1.0],
            size: 2.0,
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
        }
    }

    #[test]
    fn test_quad_expansion() {
        let mut buffer = QuadBuffer::new(Billboard::new());
        let material = SpriteMaterial::new("glow");

        buffer.push_quad(&material, quad(0.0));

        let batch = &buffer.batches()[0];
        assert_eq!(batch.quad_count(), 1);
        assert_eq!(batch.vertices[0].position, [-1.0, -1.0, 0.0]);
        assert_eq!(batch.vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(batch.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(batch.vertices[2].uv, [1.0, 0.0]);
        assert_eq!(batch.vertices[1].color, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(batch.as_bytes().len(), 4 * std::mem::size_of::<SpriteVertex>());
    }

    #[test]
    fn test_batches_split_on_material_change() {
        let mut buffer = QuadBuffer::default();
        let glow = SpriteMaterial::new("glow").with_blend(BlendMode::Additive);
        let smoke = SpriteMaterial::new("smoke");

        buffer.push_quad(&glow, quad(0.0));
        buffer.push_quad(&glow, quad(1.0));
        buffer.push_quad(&smoke, quad(2.0));
        buffer.push_quad(&glow, quad(3.0));

        let counts: Vec<usize> = buffer.batches().iter().map(SpriteBatch::quad_count).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(buffer.quad_count(), 4);

        buffer.clear();
        assert_eq!(buffer.quad_count(), 0);
    }
}

//! Camera-facing sprite emission

use super::ParticleRenderModule;
use crate::bindings::Binding;
use crate::error::{ParticleError, Result};
use crate::render::{DrawBuffer, SpriteMaterial, SpriteQuad};

/// Emits one textured quad per particle.
///
/// The quad sits between `previous_position` and `position`, interpolated by
/// the frame's partial tick. With a sprite sheet configured the texture is
/// split into `sheet_size × sheet_size` cells, numbered row by row from the
/// top left, and `sprite_index` picks one.
#[derive(Debug, Clone)]
pub struct SpriteRenderModule {
    material: SpriteMaterial,
    position: Binding,
    previous_position: Binding,
    color: Binding,
    size: Binding,
    sprite_sheet: Option<(u32, Binding)>,
    alpha_multiplier: Option<Binding>,
}

impl SpriteRenderModule {
    /// Create the module.
    ///
    /// Pass the same binding as `position` and `previous_position` for
    /// particles that do not move.
    ///
    /// # Errors
    ///
    /// `Configuration` if a position binding has fewer than three values,
    /// `color` fewer than four or `size` none.
    pub fn new(
        material: SpriteMaterial,
        position: impl Into<Binding>,
        previous_position: impl Into<Binding>,
        color: impl Into<Binding>,
        size: impl Into<Binding>,
    ) -> Result<Self> {
        let position = position.into();
        let previous_position = previous_position.into();
        let color = color.into();
        let size = size.into();

        position.require(3, "position")?;
        previous_position.require(3, "previous position")?;
        color.require(4, "color")?;
        size.require(1, "size")?;

        Ok(Self {
            material,
            position,
            previous_position,
            color,
            size,
            sprite_sheet: None,
            alpha_multiplier: None,
        })
    }

    /// Select sprites from a `sheet_size × sheet_size` sheet.
    ///
    /// # Errors
    ///
    /// `Configuration` if the sheet has no cells, more cells than fit in a
    /// `u32`, or `sprite_index` is empty.
    pub fn with_sprite_sheet(mut self, sheet_size: u32, sprite_index: impl Into<Binding>) -> Result<Self> {
        if sheet_size == 0 {
            return Err(ParticleError::configuration("sprite sheet needs at least one cell"));
        }
        if sheet_size.checked_mul(sheet_size).is_none() {
            return Err(ParticleError::configuration(format!(
                "sprite sheet of {sheet_size}x{sheet_size} cells is too large"
            )));
        }
        let sprite_index = sprite_index.into();
        sprite_index.require(1, "sprite index")?;
        self.sprite_sheet = Some((sheet_size, sprite_index));
        Ok(self)
    }

    /// Scale each particle's alpha by a bound value.
    pub fn with_alpha_multiplier(mut self, alpha: impl Into<Binding>) -> Result<Self> {
        let alpha = alpha.into();
        alpha.require(1, "alpha multiplier")?;
        self.alpha_multiplier = Some(alpha);
        Ok(self)
    }

    /// Material every quad is emitted with
    #[must_use]
    pub fn material(&self) -> &SpriteMaterial {
        &self.material
    }

    fn uvs(&self, particle: &[f64]) -> Result<([f32; 2], [f32; 2])> {
        let Some((sheet_size, sprite_index)) = &self.sprite_sheet else {
            return Ok(([0.0, 0.0], [1.0, 1.0]));
        };

        // Cannot overflow, checked in `with_sprite_sheet`
        let last_cell = sheet_size * sheet_size - 1;
        let index = sprite_index.get(particle, 0)?;
        let cell = if index.is_nan() {
            0
        } else {
            index.floor().clamp(0.0, f64::from(last_cell)) as u32
        };

        let step = 1.0 / *sheet_size as f32;
        let u = (cell % sheet_size) as f32 * step;
        let v = (cell / sheet_size) as f32 * step;
        Ok(([u, v], [u + step, v + step]))
    }
}

impl ParticleRenderModule for SpriteRenderModule {
    fn render(
        &self,
        particle: &[f64],
        partial_tick: f32,
        target: &mut dyn DrawBuffer,
    ) -> Result<()> {
        let previous = self.previous_position.get_vec3(particle)?;
        let current = self.position.get_vec3(particle)?;
        let position = previous.lerp(current, f64::from(partial_tick));

        let mut color = [0.0_f32; 4];
        for (channel, value) in color.iter_mut().enumerate() {
            *value = self.color.get(particle, channel)? as f32;
        }
        if let Some(alpha) = &self.alpha_multiplier {
            color[3] *= alpha.get(particle, 0)? as f32;
        }

        let (uv_min, uv_max) = self.uvs(particle)?;
        target.push_quad(
            &self.material,
            SpriteQuad {
                position: position.as_vec3().to_array(),
                color,
                size: self.size.get(particle, 0)? as f32,
                uv_min,
                uv_max,
            },
        );
        Ok(())
    }

    fn bindings(&self) -> Vec<&Binding> {
        let mut bindings = vec![
            &self.position,
            &self.previous_position,
            &self.color,
            &self.size,
        ];
        bindings.extend(self.sprite_sheet.as_ref().map(|(_, index)| index));
        bindings.extend(self.alpha_multiplier.as_ref());
        bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{ConstantBinding, StoredBinding};
    use crate::render::SpriteQuad;

    const POSITION: StoredBinding = StoredBinding::new(0, 3);
    const PREVIOUS: StoredBinding = StoredBinding::new(3, 3);
    const COLOR: StoredBinding = StoredBinding::new(6, 4);
    const SPRITE: StoredBinding = StoredBinding::new(10, 1);

    fn module() -> SpriteRenderModule {
        SpriteRenderModule::new(
            SpriteMaterial::new("spark"),
            POSITION,
            PREVIOUS,
            COLOR,
            ConstantBinding::scalar(0.25),
        )
        .unwrap()
    }

    fn emit(module: &SpriteRenderModule, record: &[f64], partial_tick: f32) -> SpriteQuad {
        let mut out: Vec<(SpriteMaterial, SpriteQuad)> = Vec::new();
        module.render(record, partial_tick, &mut out).unwrap();
        assert_eq!(out.len(), 1);
        out[0].1
    }

    #[test]
    fn test_interpolated_position() {
        let record = [2.0, 4.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.5, 0.25, 1.0, 0.0];

        let quad = emit(&module(), &record, 0.5);
        assert_eq!(quad.position, [1.0, 2.0, 0.0]);
        assert_eq!(quad.color, [1.0, 0.5, 0.25, 1.0]);
        assert_eq!(quad.size, 0.25);
        assert_eq!((quad.uv_min, quad.uv_max), ([0.0, 0.0], [1.0, 1.0]));

        assert_eq!(emit(&module(), &record, 0.0).position, [0.0, 0.0, 0.0]);
        assert_eq!(emit(&module(), &record, 1.0).position, [2.0, 4.0, 0.0]);
    }

    #[test]
    fn test_sprite_sheet_cells() {
        let module = module().with_sprite_sheet(2, SPRITE).unwrap();
        let mut record = [0.0; 11];

        record[10] = 3.7;
        let quad = emit(&module, &record, 0.0);
        assert_eq!((quad.uv_min, quad.uv_max), ([0.5, 0.5], [1.0, 1.0]));

        record[10] = 1.0;
        let quad = emit(&module, &record, 0.0);
        assert_eq!((quad.uv_min, quad.uv_max), ([0.5, 0.0], [1.0, 0.5]));

        record[10] = -2.0;
        assert_eq!(emit(&module, &record, 0.0).uv_min, [0.0, 0.0]);

        record[10] = 9.0;
        assert_eq!(emit(&module, &record, 0.0).uv_min, [0.5, 0.5]);
    }

    #[test]
    fn test_largest_sprite_sheet_renders() {
        let module = module().with_sprite_sheet(65_535, SPRITE).unwrap();
        let mut record = [0.0; 11];
        record[10] = 1.0e12;

        let quad = emit(&module, &record, 0.0);
        assert!(quad.uv_min[0] > 0.99 && quad.uv_min[1] > 0.99);
        assert!(quad.uv_max[0] <= 1.0 + 1e-6);
    }

    #[test]
    fn test_alpha_multiplier() {
        let module = module()
            .with_alpha_multiplier(ConstantBinding::scalar(0.5))
            .unwrap();
        let record = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.8, 0.0];

        assert!((emit(&module, &record, 0.0).color[3] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_undersized_bindings() {
        let narrow_color = SpriteRenderModule::new(
            SpriteMaterial::new("spark"),
            POSITION,
            PREVIOUS,
            StoredBinding::new(6, 3),
            ConstantBinding::scalar(1.0),
        );
        assert!(matches!(narrow_color, Err(ParticleError::Configuration(_))));

        assert!(module().with_sprite_sheet(0, SPRITE).is_err());
        assert!(matches!(
            module().with_sprite_sheet(70_000, SPRITE),
            Err(ParticleError::Configuration(_))
        ));
        assert!(
            module()
                .with_sprite_sheet(2, ConstantBinding::new(Vec::new()))
                .is_err()
        );
    }

    #[test]
    fn test_render_leaves_record_untouched() {
        let record = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0];
        let copy = record;
        emit(&module(), &record, 0.3);
        assert_eq!(record, copy);
    }
}

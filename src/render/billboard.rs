//! Camera-facing orientation for sprite quads

use glam::Vec3;

/// Orientation used to expand sprite quads so they face the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Billboard {
    /// Camera position in world space
    pub position: Vec3,
    /// Direction the camera is looking at
    pub direction: Vec3,
    /// Up vector
    pub up: Vec3,
}

impl Billboard {
    /// Viewer at the origin looking down -Z
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    /// Viewer at `position` looking at `target`
    pub fn look_at(position: Vec3, target: Vec3, up: Vec3) -> Self {
        let direction = (target - position).normalize_or(Vec3::NEG_Z);
        Self {
            position,
            direction,
            up,
        }
    }

    /// Get the right vector
    pub fn right(&self) -> Vec3 {
        self.direction.cross(self.up).normalize_or(Vec3::X)
    }

    /// Screen-space up vector, orthogonal to the view direction
    pub fn screen_up(&self) -> Vec3 {
        self.right().cross(self.direction).normalize_or(Vec3::Y)
    }
}

impl Default for Billboard {
    fn default() -> Self {
        Self::new()
    }
}

// renderer/material.rs

/// Unlit base colour plus the fixed directional light; no textures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Straight (non-premultiplied) RGBA in 0..=1.
    pub base_color: [f32; 4],
}

impl Material {
    pub fn new(base_color: [f32; 4]) -> Self {
        Self {
            base_color: base_color.map(|c| c.clamp(0.0, 1.0)),
        }
    }

    pub fn white() -> Self {
        Self::new([1.0; 4])
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::white()
    }
}

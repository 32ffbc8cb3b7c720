use crate::renderer::TargetId;
use crate::scene::Transform;
use glam::Mat4;

/// What a camera clears before drawing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClearFlags {
    /// Colour is filled with the background, depth reset.
    SolidColor,
    /// Only depth is reset; existing colour stays in the target.
    DepthOnly,
}

/// Orthographic camera component.
///
/// The camera looks down the -Z axis of its entity's transform. Disabled
/// cameras are skipped by the per-frame loop and render only on demand.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    /// Half of the vertical view extent, in world units.
    pub half_height: f32,
    pub near: f32,
    pub far: f32,
    pub clear_flags: ClearFlags,
    pub background: [f32; 4],
    pub enabled: bool,
    pub target: Option<TargetId>,
}

impl Camera {
    pub fn orthographic(half_height: f32) -> Self {
        Self {
            half_height,
            ..Self::default()
        }
    }

    /// Degenerate cameras cover no area and produce no fragments.
    pub fn is_degenerate(&self) -> bool {
        !(self.half_height > 0.0) || !(self.far > self.near)
    }

    pub fn proj(&self, aspect: f32) -> Mat4 {
        let h = self.half_height;
        let w = h * aspect;
        Mat4::orthographic_rh(-w, w, -h, h, self.near, self.far)
    }

    pub fn view(transform: &Transform) -> Mat4 {
        // cameras carry unit scale, so the inverse is a rigid transform
        Transform {
            scale: glam::Vec3::ONE,
            ..*transform
        }
        .matrix()
        .inverse()
    }

    pub fn view_proj(&self, transform: &Transform, aspect: f32) -> Mat4 {
        self.proj(aspect) * Self::view(transform)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            half_height: 5.0,
            near: 0.3,
            far: 1000.0,
            clear_flags: ClearFlags::SolidColor,
            background: [0.0, 0.0, 0.0, 1.0],
            enabled: true,
            target: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    #[test]
    fn view_proj_is_invertible() {
        let cam = Camera::orthographic(2.0);
        let t = Transform::looking_to(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, Vec3::Y);
        let vp = cam.view_proj(&t, 1.0);
        let id = vp * vp.inverse();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn half_height_maps_to_ndc_edge() {
        let cam = Camera {
            near: 0.0,
            far: 20.0,
            ..Camera::orthographic(2.0)
        };
        let t = Transform::looking_to(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, Vec3::Y);
        let clip = cam.view_proj(&t, 1.0) * Vec4::new(0.0, 2.0, 0.0, 1.0);
        assert!((clip.y / clip.w - 1.0).abs() < 1e-5);
        // wgpu depth range: halfway between near and far
        assert!((clip.z / clip.w - 0.5).abs() < 1e-5);
    }

    #[test]
    fn zero_height_is_degenerate() {
        assert!(Camera::orthographic(0.0).is_degenerate());
        assert!(!Camera::orthographic(1.0).is_degenerate());
    }
}

use glam::{Mat3, Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn from_trs(t: Vec3, r: Quat, s: Vec3) -> Self {
        Self {
            translation: t,
            rotation: r,
            scale: s,
        }
    }

    pub fn from_translation(t: Vec3) -> Self {
        Self {
            translation: t,
            ..Self::IDENTITY
        }
    }

    /// Composes `child` (expressed in this transform's space) into world space.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.translation + self.rotation * (self.scale * child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Unit-scale transform at `eye` whose -Z axis points along `forward`.
    ///
    /// Falls back to identity rotation when `forward` is zero or parallel to `up`.
    pub fn looking_to(eye: Vec3, forward: Vec3, up: Vec3) -> Self {
        let f = forward.normalize_or_zero();
        let right = f.cross(up).normalize_or_zero();
        if f == Vec3::ZERO || right == Vec3::ZERO {
            return Self::from_translation(eye);
        }
        let true_up = right.cross(f);
        let basis = Mat3::from_cols(right, true_up, -f);
        Self {
            translation: eye,
            rotation: Quat::from_mat3(&basis).normalize(),
            scale: Vec3::ONE,
        }
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }
}

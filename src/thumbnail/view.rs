// thumbnail/view.rs
use super::bounds::BoundsVolume;
use crate::scene::Transform;
use glam::{Quat, Vec3};

/// Margin around the framed object.
pub const PADDING: f32 = 1.2;

/// Offset from the target to the camera: high, to the left and in front.
/// Not normalised: camera distance scales with the object extent.
pub const VIEW_DIRECTION: Vec3 = Vec3::new(-1.0, 1.0, -1.0);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewPlan {
    pub ortho_half_height: f32,
    pub camera_position: Vec3,
    pub look_at: Vec3,
}

impl ViewPlan {
    /// Looks along `-VIEW_DIRECTION` with world +Y up. Independent of the
    /// camera position, so a zero-extent plan still has an orientation.
    pub fn camera_rotation(&self) -> Quat {
        Transform::looking_to(Vec3::ZERO, -VIEW_DIRECTION, Vec3::Y).rotation
    }

    pub fn camera_transform(&self) -> Transform {
        Transform {
            rotation: self.camera_rotation(),
            ..Transform::from_translation(self.camera_position)
        }
    }

    pub fn distance(&self) -> f32 {
        self.camera_position.distance(self.look_at)
    }
}

pub fn plan_view(bounds: &BoundsVolume) -> ViewPlan {
    let max_extent = bounds.max_extent();
    ViewPlan {
        ortho_half_height: max_extent * PADDING / 2.0,
        camera_position: bounds.center + VIEW_DIRECTION * max_extent * PADDING,
        look_at: bounds.center,
    }
}

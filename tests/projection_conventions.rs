//! Orthographic capture camera conventions.
//!
//! - Right-handed view space (camera looks down -Z).
//! - Clip/NDC depth range is [0, 1] (wgpu/D3D). Near -> 0, Far -> 1.
//! - Image rows start at the top (row 0 = +Y in NDC).
//!
use glam::{Vec2, Vec3};
use thumbnail_forge::scene::{Camera, Transform};
use thumbnail_forge::thumbnail::{plan_view, BoundsVolume};

fn ndc_xy_to_uv(ndc_xy: Vec2) -> Vec2 {
    Vec2::new(ndc_xy.x * 0.5 + 0.5, 0.5 - ndc_xy.y * 0.5)
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-5
}

#[test]
fn ortho_depth_spans_near_to_far() {
    let camera = Camera {
        near: 0.0,
        far: 10.0,
        ..Camera::orthographic(1.0)
    };
    let transform = Transform::looking_to(Vec3::ZERO, -Vec3::Z, Vec3::Y);
    let vp = camera.view_proj(&transform, 1.0);

    let near = vp.project_point3(Vec3::new(0.0, 0.0, 0.0));
    let mid = vp.project_point3(Vec3::new(0.0, 0.0, -5.0));
    let far = vp.project_point3(Vec3::new(0.0, 0.0, -10.0));
    assert!(approx(near.z, 0.0));
    assert!(approx(mid.z, 0.5));
    assert!(approx(far.z, 1.0));
}

#[test]
fn world_up_maps_to_the_top_row() {
    let plan = plan_view(&BoundsVolume::new(Vec3::ZERO, Vec3::splat(2.0)));
    let camera = Camera {
        near: 0.0,
        far: 2.0 * plan.distance(),
        ..Camera::orthographic(plan.ortho_half_height)
    };
    let vp = camera.view_proj(&plan.camera_transform(), 1.0);

    let top = ndc_xy_to_uv(vp.project_point3(Vec3::new(0.0, 1.0, 0.0)).truncate());
    let bottom = ndc_xy_to_uv(vp.project_point3(Vec3::new(0.0, -1.0, 0.0)).truncate());
    assert!(top.y < 0.5 && bottom.y > 0.5);
    assert!(approx(top.x, 0.5) && approx(bottom.x, 0.5));
}

#[test]
fn framed_object_centre_projects_to_image_centre() {
    let center = Vec3::new(3.0, -1.0, 7.5);
    let plan = plan_view(&BoundsVolume::new(center, Vec3::new(1.0, 4.0, 2.0)));
    let camera = Camera {
        near: 0.0,
        far: 2.0 * plan.distance(),
        ..Camera::orthographic(plan.ortho_half_height)
    };
    let ndc = camera
        .view_proj(&plan.camera_transform(), 1.0)
        .project_point3(center);
    assert!(approx(ndc.x, 0.0) && approx(ndc.y, 0.0));
    assert!(approx(ndc.z, 0.5));
}

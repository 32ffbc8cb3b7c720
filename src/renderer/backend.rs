// renderer/backend.rs
//
// The seam between the renderer front-end and the code that actually
// produces pixels.

use super::target::{PixelImage, TargetDescriptor, TargetId};
use crate::asset::Mesh;
use crate::scene::ClearFlags;
use glam::{Mat3, Mat4, Vec3};

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to acquire render resources: {0}")]
    Acquisition(String),

    #[error("{0} does not exist")]
    UnknownTarget(TargetId),

    #[error("no render target is active")]
    NoActiveTarget,

    #[error("camera {0:?} has no render target")]
    NoCameraTarget(hecs::Entity),

    #[error("entity {0:?} is not a camera")]
    NotACamera(hecs::Entity),

    #[error("Readback error: {0}")]
    Readback(String),

    #[error("Device error: {0}")]
    Device(String),
}

/// Direction towards the single fixed light, world space.
pub const LIGHT_DIRECTION: Vec3 = Vec3::new(-0.4, 1.0, -0.6);

/// Share of the base colour that is lit regardless of orientation.
pub const AMBIENT: f32 = 0.35;

/// Lambert term plus ambient. Alpha passes through untouched.
pub fn shade(base_color: [f32; 4], normal: Vec3) -> [f32; 4] {
    let light = LIGHT_DIRECTION.normalize();
    let diffuse = normal.normalize_or_zero().dot(light).max(0.0);
    let k = AMBIENT + (1.0 - AMBIENT) * diffuse;
    [
        base_color[0] * k,
        base_color[1] * k,
        base_color[2] * k,
        base_color[3],
    ]
}

/// One mesh instance to draw, already resolved to world space.
#[derive(Clone, Copy)]
pub struct DrawItem<'a> {
    pub mesh: &'a Mesh,
    pub model: Mat4,
    pub normal_matrix: Mat3,
    pub base_color: [f32; 4],
}

impl<'a> DrawItem<'a> {
    pub fn new(mesh: &'a Mesh, model: Mat4, base_color: [f32; 4]) -> Self {
        Self {
            mesh,
            model,
            normal_matrix: Mat3::from_mat4(model).inverse().transpose(),
            base_color,
        }
    }
}

/// Everything a backend needs for one frame into one target.
pub struct FramePass<'a> {
    pub view_proj: Mat4,
    pub clear_flags: ClearFlags,
    pub background: [f32; 4],
    /// When false only the clear runs; used for cameras that cover no area.
    pub draw_geometry: bool,
    pub draws: Vec<DrawItem<'a>>,
}

pub trait RenderBackend {
    fn name(&self) -> &'static str;

    fn create_target(&mut self, desc: TargetDescriptor) -> Result<TargetId, RenderError>;

    /// Returns whether the target existed.
    fn destroy_target(&mut self, target: TargetId) -> bool;

    fn has_target(&self, target: TargetId) -> bool;

    fn target_descriptor(&self, target: TargetId) -> Option<TargetDescriptor>;

    fn draw(&mut self, target: TargetId, pass: &FramePass<'_>) -> Result<(), RenderError>;

    fn read_pixels(&mut self, target: TargetId) -> Result<PixelImage, RenderError>;

    /// Drops the colour contents; the next frame starts fully transparent.
    fn discard_contents(&mut self, target: TargetId) -> Result<(), RenderError>;
}

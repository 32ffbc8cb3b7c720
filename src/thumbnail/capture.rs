// thumbnail/capture.rs
//
// One hidden orthographic camera plus one offscreen target, reused for
// every object of a batch.

use super::error::ThumbnailError;
use super::view::ViewPlan;
use crate::renderer::{PixelImage, RenderError, Renderer, TargetDescriptor, TargetId};
use crate::scene::components::{TransformComponent, WorldTransform};
use crate::scene::{Camera, ClearFlags, EntityBuilder, Scene};
use hecs::Entity;

const MIN_FAR_PLANE: f32 = 1e-3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureSettings {
    pub resolution: u32,
    pub depth_bits: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            resolution: 256,
            depth_bits: 24,
        }
    }
}

impl CaptureSettings {
    pub fn descriptor(&self) -> TargetDescriptor {
        TargetDescriptor::square(self.resolution, self.depth_bits)
    }
}

/// Owns the capture camera entity and its render target. Must be handed
/// back through [`CaptureDevice::release`].
#[derive(Debug)]
pub struct CaptureDevice {
    camera: Entity,
    target: TargetId,
    settings: CaptureSettings,
}

impl CaptureDevice {
    /// Allocates the target first so a failure leaves nothing in the scene.
    pub fn acquire(
        scene: &mut Scene,
        renderer: &mut Renderer,
        settings: &CaptureSettings,
    ) -> Result<Self, ThumbnailError> {
        let target = renderer
            .create_target(settings.descriptor())
            .map_err(|e| ThumbnailError::ResourceAcquisition(e.to_string()))?;

        let camera = Camera {
            half_height: 0.0,
            near: 0.0,
            far: MIN_FAR_PLANE,
            clear_flags: ClearFlags::DepthOnly,
            background: [0.0, 0.0, 0.0, 0.0],
            enabled: false,
            target: Some(target),
        };
        let camera = EntityBuilder::new(&mut scene.world)
            .with_name("ThumbnailCamera")
            .with_transform(Default::default())
            .with_camera(camera)
            .spawn();

        log::debug!(
            "Acquired capture device: camera {:?}, {} ({}px, {}-bit depth)",
            camera,
            target,
            settings.resolution,
            settings.depth_bits
        );
        Ok(Self {
            camera,
            target,
            settings: *settings,
        })
    }

    pub fn camera(&self) -> Entity {
        self.camera
    }

    pub fn target(&self) -> TargetId {
        self.target
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Applies size, placement and orientation from `plan`.
    pub fn configure(&self, scene: &mut Scene, plan: &ViewPlan) -> Result<(), RenderError> {
        let transform = plan.camera_transform();
        {
            let mut camera = scene
                .world
                .get::<&mut Camera>(self.camera)
                .map_err(|_| RenderError::NotACamera(self.camera))?;
            camera.half_height = plan.ortho_half_height;
            camera.near = 0.0;
            camera.far = (2.0 * plan.distance()).max(MIN_FAR_PLANE);
        }
        scene
            .world
            .insert(
                self.camera,
                (TransformComponent(transform), WorldTransform(transform)),
            )
            .map_err(|_| RenderError::NotACamera(self.camera))?;
        log::trace!(
            "Capture camera at {:?}, half height {}",
            plan.camera_position,
            plan.ortho_half_height
        );
        Ok(())
    }

    /// Renders one frame and reads it back. The previously active target is
    /// restored and the colour contents discarded on every path.
    pub fn render_frame(
        &self,
        scene: &Scene,
        renderer: &mut Renderer,
    ) -> Result<PixelImage, RenderError> {
        let frame = renderer
            .render_camera(scene, self.camera)
            .and_then(|()| renderer.bind_active(self.target).read_active_pixels());
        let discarded = renderer.discard_contents(self.target);
        let image = frame?;
        discarded?;
        Ok(image)
    }

    pub fn release(self, scene: &mut Scene, renderer: &mut Renderer) {
        let target_existed = renderer.destroy_target(self.target);
        let despawned = scene.destroy(self.camera);
        log::debug!(
            "Released capture device (target destroyed: {}, entities despawned: {})",
            target_existed,
            despawned
        );
    }
}

// renderer/renderer.rs
use crate::renderer::backend::{DrawItem, FramePass, RenderBackend, RenderError};
use crate::renderer::gpu::GpuBackend;
use crate::renderer::software::SoftwareBackend;
use crate::renderer::target::{PixelImage, TargetDescriptor, TargetId};
use crate::renderer::Material;
use crate::scene::components::{MaterialComponent, MeshComponent, Visible, WorldTransform};
use crate::scene::{Camera, Scene};
use crate::settings::BackendSetting;
use hecs::Entity;
use std::ops::{Deref, DerefMut};

/// Front-end over a backend plus the process-wide active render target.
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    active: Option<TargetId>,
}

impl Renderer {
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        log::info!("Renderer using {} backend", backend.name());
        Self {
            backend,
            active: None,
        }
    }

    pub fn software() -> Self {
        Self::new(Box::new(SoftwareBackend::new()))
    }

    /// `Auto` prefers the GPU and falls back to the software rasteriser.
    pub fn from_setting(setting: BackendSetting) -> Result<Self, RenderError> {
        match setting {
            BackendSetting::Software => Ok(Self::software()),
            BackendSetting::Gpu => Ok(Self::new(Box::new(GpuBackend::new()?))),
            BackendSetting::Auto => match GpuBackend::new() {
                Ok(gpu) => Ok(Self::new(Box::new(gpu))),
                Err(err) => {
                    log::warn!("GPU backend unavailable ({}). Using software renderer.", err);
                    Ok(Self::software())
                }
            },
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn create_target(&mut self, desc: TargetDescriptor) -> Result<TargetId, RenderError> {
        self.backend.create_target(desc)
    }

    /// Destroying the active target also unbinds it.
    pub fn destroy_target(&mut self, target: TargetId) -> bool {
        if self.active == Some(target) {
            self.active = None;
        }
        self.backend.destroy_target(target)
    }

    pub fn has_target(&self, target: TargetId) -> bool {
        self.backend.has_target(target)
    }

    pub fn active_target(&self) -> Option<TargetId> {
        self.active
    }

    pub fn set_active_target(&mut self, target: Option<TargetId>) {
        self.active = target;
    }

    /// Binds `target` as active until the returned guard is dropped.
    pub fn bind_active(&mut self, target: TargetId) -> ActiveTarget<'_> {
        let previous = self.active.replace(target);
        log::trace!("Active target {} (previous {:?})", target, previous);
        ActiveTarget {
            renderer: self,
            previous,
        }
    }

    pub fn read_active_pixels(&mut self) -> Result<PixelImage, RenderError> {
        let target = self.active.ok_or(RenderError::NoActiveTarget)?;
        self.backend.read_pixels(target)
    }

    pub fn discard_contents(&mut self, target: TargetId) -> Result<(), RenderError> {
        self.backend.discard_contents(target)
    }

    /// Draws every visible mesh in `scene` through `camera_entity` into
    /// the camera's own target.
    pub fn render_camera(&mut self, scene: &Scene, camera_entity: Entity) -> Result<(), RenderError> {
        let camera = *scene
            .world
            .get::<&Camera>(camera_entity)
            .map_err(|_| RenderError::NotACamera(camera_entity))?;
        let target = camera
            .target
            .ok_or(RenderError::NoCameraTarget(camera_entity))?;
        let desc = self
            .backend
            .target_descriptor(target)
            .ok_or(RenderError::UnknownTarget(target))?;
        let transform = scene
            .world_transform(camera_entity)
            .ok_or(RenderError::NotACamera(camera_entity))?;

        let mut query = scene.world.query::<(
            &MeshComponent,
            &WorldTransform,
            Option<&MaterialComponent>,
            Option<&Visible>,
        )>();
        let draws = query
            .iter()
            .filter(|(_, (_, _, _, visible))| visible.map_or(true, |v| v.0))
            .filter_map(|(_, (mesh, world, material, _))| {
                let mesh = scene.assets.meshes.get(mesh.0)?;
                let color = material.map_or(Material::white(), |m| m.0).base_color;
                Some(DrawItem::new(mesh, world.0.matrix(), color))
            })
            .collect::<Vec<_>>();

        let pass = FramePass {
            view_proj: camera.view_proj(&transform, desc.aspect()),
            clear_flags: camera.clear_flags,
            background: camera.background,
            draw_geometry: !camera.is_degenerate(),
            draws,
        };
        log::trace!(
            "Camera {:?} -> {}: {} draws",
            camera_entity,
            target,
            pass.draws.len()
        );
        self.backend.draw(target, &pass)
    }

    /// Normal per-frame loop; disabled cameras are skipped.
    pub fn render_enabled_cameras(&mut self, scene: &Scene) -> Result<usize, RenderError> {
        let cameras = scene
            .world
            .query::<&Camera>()
            .iter()
            .filter(|(_, cam)| cam.enabled && cam.target.is_some())
            .map(|(e, _)| e)
            .collect::<Vec<_>>();
        for &camera in &cameras {
            self.render_camera(scene, camera)?;
        }
        Ok(cameras.len())
    }
}

/// Restores the previously active target when dropped.
pub struct ActiveTarget<'r> {
    renderer: &'r mut Renderer,
    previous: Option<TargetId>,
}

impl Deref for ActiveTarget<'_> {
    type Target = Renderer;

    fn deref(&self) -> &Renderer {
        &*self.renderer
    }
}

impl DerefMut for ActiveTarget<'_> {
    fn deref_mut(&mut self) -> &mut Renderer {
        &mut *self.renderer
    }
}

impl Drop for ActiveTarget<'_> {
    fn drop(&mut self) {
        self.renderer.active = self.previous;
    }
}

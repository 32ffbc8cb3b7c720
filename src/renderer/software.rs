// renderer/software.rs
//
// CPU rasteriser. Mirrors the GPU pipeline conventions: right-handed view
// space, wgpu clip depth in [0, 1], LESS depth test, row 0 at the top.

use super::backend::{shade, DrawItem, FramePass, RenderBackend, RenderError};
use super::target::{PixelImage, TargetDescriptor, TargetId};
use crate::scene::ClearFlags;
use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

struct SoftTarget {
    desc: TargetDescriptor,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl SoftTarget {
    fn new(desc: TargetDescriptor) -> Self {
        let pixels = desc.width as usize * desc.height as usize;
        Self {
            desc,
            color: vec![0; pixels * 4],
            depth: vec![1.0; pixels],
        }
    }
}

/// Screen-space vertex after projection.
#[derive(Clone, Copy, Debug)]
struct Projected {
    xy: Vec2,
    depth: f32,
    color: Vec4,
}

pub struct SoftwareBackend {
    targets: HashMap<TargetId, SoftTarget>,
    next_id: u64,
    max_targets: Option<usize>,
}

impl SoftwareBackend {
    pub fn new() -> Self {
        Self {
            targets: HashMap::new(),
            next_id: 1,
            max_targets: None,
        }
    }

    /// Refuses to allocate more than `limit` live targets.
    pub fn with_max_targets(limit: usize) -> Self {
        Self {
            max_targets: Some(limit),
            ..Self::new()
        }
    }

    pub fn live_targets(&self) -> usize {
        self.targets.len()
    }

    fn project(item: &DrawItem<'_>, pass: &FramePass<'_>, pos: [f32; 3], normal: [f32; 3], size: Vec2) -> Option<Projected> {
        let world = item.model.transform_point3(Vec3::from(pos));
        let clip = pass.view_proj * world.extend(1.0);
        if clip.w <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let n = item.normal_matrix * Vec3::from(normal);
        Some(Projected {
            xy: Vec2::new((ndc.x * 0.5 + 0.5) * size.x, (0.5 - ndc.y * 0.5) * size.y),
            depth: ndc.z,
            color: Vec4::from_array(shade(item.base_color, n)),
        })
    }

    fn raster_triangle(target: &mut SoftTarget, tri: [Projected; 3]) {
        let [a, b, c] = tri;
        let area = edge(a.xy, b.xy, c.xy);
        if area.abs() <= f32::EPSILON {
            return;
        }

        let width = target.desc.width as i64;
        let height = target.desc.height as i64;
        let min = a.xy.min(b.xy).min(c.xy).floor();
        let max = a.xy.max(b.xy).max(c.xy).ceil();
        let x0 = (min.x as i64).clamp(0, width);
        let x1 = (max.x as i64).clamp(0, width);
        let y0 = (min.y as i64).clamp(0, height);
        let y1 = (max.y as i64).clamp(0, height);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let wa = edge(b.xy, c.xy, p) / area;
                let wb = edge(c.xy, a.xy, p) / area;
                let wc = edge(a.xy, b.xy, p) / area;
                if wa < 0.0 || wb < 0.0 || wc < 0.0 {
                    continue;
                }

                let depth = wa * a.depth + wb * b.depth + wc * c.depth;
                if !(0.0..=1.0).contains(&depth) {
                    continue;
                }
                let i = (y * width + x) as usize;
                if depth >= target.depth[i] {
                    continue;
                }
                target.depth[i] = depth;

                let color = a.color * wa + b.color * wb + c.color * wc;
                let rgba = color.to_array().map(to_unorm8);
                target.color[i * 4..i * 4 + 4].copy_from_slice(&rgba);
            }
        }
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

fn to_unorm8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl RenderBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn create_target(&mut self, desc: TargetDescriptor) -> Result<TargetId, RenderError> {
        desc.validate().map_err(RenderError::Acquisition)?;
        if let Some(limit) = self.max_targets {
            if self.targets.len() >= limit {
                return Err(RenderError::Acquisition(format!(
                    "software backend is limited to {limit} targets"
                )));
            }
        }
        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(id, SoftTarget::new(desc));
        log::debug!("Created {} ({}x{})", id, desc.width, desc.height);
        Ok(id)
    }

    fn destroy_target(&mut self, target: TargetId) -> bool {
        self.targets.remove(&target).is_some()
    }

    fn has_target(&self, target: TargetId) -> bool {
        self.targets.contains_key(&target)
    }

    fn target_descriptor(&self, target: TargetId) -> Option<TargetDescriptor> {
        self.targets.get(&target).map(|t| t.desc)
    }

    fn draw(&mut self, target: TargetId, pass: &FramePass<'_>) -> Result<(), RenderError> {
        let tgt = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::UnknownTarget(target))?;

        tgt.depth.fill(1.0);
        if pass.clear_flags == ClearFlags::SolidColor {
            let bg = pass.background.map(to_unorm8);
            for px in tgt.color.chunks_exact_mut(4) {
                px.copy_from_slice(&bg);
            }
        }
        if !pass.draw_geometry {
            return Ok(());
        }

        let size = Vec2::new(tgt.desc.width as f32, tgt.desc.height as f32);
        let mut triangles = 0usize;
        for item in &pass.draws {
            for [v0, v1, v2] in item.mesh.triangles() {
                let projected = [v0, v1, v2]
                    .map(|v| Self::project(item, pass, v.pos, v.normal, size));
                if let [Some(a), Some(b), Some(c)] = projected {
                    Self::raster_triangle(tgt, [a, b, c]);
                    triangles += 1;
                }
            }
        }
        log::trace!("Software pass into {}: {} triangles", target, triangles);
        Ok(())
    }

    fn read_pixels(&mut self, target: TargetId) -> Result<PixelImage, RenderError> {
        let tgt = self
            .targets
            .get(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        PixelImage::new(tgt.desc.width, tgt.desc.height, tgt.color.clone())
            .map_err(RenderError::Readback)
    }

    fn discard_contents(&mut self, target: TargetId) -> Result<(), RenderError> {
        let tgt = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        tgt.color.fill(0);
        tgt.depth.fill(1.0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Mesh;
    use crate::renderer::primitives::cube_mesh;
    use crate::scene::{Camera, Transform};
    use glam::Mat4;

    fn front_view(half_height: f32) -> Mat4 {
        let cam = Camera {
            near: 0.0,
            far: 20.0,
            ..Camera::orthographic(half_height)
        };
        let t = Transform::looking_to(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, Vec3::Y);
        cam.view_proj(&t, 1.0)
    }

    fn pass<'a>(draws: Vec<DrawItem<'a>>, clear_flags: ClearFlags) -> FramePass<'a> {
        FramePass {
            view_proj: front_view(1.0),
            clear_flags,
            background: [0.0, 0.0, 1.0, 1.0],
            draw_geometry: true,
            draws,
        }
    }

    #[test]
    fn cube_covers_centre_and_leaves_corners_transparent() {
        let (v, i) = cube_mesh(1.0);
        let mesh = Mesh::new(v, i).unwrap();
        let mut backend = SoftwareBackend::new();
        let target = backend.create_target(TargetDescriptor::square(32, 24)).unwrap();

        let item = DrawItem::new(&mesh, Mat4::IDENTITY, [1.0, 0.0, 0.0, 1.0]);
        backend.draw(target, &pass(vec![item], ClearFlags::DepthOnly)).unwrap();
        let img = backend.read_pixels(target).unwrap();

        assert_eq!(img.pixel(16, 16).unwrap()[3], 255);
        assert!(img.pixel(16, 16).unwrap()[0] > 0);
        assert_eq!(img.pixel(0, 0), Some([0, 0, 0, 0]));
        // cube spans half of the 2-unit view: 16x16 pixels
        assert_eq!(img.coverage(), 16 * 16);
    }

    #[test]
    fn nearer_geometry_wins_depth_test() {
        let (v, i) = cube_mesh(1.0);
        let mesh = Mesh::new(v, i).unwrap();
        let mut backend = SoftwareBackend::new();
        let target = backend.create_target(TargetDescriptor::square(16, 24)).unwrap();

        let far = DrawItem::new(&mesh, Mat4::from_translation(Vec3::new(0.0, 0.0, -2.0)), [0.0, 1.0, 0.0, 1.0]);
        let near = DrawItem::new(&mesh, Mat4::IDENTITY, [1.0, 0.0, 0.0, 1.0]);
        backend.draw(target, &pass(vec![near, far], ClearFlags::DepthOnly)).unwrap();

        let px = backend.read_pixels(target).unwrap().pixel(8, 8).unwrap();
        assert!(px[0] > 0);
        assert_eq!(px[1], 0);
    }

    #[test]
    fn depth_only_clear_keeps_colour_until_discarded() {
        let (v, i) = cube_mesh(1.0);
        let mesh = Mesh::new(v, i).unwrap();
        let mut backend = SoftwareBackend::new();
        let target = backend.create_target(TargetDescriptor::square(16, 24)).unwrap();

        let item = DrawItem::new(&mesh, Mat4::IDENTITY, [1.0; 4]);
        backend.draw(target, &pass(vec![item], ClearFlags::DepthOnly)).unwrap();
        backend.draw(target, &pass(Vec::new(), ClearFlags::DepthOnly)).unwrap();
        assert!(backend.read_pixels(target).unwrap().coverage() > 0);

        backend.discard_contents(target).unwrap();
        assert_eq!(backend.read_pixels(target).unwrap().coverage(), 0);
    }

    #[test]
    fn solid_clear_fills_background() {
        let mut backend = SoftwareBackend::new();
        let target = backend.create_target(TargetDescriptor::square(4, 24)).unwrap();
        backend.draw(target, &pass(Vec::new(), ClearFlags::SolidColor)).unwrap();
        assert_eq!(backend.read_pixels(target).unwrap().pixel(3, 3), Some([0, 0, 255, 255]));
    }

    #[test]
    fn target_limit_is_enforced() {
        let mut backend = SoftwareBackend::with_max_targets(1);
        let first = backend.create_target(TargetDescriptor::square(4, 24)).unwrap();
        assert_eq!(backend.live_targets(), 1);
        assert!(matches!(
            backend.create_target(TargetDescriptor::square(4, 24)),
            Err(RenderError::Acquisition(_))
        ));
        assert!(backend.destroy_target(first));
        assert!(!backend.has_target(first));
        assert_eq!(backend.live_targets(), 0);
        assert!(backend.create_target(TargetDescriptor::square(4, 24)).is_ok());
    }

    #[test]
    fn unknown_target_is_an_error() {
        let mut backend = SoftwareBackend::new();
        assert!(matches!(
            backend.read_pixels(TargetId(99)),
            Err(RenderError::UnknownTarget(_))
        ));
    }
}

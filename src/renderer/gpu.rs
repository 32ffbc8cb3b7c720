// renderer/gpu.rs
//
// Headless wgpu backend. Each target owns an Rgba8Unorm colour texture and a
// depth texture; geometry is pre-transformed to world space on the CPU and
// uploaded once per frame.

use super::backend::{FramePass, RenderBackend, RenderError, AMBIENT, LIGHT_DIRECTION};
use super::depth::{depth_format, Depth};
use super::readback;
use super::target::{PixelImage, TargetDescriptor, TargetId};
use crate::scene::ClearFlags;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use std::collections::HashMap;
use std::{mem, num::NonZeroU64};
use wgpu::util::DeviceExt;

const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct GpuVertex {
    pos: [f32; 3],
    normal: [f32; 3],
    color: [f32; 4],
}

impl GpuVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x4
    ];

    fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    light_dir: [f32; 4],
    params: [f32; 4],
}

struct GpuTarget {
    desc: TargetDescriptor,
    color: wgpu::Texture,
    color_view: wgpu::TextureView,
    depth: Depth,
    /// Set after a discard; the next pass clears colour to transparent.
    needs_clear: bool,
}

pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    globals_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    targets: HashMap<TargetId, GpuTarget>,
    next_id: u64,
}

impl GpuBackend {
    /// Blocks on adapter and device creation.
    pub fn new() -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async())
    }

    pub async fn new_async() -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| RenderError::Acquisition(format!("no GPU adapter: {e}")))?;

        log::info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("ThumbnailDevice"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| RenderError::Acquisition(format!("device request failed: {e}")))?;

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ThumbnailGlobals"),
            size: mem::size_of::<Globals>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ThumbnailBindLayout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(mem::size_of::<Globals>() as u64),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ThumbnailBindGroup"),
            layout: &bind_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ThumbnailShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("thumbnail.wgsl").into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ThumbnailPipelineLayout"),
            bind_group_layouts: &[&bind_layout],
            push_constant_ranges: &[],
        });

        let pipelines = [16, 24, 32]
            .into_iter()
            .map(|bits| {
                let format = depth_format(bits);
                (format, build_pipeline(&device, &shader, &pipeline_layout, format))
            })
            .collect();

        Ok(Self {
            device,
            queue,
            pipelines,
            globals_buf,
            bind_group,
            targets: HashMap::new(),
            next_id: 1,
        })
    }
}

fn build_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    depth_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("ThumbnailPipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[GpuVertex::layout()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            front_face: wgpu::FrontFace::Ccw,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
            strip_index_format: None,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: depth_format,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn wgpu_color(c: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: c[0] as f64,
        g: c[1] as f64,
        b: c[2] as f64,
        a: c[3] as f64,
    }
}

/// Expands indexed meshes into a world-space triangle list.
fn world_vertices(pass: &FramePass<'_>) -> Vec<GpuVertex> {
    let mut out = Vec::new();
    for item in &pass.draws {
        for tri in item.mesh.triangles() {
            for v in tri {
                out.push(GpuVertex {
                    pos: item.model.transform_point3(Vec3::from(v.pos)).to_array(),
                    normal: (item.normal_matrix * Vec3::from(v.normal))
                        .normalize_or_zero()
                        .to_array(),
                    color: item.base_color,
                });
            }
        }
    }
    out
}

impl RenderBackend for GpuBackend {
    fn name(&self) -> &'static str {
        "gpu"
    }

    fn create_target(&mut self, desc: TargetDescriptor) -> Result<TargetId, RenderError> {
        desc.validate().map_err(RenderError::Acquisition)?;

        let color = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ThumbnailColor"),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let color_view = color.create_view(&wgpu::TextureViewDescriptor::default());
        let depth = Depth::new(&self.device, desc.width, desc.height, desc.depth_bits);

        let id = TargetId(self.next_id);
        self.next_id += 1;
        self.targets.insert(
            id,
            GpuTarget {
                desc,
                color,
                color_view,
                depth,
                needs_clear: true,
            },
        );
        log::debug!("Created GPU {} ({}x{})", id, desc.width, desc.height);
        Ok(id)
    }

    fn destroy_target(&mut self, target: TargetId) -> bool {
        match self.targets.remove(&target) {
            Some(t) => {
                t.color.destroy();
                true
            }
            None => false,
        }
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
        let pipeline = self.pipelines.get(&tgt.depth.format).ok_or_else(|| {
            RenderError::Device(format!("no pipeline for {:?}", tgt.depth.format))
        })?;

        let globals = Globals {
            view_proj: pass.view_proj.to_cols_array_2d(),
            light_dir: LIGHT_DIRECTION.extend(0.0).to_array(),
            params: [AMBIENT, 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        let vertices = if pass.draw_geometry {
            world_vertices(pass)
        } else {
            Vec::new()
        };
        let vertex_buf = (!vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("ThumbnailVertices"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        let color_load = match pass.clear_flags {
            ClearFlags::SolidColor => wgpu::LoadOp::Clear(wgpu_color(pass.background)),
            ClearFlags::DepthOnly if tgt.needs_clear => wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
            ClearFlags::DepthOnly => wgpu::LoadOp::Load,
        };
        tgt.needs_clear = false;

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ThumbnailEncoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ThumbnailPass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &tgt.color_view,
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &tgt.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if let Some(buf) = &vertex_buf {
                rpass.set_pipeline(pipeline);
                rpass.set_bind_group(0, &self.bind_group, &[]);
                rpass.set_vertex_buffer(0, buf.slice(..));
                rpass.draw(0..vertices.len() as u32, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        log::trace!("GPU pass into {}: {} vertices", target, vertices.len());
        Ok(())
    }

    fn read_pixels(&mut self, target: TargetId) -> Result<PixelImage, RenderError> {
        let tgt = self
            .targets
            .get(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        let bytes = readback::read_texture_tight(
            &self.device,
            &self.queue,
            &tgt.color,
            tgt.desc.width,
            tgt.desc.height,
        )?;
        PixelImage::new(tgt.desc.width, tgt.desc.height, bytes).map_err(RenderError::Readback)
    }

    fn discard_contents(&mut self, target: TargetId) -> Result<(), RenderError> {
        let tgt = self
            .targets
            .get_mut(&target)
            .ok_or(RenderError::UnknownTarget(target))?;
        tgt.needs_clear = true;
        Ok(())
    }
}

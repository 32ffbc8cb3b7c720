pub mod backend;
pub mod depth;
pub mod gpu;
pub mod material;
pub mod primitives;
pub mod readback;
pub mod renderer;
pub mod software;
pub mod target;
pub mod vertex;

pub use backend::{DrawItem, FramePass, RenderBackend, RenderError, AMBIENT, LIGHT_DIRECTION};
pub use depth::Depth;
pub use gpu::GpuBackend;
pub use material::Material;
pub use primitives::{cube_mesh, plane_mesh, sphere_mesh};
pub use renderer::{ActiveTarget, Renderer};
pub use software::SoftwareBackend;
pub use target::{PixelImage, TargetDescriptor, TargetId};
pub use vertex::Vertex;

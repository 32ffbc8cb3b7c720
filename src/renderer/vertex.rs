use bytemuck::{Pod, Zeroable};

/// Mesh vertex in object space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
}

#[inline]
pub fn v(pos: [f32; 3], normal: [f32; 3]) -> Vertex {
    Vertex { pos, normal }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<Vertex>(), 6 * std::mem::size_of::<f32>());
    }
}

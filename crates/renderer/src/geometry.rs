use crate::graphics::Graphics;
use crate::types::VertexLayout;

/// Two triangles spanning clip space from (-1, -1) to (1, 1).
pub const QUAD_VERTICES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

pub const QUAD_VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

/// Position attribute: slot 0, two floats, tightly packed from the start.
pub const POSITION_LAYOUT: VertexLayout = VertexLayout {
    location: 0,
    components: 2,
    stride: 0,
    offset: 0,
};

/// Uploaded quad plus the vertex array binding it to the position attribute.
pub(crate) struct QuadGeometry<G: Graphics> {
    pub buffer: G::Buffer,
    pub vertex_array: G::VertexArray,
}

/// Uploads the quad and describes it to the position attribute.
pub(crate) fn upload_quad<G: Graphics>(graphics: &mut G) -> QuadGeometry<G> {
    let buffer = graphics.create_buffer(bytemuck::cast_slice(&QUAD_VERTICES));
    let vertex_array = graphics.create_vertex_array(&buffer, POSITION_LAYOUT);
    tracing::debug!(vertices = QUAD_VERTEX_COUNT, "uploaded full-screen quad");
    QuadGeometry {
        buffer,
        vertex_array,
    }
}

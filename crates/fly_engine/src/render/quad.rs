//! Full-screen quad used by composite passes

use crate::render::api::{BufferId, BufferKind, DeviceRef, Primitive, VertexArrayId};
use crate::render::shader::ShaderProgram;
use crate::render::RenderResult;

/// Two counter-clockwise triangles covering normalized device space
///
/// Composite passes run with the scene's back-face culling still enabled, so
/// both triangles must be front-facing.
pub const QUAD_VERTICES: [[f32; 3]; 6] = [
    [-1.0, -1.0, 0.0],
    [1.0, -1.0, 0.0],
    [-1.0, 1.0, 0.0],
    [1.0, -1.0, 0.0],
    [1.0, 1.0, 0.0],
    [-1.0, 1.0, 0.0],
];

/// Name of the position attribute in composite vertex shaders
pub const POSITION_ATTRIBUTE: &str = "position";

/// Whether every triangle of a triangle list winds counter-clockwise in XY
pub fn is_front_facing(vertices: &[[f32; 3]]) -> bool {
    vertices.chunks_exact(3).all(|t| {
        let area = (t[1][0] - t[0][0]) * (t[2][1] - t[0][1]) - (t[2][0] - t[0][0]) * (t[1][1] - t[0][1]);
        area > 0.0
    })
}

/// Static quad geometry bound to one program's attribute layout
///
/// The attribute list is fixed when the quad is built; [`FullScreenQuad::draw`]
/// enables exactly those attributes and disables the same set afterwards.
pub struct FullScreenQuad {
    device: DeviceRef,
    vertex_array: VertexArrayId,
    vertex_buffer: BufferId,
    attributes: Vec<u32>,
}

impl FullScreenQuad {
    /// Upload the quad and describe its position attribute for `program`
    pub fn new(device: &DeviceRef, program: &ShaderProgram) -> RenderResult<Self> {
        debug_assert!(is_front_facing(&QUAD_VERTICES));
        let vertex_array = device.create_vertex_array()?;
        device.bind_vertex_array(Some(vertex_array));
        let vertex_buffer = match device.create_buffer(BufferKind::Array, bytemuck::cast_slice(&QUAD_VERTICES)) {
            Ok(buffer) => buffer,
            Err(e) => {
                device.bind_vertex_array(None);
                device.delete_vertex_array(vertex_array);
                return Err(e);
            }
        };

        let position = program.attribute(POSITION_ATTRIBUTE).unwrap_or_else(|| {
            log::warn!("Composite program has no '{POSITION_ATTRIBUTE}' attribute, using index 0");
            0
        });
        device.vertex_attribute_pointer(position, 3, 0, 0);
        device.bind_vertex_array(None);

        Ok(Self { device: DeviceRef::clone(device), vertex_array, vertex_buffer, attributes: vec![position] })
    }

    /// Number of vertex attributes the quad uses
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }

    /// Issue the full-screen draw with symmetric attribute enable/disable
    pub fn draw(&self) {
        self.device.bind_vertex_array(Some(self.vertex_array));
        for &index in &self.attributes {
            self.device.enable_vertex_attribute(index);
        }
        self.device.draw_arrays(Primitive::Triangles, 0, QUAD_VERTICES.len() as i32);
        for &index in &self.attributes {
            self.device.disable_vertex_attribute(index);
        }
        self.device.bind_vertex_array(None);
    }
}

impl Drop for FullScreenQuad {
    fn drop(&mut self) {
        self.device.delete_buffer(self.vertex_buffer);
        self.device.delete_vertex_array(self.vertex_array);
    }
}

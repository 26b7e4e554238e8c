//! Graphics device abstraction
//!
//! A thin, GL-shaped command surface. Components above this layer build
//! framebuffers, programs and draw calls exclusively through it, which keeps
//! the post-processing pipeline testable without a GPU context.

use std::rc::Rc;

use super::types::{
    AttachmentSlot, BufferId, BufferKind, FramebufferId, FramebufferStatus, Primitive,
    ProgramId, RenderbufferId, TextureDesc, TextureId, UniformLocation, UniformValue,
    VertexArrayId,
};
use crate::render::state::{ClearFlags, StateChange};
use crate::render::RenderResult;

/// Shared handle to the device
///
/// The device is the graphics context, not a GPU resource: each texture,
/// framebuffer or program is still owned by exactly one component, which keeps
/// a clone of this handle so it can release its objects on drop.
pub type DeviceRef = Rc<dyn GraphicsDevice>;

/// Command surface of a graphics context
///
/// All methods take `&self`; the context is single-threaded and implementors
/// use interior mutability where they keep state. Only object creation and
/// program compilation can fail. Everything else mirrors GL and has no error
/// channel.
pub trait GraphicsDevice {
    // --- framebuffers ---

    /// Create an empty framebuffer object
    fn create_framebuffer(&self) -> RenderResult<FramebufferId>;

    /// Bind a framebuffer for drawing; `None` selects the window surface
    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>);

    /// Completeness of the currently bound framebuffer
    fn framebuffer_status(&self) -> FramebufferStatus;

    /// Declare the color attachments written by subsequent draws
    fn set_draw_buffers(&self, slots: &[AttachmentSlot]);

    /// Release a framebuffer object
    fn delete_framebuffer(&self, framebuffer: FramebufferId);

    // --- depth/stencil storage ---

    /// Allocate a depth24/stencil8 renderbuffer and attach it to the bound framebuffer
    fn create_depth_stencil_buffer(&self, width: u32, height: u32) -> RenderResult<RenderbufferId>;

    /// Reallocate renderbuffer storage at a new size
    fn resize_depth_stencil_buffer(&self, renderbuffer: RenderbufferId, width: u32, height: u32);

    /// Release a renderbuffer
    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId);

    // --- textures ---

    /// Allocate a 2D texture, optionally uploading tightly packed pixels
    fn create_texture(&self, desc: &TextureDesc, pixels: Option<&[u8]>) -> RenderResult<TextureId>;

    /// Reallocate texture storage at a new size, keeping the handle
    fn resize_texture(&self, texture: TextureId, width: u32, height: u32);

    /// Attach a texture to a color slot of the bound framebuffer
    fn attach_color_texture(&self, slot: AttachmentSlot, texture: TextureId);

    /// Make `texture` current on texture unit `unit`
    fn bind_texture(&self, unit: u32, texture: TextureId);

    /// Release a texture
    fn delete_texture(&self, texture: TextureId);

    // --- programs ---

    /// Compile both stages and link them
    ///
    /// Errors carry the driver's diagnostic text.
    fn compile_program(&self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId>;

    /// Activate a program; `None` unbinds
    fn use_program(&self, program: Option<ProgramId>);

    /// Look up a uniform; absent uniforms give [`UniformLocation::INERT`]
    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation;

    /// Look up a vertex attribute index
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;

    /// Upload a value to a uniform of the active program
    fn set_uniform(&self, location: UniformLocation, value: UniformValue);

    /// Release a program
    fn delete_program(&self, program: ProgramId);

    // --- geometry ---

    /// Create a vertex array object
    fn create_vertex_array(&self) -> RenderResult<VertexArrayId>;

    /// Bind a vertex array; `None` unbinds
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);

    /// Release a vertex array
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    /// Create a static buffer, upload `data` and leave it bound to `kind`
    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> RenderResult<BufferId>;

    /// Bind a buffer to a target
    fn bind_buffer(&self, kind: BufferKind, buffer: BufferId);

    /// Release a buffer
    fn delete_buffer(&self, buffer: BufferId);

    /// Enable a vertex attribute array
    fn enable_vertex_attribute(&self, index: u32);

    /// Disable a vertex attribute array
    fn disable_vertex_attribute(&self, index: u32);

    /// Describe float attribute `index` inside the bound array buffer
    fn vertex_attribute_pointer(&self, index: u32, components: i32, stride: i32, offset: i32);

    /// Non-indexed draw
    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);

    /// Indexed draw from the bound element buffer (32-bit indices)
    fn draw_elements(&self, primitive: Primitive, count: i32);

    // --- fixed-function state ---

    /// Apply one state change
    fn apply_state(&self, change: &StateChange);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&self, flags: ClearFlags) {
        self.apply_state(&StateChange::Clear(flags));
    }

    /// Color used by color clears
    fn set_clear_color(&self, rgba: [f32; 4]);

    /// Viewport rectangle in pixels
    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32);
}

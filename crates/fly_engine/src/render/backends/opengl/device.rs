//! `glow` implementation of the graphics device

use std::cell::RefCell;
use std::collections::HashMap;
use std::num::NonZeroU32;
use std::os::raw::c_void;

use glow::HasContext;

use crate::render::api::{
    AttachmentSlot, BufferId, BufferKind, FramebufferId, FramebufferStatus, GraphicsDevice,
    Primitive, ProgramId, RenderbufferId, ShaderStage, TextureDesc, TextureFilter, TextureFormat,
    TextureId, TextureWrap, UniformLocation, UniformValue, VertexArrayId,
};
use crate::render::state::{BlendFactor, Capability, ClearFlags, CompareFunc, StateChange, StencilAction};
use crate::render::{RenderError, RenderResult};

/// OpenGL 3.3 core device
///
/// Handles are the raw GL object names. Every call is forwarded to the driver
/// immediately; there is no state caching.
pub struct GlDevice {
    gl: glow::Context,
    texture_formats: RefCell<HashMap<TextureId, TextureFormat>>,
}

impl GlDevice {
    /// Wrap an already loaded context
    pub fn new(gl: glow::Context) -> Self {
        let device = Self { gl, texture_formats: RefCell::new(HashMap::new()) };
        log::info!("OpenGL device ready: {}", device.driver_info());
        device
    }

    /// Load GL entry points through `loader`
    ///
    /// # Safety
    ///
    /// A GL context must be current on this thread and `loader` must return
    /// valid function pointers for it (null for unsupported symbols).
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        Self::new(glow::Context::from_loader_function(loader))
    }

    /// Driver version and renderer strings
    pub fn driver_info(&self) -> String {
        unsafe {
            format!(
                "{} ({})",
                self.gl.get_parameter_string(glow::VERSION),
                self.gl.get_parameter_string(glow::RENDERER)
            )
        }
    }

    fn texture_format(&self, texture: TextureId) -> TextureFormat {
        self.texture_formats.borrow().get(&texture).copied().unwrap_or(TextureFormat::Rgb8)
    }

    unsafe fn upload_texture_storage(
        &self,
        format: TextureFormat,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) {
        let (internal, pixel_format, pixel_type) = format_enums(format);
        self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
        self.gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            internal as i32,
            width as i32,
            height as i32,
            0,
            pixel_format,
            pixel_type,
            pixels,
        );
    }

    unsafe fn release_shaders(&self, program: glow::Program, shaders: &[glow::Shader]) {
        for &shader in shaders {
            self.gl.detach_shader(program, shader);
            self.gl.delete_shader(shader);
        }
    }
}

fn nonzero(raw: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(raw)
}

fn native_framebuffer(id: FramebufferId) -> Option<glow::Framebuffer> {
    nonzero(id.0).map(glow::NativeFramebuffer)
}

fn native_texture(id: TextureId) -> Option<glow::Texture> {
    nonzero(id.0).map(glow::NativeTexture)
}

fn native_renderbuffer(id: RenderbufferId) -> Option<glow::Renderbuffer> {
    nonzero(id.0).map(glow::NativeRenderbuffer)
}

fn native_program(id: ProgramId) -> Option<glow::Program> {
    nonzero(id.0).map(glow::NativeProgram)
}

fn native_buffer(id: BufferId) -> Option<glow::Buffer> {
    nonzero(id.0).map(glow::NativeBuffer)
}

fn native_vertex_array(id: VertexArrayId) -> Option<glow::VertexArray> {
    nonzero(id.0).map(glow::NativeVertexArray)
}

/// Internal format, pixel format and pixel type
const fn format_enums(format: TextureFormat) -> (u32, u32, u32) {
    match format {
        TextureFormat::Rgb8 => (glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rg16f => (glow::RG16F, glow::RG, glow::HALF_FLOAT),
    }
}

const fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Array => glow::ARRAY_BUFFER,
        BufferKind::Element => glow::ELEMENT_ARRAY_BUFFER,
    }
}

const fn primitive_enum(primitive: Primitive) -> u32 {
    match primitive {
        Primitive::Triangles => glow::TRIANGLES,
        Primitive::TriangleStrip => glow::TRIANGLE_STRIP,
    }
}

const fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::StencilTest => glow::STENCIL_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
    }
}

const fn compare_enum(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::LessEqual => glow::LEQUAL,
        CompareFunc::Greater => glow::GREATER,
        CompareFunc::NotEqual => glow::NOTEQUAL,
        CompareFunc::GreaterEqual => glow::GEQUAL,
        CompareFunc::Always => glow::ALWAYS,
    }
}

const fn stencil_enum(action: StencilAction) -> u32 {
    match action {
        StencilAction::Keep => glow::KEEP,
        StencilAction::Zero => glow::ZERO,
        StencilAction::Replace => glow::REPLACE,
        StencilAction::Increment => glow::INCR,
        StencilAction::Decrement => glow::DECR,
        StencilAction::Invert => glow::INVERT,
    }
}

const fn blend_enum(factor: BlendFactor) -> u32 {
    match factor {
        BlendFactor::Zero => glow::ZERO,
        BlendFactor::One => glow::ONE,
        BlendFactor::SrcAlpha => glow::SRC_ALPHA,
        BlendFactor::OneMinusSrcAlpha => glow::ONE_MINUS_SRC_ALPHA,
    }
}

fn clear_mask(flags: ClearFlags) -> u32 {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::STENCIL) {
        mask |= glow::STENCIL_BUFFER_BIT;
    }
    mask
}

const fn color_attachment(slot: AttachmentSlot) -> u32 {
    glow::COLOR_ATTACHMENT0 + slot.0
}

impl GraphicsDevice for GlDevice {
    fn create_framebuffer(&self) -> RenderResult<FramebufferId> {
        let framebuffer = unsafe { self.gl.create_framebuffer() }
            .map_err(|e| RenderError::ResourceCreationFailed(format!("framebuffer: {e}")))?;
        Ok(FramebufferId(framebuffer.0.get()))
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer.and_then(native_framebuffer));
        }
    }

    fn framebuffer_status(&self) -> FramebufferStatus {
        let status = unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) };
        if status == glow::FRAMEBUFFER_COMPLETE {
            FramebufferStatus::Complete
        } else {
            FramebufferStatus::Incomplete(status)
        }
    }

    fn set_draw_buffers(&self, slots: &[AttachmentSlot]) {
        let buffers: Vec<u32> = slots.iter().copied().map(color_attachment).collect();
        unsafe { self.gl.draw_buffers(&buffers) };
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        if let Some(native) = native_framebuffer(framebuffer) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
    }

    fn create_depth_stencil_buffer(&self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        unsafe {
            let renderbuffer = self
                .gl
                .create_renderbuffer()
                .map_err(|e| RenderError::ResourceCreationFailed(format!("renderbuffer: {e}")))?;
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, Some(renderbuffer));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                width as i32,
                height as i32,
            );
            self.gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_STENCIL_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(renderbuffer),
            );
            Ok(RenderbufferId(renderbuffer.0.get()))
        }
    }

    fn resize_depth_stencil_buffer(&self, renderbuffer: RenderbufferId, width: u32, height: u32) {
        unsafe {
            self.gl.bind_renderbuffer(glow::RENDERBUFFER, native_renderbuffer(renderbuffer));
            self.gl.renderbuffer_storage(
                glow::RENDERBUFFER,
                glow::DEPTH24_STENCIL8,
                width as i32,
                height as i32,
            );
        }
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        if let Some(native) = native_renderbuffer(renderbuffer) {
            unsafe { self.gl.delete_renderbuffer(native) };
        }
    }

    fn create_texture(&self, desc: &TextureDesc, pixels: Option<&[u8]>) -> RenderResult<TextureId> {
        if let Some(data) = pixels {
            if data.len() < desc.byte_len() {
                return Err(RenderError::ResourceCreationFailed(format!(
                    "texture upload of {} bytes is smaller than {}x{} requires",
                    data.len(),
                    desc.width,
                    desc.height
                )));
            }
        }

        let id = unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| RenderError::ResourceCreationFailed(format!("texture: {e}")))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.upload_texture_storage(desc.format, desc.width, desc.height, pixels);

            let min_filter = match desc.min_filter {
                TextureFilter::Linear => glow::LINEAR,
                TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
            };
            let wrap = match desc.wrap {
                TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
                TextureWrap::Repeat => glow::REPEAT,
            };
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, min_filter as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, wrap as i32);
            self.gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, wrap as i32);
            if desc.mipmaps {
                self.gl.generate_mipmap(glow::TEXTURE_2D);
            }
            TextureId(texture.0.get())
        };

        self.texture_formats.borrow_mut().insert(id, desc.format);
        Ok(id)
    }

    fn resize_texture(&self, texture: TextureId, width: u32, height: u32) {
        let format = self.texture_format(texture);
        unsafe {
            self.gl.bind_texture(glow::TEXTURE_2D, native_texture(texture));
            self.upload_texture_storage(format, width, height, None);
        }
    }

    fn attach_color_texture(&self, slot: AttachmentSlot, texture: TextureId) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                color_attachment(slot),
                glow::TEXTURE_2D,
                native_texture(texture),
                0,
            );
        }
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native_texture(texture));
        }
    }

    fn delete_texture(&self, texture: TextureId) {
        self.texture_formats.borrow_mut().remove(&texture);
        if let Some(native) = native_texture(texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn compile_program(&self, vertex_source: &str, fragment_source: &str) -> RenderResult<ProgramId> {
        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|e| RenderError::ResourceCreationFailed(format!("program: {e}")))?;

            let mut shaders = Vec::with_capacity(2);
            for (stage, source) in [
                (ShaderStage::Vertex, vertex_source),
                (ShaderStage::Fragment, fragment_source),
            ] {
                let kind = match stage {
                    ShaderStage::Vertex => glow::VERTEX_SHADER,
                    ShaderStage::Fragment => glow::FRAGMENT_SHADER,
                };
                let shader = match self.gl.create_shader(kind) {
                    Ok(shader) => shader,
                    Err(e) => {
                        self.release_shaders(program, &shaders);
                        self.gl.delete_program(program);
                        return Err(RenderError::ResourceCreationFailed(format!("shader: {e}")));
                    }
                };
                self.gl.shader_source(shader, source);
                self.gl.compile_shader(shader);
                if !self.gl.get_shader_compile_status(shader) {
                    let log = self.gl.get_shader_info_log(shader);
                    self.gl.delete_shader(shader);
                    self.release_shaders(program, &shaders);
                    self.gl.delete_program(program);
                    return Err(RenderError::ShaderCompilation { stage: stage.name(), log });
                }
                self.gl.attach_shader(program, shader);
                shaders.push(shader);
            }

            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);
            let log = if linked { String::new() } else { self.gl.get_program_info_log(program) };
            self.release_shaders(program, &shaders);
            if !linked {
                self.gl.delete_program(program);
                return Err(RenderError::ShaderLink { log });
            }

            Ok(ProgramId(program.0.get()))
        }
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { self.gl.use_program(program.and_then(native_program)) };
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        native_program(program)
            .and_then(|native| unsafe { self.gl.get_uniform_location(native, name) })
            .map_or(UniformLocation::INERT, |location| UniformLocation::new(location.0))
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        native_program(program).and_then(|native| unsafe { self.gl.get_attrib_location(native, name) })
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        let Some(raw) = location.raw() else {
            return;
        };
        let location = glow::NativeUniformLocation(raw);
        let location = Some(&location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::FloatArray(v) => self.gl.uniform_1_f32_slice(location, &v),
                UniformValue::Vec3Array(v) => self.gl.uniform_3_f32_slice(location, &v),
                UniformValue::Mat3(m) => self.gl.uniform_matrix_3_f32_slice(location, false, m.as_slice()),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(location, false, m.as_slice()),
            }
        }
    }

    fn delete_program(&self, program: ProgramId) {
        if let Some(native) = native_program(program) {
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn create_vertex_array(&self) -> RenderResult<VertexArrayId> {
        let vertex_array = unsafe { self.gl.create_vertex_array() }
            .map_err(|e| RenderError::ResourceCreationFailed(format!("vertex array: {e}")))?;
        Ok(VertexArrayId(vertex_array.0.get()))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        unsafe { self.gl.bind_vertex_array(vertex_array.and_then(native_vertex_array)) };
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        if let Some(native) = native_vertex_array(vertex_array) {
            unsafe { self.gl.delete_vertex_array(native) };
        }
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> RenderResult<BufferId> {
        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| RenderError::ResourceCreationFailed(format!("buffer: {e}")))?;
            let target = buffer_target(kind);
            self.gl.bind_buffer(target, Some(buffer));
            self.gl.buffer_data_u8_slice(target, data, glow::STATIC_DRAW);
            Ok(BufferId(buffer.0.get()))
        }
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: BufferId) {
        unsafe { self.gl.bind_buffer(buffer_target(kind), native_buffer(buffer)) };
    }

    fn delete_buffer(&self, buffer: BufferId) {
        if let Some(native) = native_buffer(buffer) {
            unsafe { self.gl.delete_buffer(native) };
        }
    }

    fn enable_vertex_attribute(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attribute(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attribute_pointer(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl.vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset);
        }
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(primitive_enum(primitive), first, count) };
    }

    fn draw_elements(&self, primitive: Primitive, count: i32) {
        unsafe { self.gl.draw_elements(primitive_enum(primitive), count, glow::UNSIGNED_INT, 0) };
    }

    fn apply_state(&self, change: &StateChange) {
        unsafe {
            match *change {
                StateChange::Enable(capability) => self.gl.enable(capability_enum(capability)),
                StateChange::Disable(capability) => self.gl.disable(capability_enum(capability)),
                StateChange::DepthFunc(func) => self.gl.depth_func(compare_enum(func)),
                StateChange::DepthMask(enabled) => self.gl.depth_mask(enabled),
                StateChange::StencilFunc { func, reference, mask } => {
                    self.gl.stencil_func(compare_enum(func), reference, mask);
                }
                StateChange::StencilOp { stencil_fail, depth_fail, pass } => self.gl.stencil_op(
                    stencil_enum(stencil_fail),
                    stencil_enum(depth_fail),
                    stencil_enum(pass),
                ),
                StateChange::StencilMask(mask) => self.gl.stencil_mask(mask),
                StateChange::BlendFunc { source, destination } => {
                    self.gl.blend_func(blend_enum(source), blend_enum(destination));
                }
                StateChange::Clear(flags) => self.gl.clear(clear_mask(flags)),
            }
        }
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        unsafe { self.gl.clear_color(rgba[0], rgba[1], rgba[2], rgba[3]) };
    }

    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, width as i32, height as i32) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_mask_combines_bits() {
        let mask = clear_mask(ClearFlags::COLOR | ClearFlags::DEPTH);
        assert_eq!(mask, glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        assert_eq!(clear_mask(ClearFlags::empty()), 0);
    }

    #[test]
    fn test_color_attachment_offsets() {
        assert_eq!(color_attachment(AttachmentSlot(0)), glow::COLOR_ATTACHMENT0);
        assert_eq!(color_attachment(AttachmentSlot(1)), glow::COLOR_ATTACHMENT1);
    }

    #[test]
    fn test_float_format_uses_half_float_storage() {
        assert_eq!(format_enums(TextureFormat::Rg16f), (glow::RG16F, glow::RG, glow::HALF_FLOAT));
        assert_eq!(format_enums(TextureFormat::Rgb8).2, glow::UNSIGNED_BYTE);
    }

    #[test]
    fn test_zero_handles_have_no_native_object() {
        assert!(native_texture(TextureId(0)).is_none());
        assert!(native_framebuffer(FramebufferId(7)).is_some());
    }
}

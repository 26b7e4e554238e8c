//! Headless recording device
//!
//! Simulates the slice of GL object state the renderer depends on and keeps an
//! ordered log of every call. Tests drive real engine components against it
//! and assert on the log; it can also be configured to fail shader
//! compilation or report incomplete framebuffers.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::render::api::{
    AttachmentSlot, BufferId, BufferKind, FramebufferId, FramebufferStatus, GraphicsDevice,
    Primitive, ProgramId, RenderbufferId, ShaderStage, TextureDesc, TextureFormat, TextureId, UniformLocation,
    UniformValue, VertexArrayId,
};
use crate::render::state::{Capability, StateChange};
use crate::render::{RenderError, RenderResult};

/// Status code reported for a simulated incomplete framebuffer
/// (`GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT`).
pub const INCOMPLETE_ATTACHMENT: u32 = 0x8CD6;

/// One recorded device call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum DeviceCommand {
    CreateFramebuffer(FramebufferId),
    BindFramebuffer(Option<FramebufferId>),
    DrawBuffers(Vec<AttachmentSlot>),
    DeleteFramebuffer(FramebufferId),
    CreateDepthStencil { id: RenderbufferId, width: u32, height: u32 },
    ResizeDepthStencil { id: RenderbufferId, width: u32, height: u32 },
    DeleteRenderbuffer(RenderbufferId),
    CreateTexture { id: TextureId, width: u32, height: u32 },
    ResizeTexture { id: TextureId, width: u32, height: u32 },
    AttachColorTexture { slot: AttachmentSlot, texture: TextureId },
    BindTexture { unit: u32, texture: TextureId },
    DeleteTexture(TextureId),
    CompileProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    QueryUniform { program: ProgramId, name: String },
    SetUniform { location: UniformLocation, value: UniformValue },
    DeleteProgram(ProgramId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    DeleteVertexArray(VertexArrayId),
    CreateBuffer { id: BufferId, kind: BufferKind, len: usize },
    BindBuffer { kind: BufferKind, id: BufferId },
    DeleteBuffer(BufferId),
    EnableAttribute(u32),
    DisableAttribute(u32),
    AttributePointer { index: u32, components: i32, stride: i32, offset: i32 },
    DrawArrays { primitive: Primitive, first: i32, count: i32 },
    DrawElements { primitive: Primitive, count: i32 },
    State(StateChange),
    ClearColor([f32; 4]),
    Viewport { x: i32, y: i32, width: u32, height: u32 },
}

#[derive(Default)]
struct ProgramState {
    uniforms: HashMap<String, u32>,
    attributes: HashMap<String, u32>,
}

#[derive(Default)]
struct RecorderState {
    next_id: u32,
    next_uniform: u32,
    commands: Vec<DeviceCommand>,
    live: HashSet<u32>,
    textures: HashMap<TextureId, (u32, u32)>,
    texture_formats: HashMap<TextureId, TextureFormat>,
    renderbuffers: HashMap<RenderbufferId, (u32, u32)>,
    attachments: HashMap<FramebufferId, BTreeMap<AttachmentSlot, TextureId>>,
    bound_framebuffer: Option<FramebufferId>,
    programs: HashMap<ProgramId, ProgramState>,
    current_program: Option<ProgramId>,
    uniform_values: HashMap<u32, UniformValue>,
    texture_units: BTreeMap<u32, TextureId>,
    enabled_attributes: BTreeSet<u32>,
    capabilities: HashSet<Capability>,
    depth_writes: bool,
}

impl RecorderState {
    fn allocate(&mut self) -> u32 {
        self.next_id += 1;
        self.live.insert(self.next_id);
        self.next_id
    }

    fn release(&mut self, id: u32) {
        if !self.live.remove(&id) {
            log::warn!("Recording device: object {id} released twice or never created");
        }
    }
}

/// Failure to inject into shader compilation
#[derive(Debug, Clone)]
enum ShaderFailure {
    Compile(ShaderStage, String),
    Link(String),
}

/// Headless [`GraphicsDevice`] that records every call
pub struct RecordingDevice {
    state: RefCell<RecorderState>,
    shader_failure: Option<ShaderFailure>,
    incomplete_framebuffers: bool,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingDevice {
    /// Device on which every operation succeeds
    pub fn new() -> Self {
        Self {
            state: RefCell::new(RecorderState { depth_writes: true, ..RecorderState::default() }),
            shader_failure: None,
            incomplete_framebuffers: false,
        }
    }

    /// Make every compilation of `stage` fail with `log`
    #[must_use]
    pub fn failing_compilation(mut self, stage: ShaderStage, log: &str) -> Self {
        self.shader_failure = Some(ShaderFailure::Compile(stage, log.to_string()));
        self
    }

    /// Make every program link fail with `log`
    #[must_use]
    pub fn failing_link(mut self, log: &str) -> Self {
        self.shader_failure = Some(ShaderFailure::Link(log.to_string()));
        self
    }

    /// Report every framebuffer as incomplete
    #[must_use]
    pub const fn with_incomplete_framebuffers(mut self) -> Self {
        self.incomplete_framebuffers = true;
        self
    }

    fn record(&self, command: DeviceCommand) {
        self.state.borrow_mut().commands.push(command);
    }

    /// Snapshot of the command log
    pub fn commands(&self) -> Vec<DeviceCommand> {
        self.state.borrow().commands.clone()
    }

    /// Forget recorded commands, keeping object state
    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Number of commands matching `predicate`
    pub fn count(&self, predicate: impl Fn(&DeviceCommand) -> bool) -> usize {
        self.state.borrow().commands.iter().filter(|c| predicate(*c)).count()
    }

    /// Current size of a texture
    pub fn texture_size(&self, texture: TextureId) -> Option<(u32, u32)> {
        self.state.borrow().textures.get(&texture).copied()
    }

    /// Storage format a texture was created with
    pub fn texture_format(&self, texture: TextureId) -> Option<TextureFormat> {
        self.state.borrow().texture_formats.get(&texture).copied()
    }

    /// Current size of a renderbuffer
    pub fn renderbuffer_size(&self, renderbuffer: RenderbufferId) -> Option<(u32, u32)> {
        self.state.borrow().renderbuffers.get(&renderbuffer).copied()
    }

    /// Color attachments of a framebuffer, ordered by slot
    pub fn attachments(&self, framebuffer: FramebufferId) -> Vec<(AttachmentSlot, TextureId)> {
        self.state
            .borrow()
            .attachments
            .get(&framebuffer)
            .map(|slots| slots.iter().map(|(s, t)| (*s, *t)).collect())
            .unwrap_or_default()
    }

    /// Currently bound framebuffer, `None` for the screen
    pub fn bound_framebuffer(&self) -> Option<FramebufferId> {
        self.state.borrow().bound_framebuffer
    }

    /// Program currently in use
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    /// Texture currently bound on `unit`
    pub fn texture_on_unit(&self, unit: u32) -> Option<TextureId> {
        self.state.borrow().texture_units.get(&unit).copied()
    }

    /// Last value written to a uniform location
    pub fn uniform_value(&self, location: UniformLocation) -> Option<UniformValue> {
        let raw = location.raw()?;
        self.state.borrow().uniform_values.get(&raw).cloned()
    }

    /// Last value written to a named uniform of `program`
    pub fn uniform_by_name(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        let state = self.state.borrow();
        let raw = state.programs.get(&program)?.uniforms.get(name)?;
        state.uniform_values.get(raw).cloned()
    }

    /// Vertex attributes currently enabled
    pub fn enabled_attributes(&self) -> Vec<u32> {
        self.state.borrow().enabled_attributes.iter().copied().collect()
    }

    /// Whether a capability is currently enabled
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    /// Whether depth writes are currently enabled
    pub fn depth_writes_enabled(&self) -> bool {
        self.state.borrow().depth_writes
    }

    /// Number of GPU objects created and not yet released
    pub fn live_objects(&self) -> usize {
        self.state.borrow().live.len()
    }

    /// Number of programs compiled so far
    pub fn programs_compiled(&self) -> usize {
        self.count(|c| matches!(c, DeviceCommand::CompileProgram(_)))
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_framebuffer(&self) -> RenderResult<FramebufferId> {
        let id = FramebufferId(self.state.borrow_mut().allocate());
        self.state.borrow_mut().attachments.insert(id, BTreeMap::new());
        self.record(DeviceCommand::CreateFramebuffer(id));
        Ok(id)
    }

    fn bind_framebuffer(&self, framebuffer: Option<FramebufferId>) {
        self.state.borrow_mut().bound_framebuffer = framebuffer;
        self.record(DeviceCommand::BindFramebuffer(framebuffer));
    }

    fn framebuffer_status(&self) -> FramebufferStatus {
        if self.incomplete_framebuffers && self.state.borrow().bound_framebuffer.is_some() {
            FramebufferStatus::Incomplete(INCOMPLETE_ATTACHMENT)
        } else {
            FramebufferStatus::Complete
        }
    }

    fn set_draw_buffers(&self, slots: &[AttachmentSlot]) {
        self.record(DeviceCommand::DrawBuffers(slots.to_vec()));
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferId) {
        {
            let mut state = self.state.borrow_mut();
            state.release(framebuffer.0);
            state.attachments.remove(&framebuffer);
        }
        self.record(DeviceCommand::DeleteFramebuffer(framebuffer));
    }

    fn create_depth_stencil_buffer(&self, width: u32, height: u32) -> RenderResult<RenderbufferId> {
        let id = {
            let mut state = self.state.borrow_mut();
            let id = RenderbufferId(state.allocate());
            state.renderbuffers.insert(id, (width, height));
            id
        };
        self.record(DeviceCommand::CreateDepthStencil { id, width, height });
        Ok(id)
    }

    fn resize_depth_stencil_buffer(&self, renderbuffer: RenderbufferId, width: u32, height: u32) {
        self.state.borrow_mut().renderbuffers.insert(renderbuffer, (width, height));
        self.record(DeviceCommand::ResizeDepthStencil { id: renderbuffer, width, height });
    }

    fn delete_renderbuffer(&self, renderbuffer: RenderbufferId) {
        {
            let mut state = self.state.borrow_mut();
            state.release(renderbuffer.0);
            state.renderbuffers.remove(&renderbuffer);
        }
        self.record(DeviceCommand::DeleteRenderbuffer(renderbuffer));
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
        let id = {
            let mut state = self.state.borrow_mut();
            let id = TextureId(state.allocate());
            state.textures.insert(id, (desc.width, desc.height));
            state.texture_formats.insert(id, desc.format);
            id
        };
        self.record(DeviceCommand::CreateTexture { id, width: desc.width, height: desc.height });
        Ok(id)
    }

    fn resize_texture(&self, texture: TextureId, width: u32, height: u32) {
        self.state.borrow_mut().textures.insert(texture, (width, height));
        self.record(DeviceCommand::ResizeTexture { id: texture, width, height });
    }

    fn attach_color_texture(&self, slot: AttachmentSlot, texture: TextureId) {
        {
            let mut state = self.state.borrow_mut();
            if let Some(framebuffer) = state.bound_framebuffer {
                state.attachments.entry(framebuffer).or_default().insert(slot, texture);
            }
        }
        self.record(DeviceCommand::AttachColorTexture { slot, texture });
    }

    fn bind_texture(&self, unit: u32, texture: TextureId) {
        self.state.borrow_mut().texture_units.insert(unit, texture);
        self.record(DeviceCommand::BindTexture { unit, texture });
    }

    fn delete_texture(&self, texture: TextureId) {
        {
            let mut state = self.state.borrow_mut();
            state.release(texture.0);
            state.textures.remove(&texture);
            state.texture_formats.remove(&texture);
        }
        self.record(DeviceCommand::DeleteTexture(texture));
    }

    fn compile_program(&self, _vertex_source: &str, _fragment_source: &str) -> RenderResult<ProgramId> {
        match &self.shader_failure {
            Some(ShaderFailure::Compile(stage, log)) => {
                return Err(RenderError::ShaderCompilation { stage: stage.name(), log: log.clone() });
            }
            Some(ShaderFailure::Link(log)) => {
                return Err(RenderError::ShaderLink { log: log.clone() });
            }
            None => {}
        }
        let id = {
            let mut state = self.state.borrow_mut();
            let id = ProgramId(state.allocate());
            state.programs.insert(id, ProgramState::default());
            id
        };
        self.record(DeviceCommand::CompileProgram(id));
        Ok(id)
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.state.borrow_mut().current_program = program;
        self.record(DeviceCommand::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> UniformLocation {
        let location = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            match state.programs.get_mut(&program) {
                Some(entry) => {
                    let raw = *entry.uniforms.entry(name.to_string()).or_insert(state.next_uniform);
                    if raw == state.next_uniform {
                        state.next_uniform += 1;
                    }
                    UniformLocation::new(raw)
                }
                None => UniformLocation::INERT,
            }
        };
        self.record(DeviceCommand::QueryUniform { program, name: name.to_string() });
        location
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        let entry = state.programs.get_mut(&program)?;
        let next = entry.attributes.len() as u32;
        Some(*entry.attributes.entry(name.to_string()).or_insert(next))
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformValue) {
        if let Some(raw) = location.raw() {
            self.state.borrow_mut().uniform_values.insert(raw, value.clone());
        }
        self.record(DeviceCommand::SetUniform { location, value });
    }

    fn delete_program(&self, program: ProgramId) {
        {
            let mut state = self.state.borrow_mut();
            state.release(program.0);
            state.programs.remove(&program);
        }
        self.record(DeviceCommand::DeleteProgram(program));
    }

    fn create_vertex_array(&self) -> RenderResult<VertexArrayId> {
        let id = VertexArrayId(self.state.borrow_mut().allocate());
        self.record(DeviceCommand::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        self.record(DeviceCommand::BindVertexArray(vertex_array));
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        self.state.borrow_mut().release(vertex_array.0);
        self.record(DeviceCommand::DeleteVertexArray(vertex_array));
    }

    fn create_buffer(&self, kind: BufferKind, data: &[u8]) -> RenderResult<BufferId> {
        let id = BufferId(self.state.borrow_mut().allocate());
        self.record(DeviceCommand::CreateBuffer { id, kind, len: data.len() });
        Ok(id)
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: BufferId) {
        self.record(DeviceCommand::BindBuffer { kind, id: buffer });
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.state.borrow_mut().release(buffer.0);
        self.record(DeviceCommand::DeleteBuffer(buffer));
    }

    fn enable_vertex_attribute(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.insert(index);
        self.record(DeviceCommand::EnableAttribute(index));
    }

    fn disable_vertex_attribute(&self, index: u32) {
        self.state.borrow_mut().enabled_attributes.remove(&index);
        self.record(DeviceCommand::DisableAttribute(index));
    }

    fn vertex_attribute_pointer(&self, index: u32, components: i32, stride: i32, offset: i32) {
        self.record(DeviceCommand::AttributePointer { index, components, stride, offset });
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        self.record(DeviceCommand::DrawArrays { primitive, first, count });
    }

    fn draw_elements(&self, primitive: Primitive, count: i32) {
        self.record(DeviceCommand::DrawElements { primitive, count });
    }

    fn apply_state(&self, change: &StateChange) {
        {
            let mut state = self.state.borrow_mut();
            match *change {
                StateChange::Enable(capability) => {
                    state.capabilities.insert(capability);
                }
                StateChange::Disable(capability) => {
                    state.capabilities.remove(&capability);
                }
                StateChange::DepthMask(enabled) => state.depth_writes = enabled,
                _ => {}
            }
        }
        self.record(DeviceCommand::State(*change));
    }

    fn set_clear_color(&self, rgba: [f32; 4]) {
        self.record(DeviceCommand::ClearColor(rgba));
    }

    fn set_viewport(&self, x: i32, y: i32, width: u32, height: u32) {
        self.record(DeviceCommand::Viewport { x, y, width, height });
    }
}

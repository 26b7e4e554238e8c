//! Textured, normal-mapped triangle mesh
//!
//! A [`Mesh`] owns its vertex buffers, index buffer, material textures and
//! shader program. Uniform locations are queried once when the mesh is built
//! and reused by every draw.
//!
//! # Motion State
//! For motion blur each mesh keeps the clip-space transform of the previous
//! frame next to the current one. The first primary draw of a frame records
//! the current `P·V·M`; [`Drawable::end_frame`] moves it into the previous
//! slot. Mirrored draws read both values but never write them, so a mesh drawn
//! twice in one frame still advances its history exactly once.

use std::path::Path;

use crate::assets::{self, ImageData, MeshData};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::render::api::{
    BufferId, BufferKind, DeviceRef, Primitive, TextureDesc, TextureFormat, TextureId, UniformLocation, UniformValue,
    VertexArrayId,
};
use crate::render::compositor::{DrawPass, Drawable, FrameContext};
use crate::render::shader::ShaderProgram;
use crate::render::{RenderError, RenderResult};

use super::Actor;

/// Attribute indices and component counts, matching the `layout(location)`
/// qualifiers of the mesh vertex shader
pub const MESH_ATTRIBUTES: [(u32, i32); 5] = [
    (0, 3), // position
    (1, 2), // uv
    (2, 3), // normal
    (3, 3), // tangent
    (4, 3), // bitangent
];

/// Sampler uniform for the diffuse map
pub const DIFFUSE_SAMPLER: &str = "diffuseSampler";
/// Sampler uniform for the specular map
pub const SPECULAR_SAMPLER: &str = "specularSampler";
/// Sampler uniform for the normal map
pub const NORMAL_SAMPLER: &str = "normalSampler";

#[derive(Debug, Clone, Copy)]
struct MeshUniforms {
    mvp: UniformLocation,
    view: UniformLocation,
    model: UniformLocation,
    model_view_3x3: UniformLocation,
    old_mvp: UniformLocation,
    light_positions: UniformLocation,
    light_colors: UniformLocation,
    light_powers: UniformLocation,
    light_count: UniformLocation,
}

impl MeshUniforms {
    fn query(shader: &ShaderProgram) -> Self {
        Self {
            mvp: shader.uniform("MVP"),
            view: shader.uniform("viewMatrix"),
            model: shader.uniform("modelMatrix"),
            model_view_3x3: shader.uniform("modelView3x3"),
            old_mvp: shader.uniform("oldMVP"),
            light_positions: shader.uniform("lightPos"),
            light_colors: shader.uniform("lightColor"),
            light_powers: shader.uniform("lightPower"),
            light_count: shader.uniform("numberOfLights"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct MeshTexture {
    texture: TextureId,
    sampler: UniformLocation,
}

/// Clip-space transforms for motion blur
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    /// `P·V·M` of this frame's primary draw, until the frame ends
    pub current: Option<Mat4>,
    /// `P·V·M` committed at the end of the last drawn frame
    pub previous: Option<Mat4>,
}

/// GPU mesh with its own program, textures and transform
pub struct Mesh {
    device: DeviceRef,
    actor: Actor,
    shader: ShaderProgram,
    vertex_array: VertexArrayId,
    buffers: Vec<BufferId>,
    index_count: i32,
    textures: Vec<MeshTexture>,
    uniforms: MeshUniforms,
    motion: MotionState,
}

impl Mesh {
    /// Upload `data` and bind it to `shader`'s attribute layout
    pub fn new(device: &DeviceRef, data: &MeshData, shader: ShaderProgram) -> RenderResult<Self> {
        if data.indices.is_empty() {
            return Err(RenderError::InitializationFailed("mesh has no triangles".to_string()));
        }

        let vertex_array = device.create_vertex_array()?;
        let uniforms = MeshUniforms::query(&shader);
        let mut mesh = Self {
            device: DeviceRef::clone(device),
            actor: Actor::new(),
            shader,
            vertex_array,
            buffers: Vec::with_capacity(MESH_ATTRIBUTES.len() + 1),
            index_count: data.indices.len() as i32,
            textures: Vec::new(),
            uniforms,
            motion: MotionState::default(),
        };

        device.bind_vertex_array(Some(vertex_array));
        let uploaded = mesh.upload(data);
        device.bind_vertex_array(None);
        uploaded?;

        log::debug!("Mesh uploaded: {} vertices, {} indices", data.vertex_count(), data.indices.len());
        Ok(mesh)
    }

    fn upload(&mut self, data: &MeshData) -> RenderResult<()> {
        let streams: [&[u8]; 5] = [
            bytemuck::cast_slice(&data.positions),
            bytemuck::cast_slice(&data.uvs),
            bytemuck::cast_slice(&data.normals),
            bytemuck::cast_slice(&data.tangents),
            bytemuck::cast_slice(&data.bitangents),
        ];
        for ((index, components), bytes) in MESH_ATTRIBUTES.into_iter().zip(streams) {
            self.buffers.push(self.device.create_buffer(BufferKind::Array, bytes)?);
            self.device.vertex_attribute_pointer(index, components, 0, 0);
        }
        self.buffers.push(self.device.create_buffer(BufferKind::Element, bytemuck::cast_slice(&data.indices))?);
        Ok(())
    }

    /// Load geometry and shaders from disk
    pub fn from_files(
        device: &DeviceRef,
        obj_path: impl AsRef<Path>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let data = assets::load_mesh(obj_path)?;
        let shader = ShaderProgram::from_files(device, vertex_path, fragment_path)?;
        Self::new(device, &data, shader)
    }

    /// Upload `image` as a material texture read through `sampler`
    ///
    /// Textures are bound to consecutive units in the order they are added.
    pub fn add_texture(&mut self, image: &ImageData, sampler: &str) -> RenderResult<()> {
        let desc = TextureDesc::material(image.width, image.height, TextureFormat::Rgb8);
        let texture = self.device.create_texture(&desc, Some(&image.data))?;
        self.textures.push(MeshTexture { texture, sampler: self.shader.uniform(sampler) });
        Ok(())
    }

    /// Load an image from disk and add it as a material texture
    pub fn load_texture(&mut self, path: impl AsRef<Path>, sampler: &str) -> RenderResult<()> {
        let image = ImageData::from_file(path)?;
        self.add_texture(&image, sampler)
    }

    /// Number of material textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Transform of this mesh
    pub const fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Mutable transform; call [`Mesh::update`] afterwards
    pub fn actor_mut(&mut self) -> &mut Actor {
        &mut self.actor
    }

    /// Refresh the model matrix
    pub fn update(&mut self) {
        self.actor.update();
    }

    /// Motion blur history
    pub const fn motion(&self) -> MotionState {
        self.motion
    }

    /// Program handle
    pub const fn shader(&self) -> &ShaderProgram {
        &self.shader
    }

    fn upload_uniforms(&self, frame: &FrameContext<'_>, mvp: &Mat4, previous: &Mat4) {
        let model = self.actor.matrix();
        let lights = frame.lights;
        let u = &self.uniforms;

        self.device.set_uniform(u.light_positions, UniformValue::Vec3Array(lights.positions().to_vec()));
        self.device.set_uniform(u.light_colors, UniformValue::Vec3Array(lights.colors().to_vec()));
        self.device.set_uniform(u.light_powers, UniformValue::FloatArray(lights.intensities().to_vec()));
        self.device.set_uniform(u.light_count, UniformValue::Int(lights.count() as i32));

        self.device.set_uniform(u.mvp, UniformValue::Mat4(*mvp));
        self.device.set_uniform(u.view, UniformValue::Mat4(frame.view));
        self.device.set_uniform(u.model, UniformValue::Mat4(*model));
        self.device.set_uniform(u.old_mvp, UniformValue::Mat4(*previous));
        self.device.set_uniform(u.model_view_3x3, UniformValue::Mat3((frame.view * model).upper_left_3x3()));
    }

    fn bind_textures(&self) {
        for (unit, texture) in self.textures.iter().enumerate() {
            self.device.bind_texture(unit as u32, texture.texture);
            self.device.set_uniform(texture.sampler, UniformValue::Int(unit as i32));
        }
    }
}

impl Drawable for Mesh {
    fn draw(&mut self, frame: &FrameContext<'_>, pass: DrawPass) -> RenderResult<()> {
        let mvp = frame.projection * frame.view * self.actor.matrix();
        if pass == DrawPass::Primary && self.motion.current.is_none() {
            self.motion.current = Some(mvp);
        }
        // A mesh with no history yet reports zero motion.
        let previous = self.motion.previous.unwrap_or(mvp);

        self.shader.use_program();
        self.upload_uniforms(frame, &mvp, &previous);
        self.bind_textures();

        self.device.bind_vertex_array(Some(self.vertex_array));
        for (index, _) in MESH_ATTRIBUTES {
            self.device.enable_vertex_attribute(index);
        }
        self.device.draw_elements(Primitive::Triangles, self.index_count);
        for (index, _) in MESH_ATTRIBUTES {
            self.device.disable_vertex_attribute(index);
        }
        self.device.bind_vertex_array(None);
        Ok(())
    }

    fn scale(&self) -> Vec3 {
        self.actor.scale()
    }

    fn set_scale(&mut self, scale: Vec3) {
        self.actor.set_scale(scale);
        self.actor.update();
    }

    fn end_frame(&mut self) {
        if let Some(current) = self.motion.current.take() {
            self.motion.previous = Some(current);
        }
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        for texture in &self.textures {
            self.device.delete_texture(texture.texture);
        }
        for &buffer in &self.buffers {
            self.device.delete_buffer(buffer);
        }
        self.device.delete_vertex_array(self.vertex_array);
    }
}

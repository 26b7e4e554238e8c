//! Public rendering API
//!
//! The device trait and the plain-data types passed across it.

pub mod device;
pub mod types;

pub use device::{DeviceRef, GraphicsDevice};
pub use types::{
    AttachmentSlot, BufferId, BufferKind, FramebufferId, FramebufferStatus, Primitive,
    ProgramId, RenderbufferId, ShaderStage, TextureDesc, TextureFilter, TextureFormat,
    TextureId, TextureWrap, UniformLocation, UniformValue, VertexArrayId,
};

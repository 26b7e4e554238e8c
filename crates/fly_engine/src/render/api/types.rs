//! Handles and descriptors passed across the device boundary
//!
//! Handles are opaque newtypes over the backend's object names. They carry no
//! ownership; the component that created a handle is the one that deletes it.

use crate::foundation::math::{Mat3, Mat4};

/// Handle to a framebuffer object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub u32);

/// Handle to a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Handle to a renderbuffer (depth/stencil storage)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderbufferId(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Handle to a vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Handle to a vertex array object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// Location of a uniform inside a program
///
/// Queried once after linking and reused for the lifetime of the program.
/// A uniform the linker optimised away yields an inert location; uploads to it
/// are accepted and ignored, matching GL's behaviour for location -1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(Option<u32>);

impl UniformLocation {
    /// Location that swallows every upload
    pub const INERT: Self = Self(None);

    /// Wrap a raw location reported by the device
    pub const fn new(raw: u32) -> Self {
        Self(Some(raw))
    }

    /// Raw location, `None` when inert
    pub const fn raw(self) -> Option<u32> {
        self.0
    }

    /// Whether the program actually uses this uniform
    pub const fn is_active(self) -> bool {
        self.0.is_some()
    }
}

/// Color attachment index of a framebuffer (`COLOR_ATTACHMENT0 + n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttachmentSlot(pub u32);

/// Result of a framebuffer completeness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Ready to render into
    Complete,
    /// Not usable; carries the raw status code
    Incomplete(u32),
}

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Fragment shader
    Fragment,
}

impl ShaderStage {
    /// Lower-case stage name for diagnostics
    pub const fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Pixel layout of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    /// Three 8-bit channels
    Rgb8,
    /// Four 8-bit channels
    Rgba8,
    /// Two 16-bit float channels; holds negative values
    Rg16f,
}

impl TextureFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Rg16f => 4,
        }
    }

    /// Whether stored values keep their sign instead of clamping to `[0, 1]`
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::Rg16f)
    }
}

/// Minification filter; magnification is always linear
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFilter {
    /// Plain bilinear
    Linear,
    /// Trilinear through the mip chain
    LinearMipmapLinear,
}

/// Addressing mode on both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureWrap {
    /// Clamp samples to the border texels
    ClampToEdge,
    /// Tile the texture
    Repeat,
}

/// Everything needed to allocate a 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: TextureFormat,
    /// Minification filter
    pub min_filter: TextureFilter,
    /// Addressing mode
    pub wrap: TextureWrap,
    /// Generate a mip chain after upload
    pub mipmaps: bool,
}

impl TextureDesc {
    /// Color attachment for an offscreen render target
    pub const fn render_target(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: TextureFormat::Rgb8,
            min_filter: TextureFilter::Linear,
            wrap: TextureWrap::ClampToEdge,
            mipmaps: false,
        }
    }

    /// Tiled, mipmapped material texture
    pub const fn material(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            min_filter: TextureFilter::LinearMipmapLinear,
            wrap: TextureWrap::Repeat,
            mipmaps: true,
        }
    }

    /// Size in bytes of a tightly packed pixel upload
    pub const fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Vertex buffer binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Per-vertex attribute data
    Array,
    /// 32-bit triangle indices
    Element,
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    /// Independent triangles
    Triangles,
    /// Triangle strip
    TriangleStrip,
}

/// A value written to a uniform location
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `float[]`
    FloatArray(Vec<f32>),
    /// `vec3[]`, flattened
    Vec3Array(Vec<f32>),
    /// `mat3`
    Mat3(Mat3),
    /// `mat4`
    Mat4(Mat4),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inert_location() {
        assert!(!UniformLocation::INERT.is_active());
        assert_eq!(UniformLocation::new(3).raw(), Some(3));
    }

    #[test]
    fn test_render_target_desc_layout() {
        let desc = TextureDesc::render_target(640, 400);
        assert_eq!(desc.format, TextureFormat::Rgb8);
        assert_eq!(desc.wrap, TextureWrap::ClampToEdge);
        assert!(!desc.mipmaps);
        assert_eq!(desc.byte_len(), 640 * 400 * 3);
    }

    #[test]
    fn test_only_float_format_is_signed() {
        assert!(TextureFormat::Rg16f.is_signed());
        assert!(!TextureFormat::Rgb8.is_signed());
        assert!(!TextureFormat::Rgba8.is_signed());
        assert_eq!(TextureFormat::Rg16f.bytes_per_pixel(), 4);
    }
}

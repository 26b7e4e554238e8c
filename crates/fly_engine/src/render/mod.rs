//! # Rendering System
//!
//! Scene drawing and the post-processing pipeline.
//!
//! ## Architecture
//!
//! - **api**: the [`GraphicsDevice`] trait and the handle/descriptor types
//!   every component speaks. Nothing above this layer touches OpenGL.
//! - **backends**: [`GlDevice`] (glow) and [`RecordingDevice`] (headless,
//!   command-logging).
//! - **state**: fixed-function state changes as data, plus the reflection
//!   sequences.
//! - **target / quad / shader**: the pieces a composite pass is built from.
//! - **post**: [`CompositeEffect`] and its variants.
//! - **compositor**: per-frame effect selection and the reflection path.
//! - **primitives / lighting**: actors, camera, meshes and point lights.
//!
//! ## Frame contract
//!
//! Within a frame: update transforms, then `pre_process` of the active effect
//! (or bind the screen), then the scene draw, then the composite draw.

pub mod api;
pub mod backends;
pub mod state;
pub mod shader;
pub mod target;
pub mod quad;
pub mod post;
pub mod lighting;
pub mod primitives;
pub mod compositor;
pub mod loading;

#[cfg(test)]
mod compositor_tests;

pub use api::{DeviceRef, GraphicsDevice, TextureDesc, UniformLocation, UniformValue};
pub use backends::{GlDevice, RecordingDevice};
pub use compositor::{Compositor, DrawPass, Drawable, FrameContext, ReflectionSetup};
pub use lighting::{LightingBuffer, PointLight, MAX_LIGHTS};
pub use post::{CompositeEffect, EffectKind, EffectMode};
pub use primitives::{Actor, Camera, Mesh};
pub use shader::ShaderProgram;
pub use state::{ClearFlags, StateChange};
pub use target::RenderTarget;

use thiserror::Error;

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

/// High-level rendering error types
///
/// The first five variants are fatal by policy: the application reports the
/// driver diagnostic and exits. There is no retry path.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Renderer initialization failed during setup
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A GPU object could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A shader source file could not be read
    #[error("Failed to read shader source {path}: {source}")]
    ShaderSourceRead {
        /// Path that was requested
        path: String,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The driver rejected a shader stage
    #[error("{stage} shader failed to compile:\n{log}")]
    ShaderCompilation {
        /// Stage name ("vertex" or "fragment")
        stage: &'static str,
        /// Compiler output from the driver
        log: String,
    },

    /// The driver could not link the program
    #[error("Shader program failed to link:\n{log}")]
    ShaderLink {
        /// Linker output from the driver
        log: String,
    },

    /// The offscreen framebuffer is not complete
    #[error("Framebuffer incomplete (status 0x{status:04X})")]
    IncompleteFramebuffer {
        /// Raw status code reported by the device
        status: u32,
    },

    /// The reflection setup does not fit the drawables it was given
    #[error("Invalid reflection setup: {0}")]
    InvalidReflection(String),

    /// Asset loading failed while building GPU resources
    #[error(transparent)]
    Asset(#[from] crate::assets::AssetError),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    BackendError(String),
}

//! OpenGL backend
//!
//! [`GlWindow`] owns the GLFW window and its GL context; [`GlDevice`]
//! implements [`GraphicsDevice`](crate::render::api::GraphicsDevice) on top of
//! the `glow` bindings loaded from that context.

mod device;
mod window;

pub use device::GlDevice;
pub use window::{GlWindow, WindowError, WindowResult};

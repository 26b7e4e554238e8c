//! Backend implementations for the render module
//!
//! - [`opengl`]: the real backend, OpenGL 3.3 core through `glow`
//! - [`recording`]: a headless device that logs every command

/// OpenGL rendering backend implementation
pub mod opengl;

/// Headless command-recording backend
pub mod recording;

pub use opengl::{GlDevice, GlWindow, WindowError};
pub use recording::{DeviceCommand, RecordingDevice};

//! # Fly Engine
//!
//! A small OpenGL 3.3 renderer built around a composable post-processing
//! pipeline.
//!
//! ## Features
//!
//! - **Composite effects**: motion blur, blur and a time-driven swirl, each an
//!   offscreen target plus a full-screen composite pass
//! - **Planar reflection**: stencil-masked mirrored draw of one object in a
//!   reflective surface
//! - **Normal-mapped meshes**: OBJ loading with tangent generation and vertex
//!   deduplication
//! - **Headless testing**: every GPU call goes through
//!   [`GraphicsDevice`](render::GraphicsDevice), so the whole frame can run
//!   against a recording device
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fly_engine::prelude::*;
//! use std::rc::Rc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ViewConfig::load_or_default("flyview.toml")?;
//!     let mut window = GlWindow::new(&config.window.title, config.window.width, config.window.height, true)?;
//!     let device: DeviceRef = Rc::new(window.create_device());
//!     let (width, height) = window.framebuffer_size();
//!
//!     let mut view = View::new(&device, &config, width, height)?;
//!     let mut timer = Timer::new();
//!     while !window.should_close() {
//!         window.poll_events();
//!         view.update(timer.tick(), &FrameInput::idle());
//!         view.draw()?;
//!         window.swap_buffers();
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod render;
pub mod scene;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{ImageData, MeshData},
        config::{Config, ConfigError, EffectsConfig, ViewConfig},
        foundation::{
            math::{Mat4, Vec3},
            time::Timer,
        },
        render::{
            backends::{GlDevice, GlWindow},
            api::DeviceRef,
            loading::LoadingScreen,
            Compositor, EffectMode, Mesh, RenderError, RenderResult,
        },
        scene::{FrameInput, View},
    };
}

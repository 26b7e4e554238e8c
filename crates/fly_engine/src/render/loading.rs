//! Start-up splash
//!
//! Shown once, before the scene assets are loaded: one textured full-screen
//! quad on the default framebuffer. Everything is released when the
//! [`LoadingScreen`] is dropped.

use std::path::Path;

use crate::assets::ImageData;
use crate::render::api::{DeviceRef, TextureDesc, TextureId, UniformLocation, UniformValue};
use crate::render::post::COLOR_SAMPLER;
use crate::render::quad::FullScreenQuad;
use crate::render::shader::{ShaderProgram, ShaderSources};
use crate::render::state::ClearFlags;
use crate::render::RenderResult;

/// Loading image plus the program that shows it
pub struct LoadingScreen {
    device: DeviceRef,
    shader: ShaderProgram,
    quad: FullScreenQuad,
    texture: TextureId,
    sampler: UniformLocation,
}

impl LoadingScreen {
    /// Compile the loading program and upload `image`
    pub fn new(device: &DeviceRef, sources: &ShaderSources, image: &ImageData) -> RenderResult<Self> {
        let shader = sources.compile_and_link(device)?;
        let quad = FullScreenQuad::new(device, &shader)?;
        let texture = device.create_texture(&TextureDesc::render_target(image.width, image.height), Some(&image.data))?;
        let sampler = shader.uniform(COLOR_SAMPLER);
        Ok(Self { device: DeviceRef::clone(device), shader, quad, texture, sampler })
    }

    /// Load the program and image from disk
    pub fn from_files(
        device: &DeviceRef,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        image_path: impl AsRef<Path>,
    ) -> RenderResult<Self> {
        let mut sources = ShaderSources::new();
        sources.load_vertex_source(vertex_path)?.load_fragment_source(fragment_path)?;
        let image = ImageData::from_file(image_path)?;
        Self::new(device, &sources, &image)
    }

    /// Clear the screen and draw the loading image over it
    pub fn draw(&self) {
        self.device.bind_framebuffer(None);
        self.device.clear(ClearFlags::COLOR | ClearFlags::DEPTH);
        self.shader.use_program();
        self.device.bind_texture(0, self.texture);
        self.device.set_uniform(self.sampler, UniformValue::Int(0));
        self.quad.draw();
    }
}

impl Drop for LoadingScreen {
    fn drop(&mut self) {
        self.device.delete_texture(self.texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::{DeviceCommand, RecordingDevice};
    use std::rc::Rc;

    #[test]
    fn test_draws_once_to_screen_and_cleans_up() {
        let recorder = Rc::new(RecordingDevice::new());
        let device: DeviceRef = recorder.clone();
        {
            let screen = LoadingScreen::new(
                &device,
                &ShaderSources::from_strings("v", "f"),
                &ImageData::solid_color(4, 4, [255, 255, 255]),
            )
            .unwrap();
            recorder.clear_commands();
            screen.draw();

            assert_eq!(recorder.commands()[0], DeviceCommand::BindFramebuffer(None));
            assert_eq!(recorder.count(|c| matches!(c, DeviceCommand::DrawArrays { .. })), 1);
            assert!(recorder.texture_on_unit(0).is_some());
        }
        assert_eq!(recorder.live_objects(), 0);
    }
}

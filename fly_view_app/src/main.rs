//! Fly View demo application
//!
//! Opens a window, shows the loading splash, then flies a camera around the
//! bat scene. Keys:
//!
//! - `I`/`K`, `J`/`L`: pitch and yaw the camera
//! - `W`/`S`, `A`/`D`, `F`/`R`: move the camera
//! - Left/Right: turn the bat
//! - Up/Down: brighten or dim the white light, Space toggles it
//! - `0`-`4`: none, motion blur, reflection, blur, dizzy
//!
//! Any start-up or rendering failure is logged and ends the process with
//! status 1.

use std::path::PathBuf;
use std::rc::Rc;

use fly_engine::config::{Config, ConfigError, ViewConfig};
use fly_engine::foundation::logging;
use fly_engine::foundation::math::Vec3;
use fly_engine::foundation::time::Timer;
use fly_engine::render::api::DeviceRef;
use fly_engine::render::backends::{GlWindow, WindowError};
use fly_engine::render::loading::LoadingScreen;
use fly_engine::render::{EffectMode, RenderError};
use fly_engine::scene::{FrameInput, View};
use glfw::{Action, Key, WindowEvent};
use thiserror::Error;

const DEFAULT_CONFIG: &str = "flyview.toml";
const LIGHT_STEP: f32 = 100.0;
const FPS_LOG_INTERVAL: u64 = 600;

/// Anything that ends the application early
#[derive(Error, Debug)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Invalid arguments: {0}")]
    Arguments(String),
}

struct FlyViewApp {
    window: GlWindow,
    view: View,
    timer: Timer,
}

impl FlyViewApp {
    fn new(config: &ViewConfig) -> Result<Self, AppError> {
        let window_config = &config.window;
        let mut window = GlWindow::new(&window_config.title, window_config.width, window_config.height, window_config.vsync)?;

        let gl_device = window.create_device();
        log::info!("OpenGL device: {}", gl_device.driver_info());
        let device: DeviceRef = Rc::new(gl_device);
        let (width, height) = window.framebuffer_size();
        device.set_viewport(0, 0, width, height);

        Self::show_loading(&device, config)?;
        window.swap_buffers();

        let view = View::new(&device, config, width, height)?;
        log::info!("Scene ready");
        Ok(Self { window, view, timer: Timer::new() })
    }

    fn show_loading(device: &DeviceRef, config: &ViewConfig) -> Result<(), AppError> {
        let shaders = config.scene.loading_shaders.relative_to(&config.assets_dir);
        let loading = LoadingScreen::from_files(
            device,
            &shaders.vertex,
            &shaders.fragment,
            config.asset_path(&config.scene.loading_image),
        )?;
        loading.draw();
        Ok(())
    }

    fn run(&mut self) -> Result<(), AppError> {
        while !self.window.should_close() {
            let delta_time = self.timer.tick();
            let mut input = self.process_events();
            self.read_held_keys(&mut input);

            self.view.update(delta_time, &input);
            self.view.draw()?;
            self.window.swap_buffers();

            if self.timer.frame_count() % FPS_LOG_INTERVAL == 0 {
                log::debug!("Average FPS: {:.1}", self.timer.average_fps());
            }
        }
        log::info!("Window closed after {} frames", self.timer.frame_count());
        Ok(())
    }

    /// Handle discrete events: presses, resizes and close requests
    fn process_events(&mut self) -> FrameInput {
        let mut input = FrameInput::idle();
        for event in self.window.poll_events() {
            match event {
                WindowEvent::Key(Key::Escape, _, Action::Press, _) => {
                    self.window.set_should_close(true);
                }
                WindowEvent::Key(Key::Space, _, Action::Press, _) => {
                    input.toggle_light = true;
                }
                WindowEvent::Key(key, _, Action::Press, _) => {
                    if let Some(mode) = effect_for_key(key) {
                        input.effect = Some(mode);
                    }
                }
                WindowEvent::FramebufferSize(width, height) => {
                    let width = u32::try_from(width).unwrap_or(0);
                    let height = u32::try_from(height).unwrap_or(0);
                    log::debug!("Framebuffer resized to {width}x{height}");
                    self.view.resize(width, height);
                }
                WindowEvent::Close => self.window.set_should_close(true),
                _ => {}
            }
        }
        input
    }

    /// Continuous controls, sampled once per frame
    fn read_held_keys(&self, input: &mut FrameInput) {
        let axis = |negative: Key, positive: Key| {
            f32::from(u8::from(self.window.is_key_down(positive))) - f32::from(u8::from(self.window.is_key_down(negative)))
        };

        input.camera_rotation = Vec3::new(axis(Key::I, Key::K), axis(Key::J, Key::L), 0.0);
        input.camera_movement = Vec3::new(axis(Key::D, Key::A), axis(Key::R, Key::F), axis(Key::S, Key::W));
        input.object_rotation = axis(Key::Left, Key::Right);
        input.light_intensity_delta = axis(Key::Down, Key::Up) * LIGHT_STEP;
    }
}

fn effect_for_key(key: Key) -> Option<EffectMode> {
    let digit = match key {
        Key::Num0 | Key::Kp0 => 0,
        Key::Num1 | Key::Kp1 => 1,
        Key::Num2 | Key::Kp2 => 2,
        Key::Num3 | Key::Kp3 => 3,
        Key::Num4 | Key::Kp4 => 4,
        _ => return None,
    };
    EffectMode::from_digit(digit)
}

fn config_path() -> Result<PathBuf, AppError> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(PathBuf::from(DEFAULT_CONFIG)),
        (Some("--config"), Some(path)) => Ok(PathBuf::from(path)),
        (Some(other), _) => Err(AppError::Arguments(format!("expected `--config <path>`, got `{other}`"))),
    }
}

fn load_config() -> Result<ViewConfig, AppError> {
    let config = ViewConfig::load_or_default(config_path()?)?;
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), AppError> {
    let config = load_config().map_err(|e| {
        logging::init_with_level("info");
        e
    })?;
    logging::init_with_level(&config.log_level);
    log::info!("Starting Fly View");

    let mut app = FlyViewApp::new(&config)?;
    app.run()
}

fn main() {
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_select_effects() {
        assert_eq!(effect_for_key(Key::Num0), Some(EffectMode::None));
        assert_eq!(effect_for_key(Key::Num1), Some(EffectMode::MotionBlur));
        assert_eq!(effect_for_key(Key::Kp2), Some(EffectMode::Reflection));
        assert_eq!(effect_for_key(Key::Num3), Some(EffectMode::Blur));
        assert_eq!(effect_for_key(Key::Num4), Some(EffectMode::Dizzy));
        assert_eq!(effect_for_key(Key::Num5), None);
        assert_eq!(effect_for_key(Key::Q), None);
    }
}

//! GLFW window with an OpenGL 3.3 core context
//!
//! Owns the GLFW instance, the window and its event receiver. The context is
//! made current on creation, so [`GlWindow::create_device`] can load the GL
//! entry points straight away.

use thiserror::Error;

use super::GlDevice;

/// Window management errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// GLFW could not be initialised
    #[error("GLFW initialization failed: {0}")]
    InitializationFailed(String),

    /// The window or its GL context could not be created
    #[error("Window creation failed")]
    CreationFailed,
}

/// Result type for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// GLFW window wrapper with a current OpenGL context
pub struct GlWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlWindow {
    /// Create a window with a depth24/stencil8 default framebuffer
    pub fn new(title: &str, width: u32, height: u32, vsync: bool) -> WindowResult<Self> {
        use glfw::Context;

        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| WindowError::InitializationFailed(format!("{e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(3, 3));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::DepthBits(Some(24)));
        glfw.window_hint(glfw::WindowHint::StencilBits(Some(8)));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)
            .ok_or(WindowError::CreationFailed)?;

        window.make_current();
        glfw.set_swap_interval(if vsync { glfw::SwapInterval::Sync(1) } else { glfw::SwapInterval::None });

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        log::info!("Created {width}x{height} window \"{title}\"");
        Ok(Self { glfw, window, events })
    }

    /// Load GL entry points from this window's context
    pub fn create_device(&mut self) -> GlDevice {
        let window = &mut self.window;
        // SAFETY: the context was made current in `new` and stays current on
        // this thread for the lifetime of the window.
        unsafe { GlDevice::from_loader(|symbol| window.get_proc_address(symbol) as *const _) }
    }

    /// Whether the user asked to close the window
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Request the window to close at the end of the frame
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the OS event queue and return the window events received
    pub fn poll_events(&mut self) -> Vec<glfw::WindowEvent> {
        self.glfw.poll_events();
        glfw::flush_messages(&self.events).map(|(_, event)| event).collect()
    }

    /// Whether `key` is currently held down
    pub fn is_key_down(&self, key: glfw::Key) -> bool {
        matches!(self.window.get_key(key), glfw::Action::Press | glfw::Action::Repeat)
    }

    /// Framebuffer size in pixels
    pub fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    /// Present the back buffer
    pub fn swap_buffers(&mut self) {
        use glfw::Context;
        self.window.swap_buffers();
    }
}

//! GLFW implementation of [`WindowSystem`]
//!
//! Creates a windowed OpenGL context and resolves GL entry points through
//! `glfwGetProcAddress`.

use glfw::Context;

use crate::render::opengl::backend::GlBackend;
use crate::render::window::{ContextHint, ContextProfile, WindowSystem};

/// GLFW library handle
pub struct GlfwSystem {
    glfw: glfw::Glfw,
}

/// GLFW window plus its event receiver
pub struct GlfwWindow {
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
}

impl GlfwWindow {
    /// Window size in screen coordinates
    pub fn size(&self) -> (i32, i32) {
        self.window.get_size()
    }
}

fn log_glfw_error(error: glfw::Error, description: String) {
    log::error!("GLFW error {error:?}: {description}");
}

fn profile_hint(profile: ContextProfile) -> glfw::OpenGlProfileHint {
    match profile {
        ContextProfile::Core => glfw::OpenGlProfileHint::Core,
        ContextProfile::Compatibility => glfw::OpenGlProfileHint::Compat,
    }
}

impl WindowSystem for GlfwSystem {
    type Window = GlfwWindow;
    type Gpu = GlBackend;

    fn init() -> Result<Self, String> {
        let glfw = glfw::init(log_glfw_error).map_err(|e| format!("{e:?}"))?;
        Ok(Self { glfw })
    }

    fn window_hint(&mut self, hint: ContextHint) {
        let hint = match hint {
            ContextHint::ContextVersion(major, minor) => glfw::WindowHint::ContextVersion(major, minor),
            ContextHint::Profile(profile) => glfw::WindowHint::OpenGlProfile(profile_hint(profile)),
            ContextHint::ForwardCompatible(enabled) => glfw::WindowHint::OpenGlForwardCompat(enabled),
            ContextHint::Visible(visible) => glfw::WindowHint::Visible(visible),
        };
        log::trace!("Window hint: {hint:?}");
        self.glfw.window_hint(hint);
    }

    fn create_window(&mut self, width: u32, height: u32, title: &str) -> Option<GlfwWindow> {
        let (mut window, events) = self
            .glfw
            .create_window(width, height, title, glfw::WindowMode::Windowed)?;

        window.set_close_polling(true);
        window.set_framebuffer_size_polling(true);

        Some(GlfwWindow { window, events })
    }

    fn make_context_current(&mut self, window: &mut GlfwWindow) {
        window.window.make_current();
    }

    #[allow(unsafe_code)]
    fn load_extensions(&mut self, window: &mut GlfwWindow) -> Result<GlBackend, String> {
        // SAFETY: `make_context_current` ran on this window first, and GLFW
        // resolves symbols for the context that is current
        unsafe { GlBackend::load(|symbol| window.window.get_proc_address(symbol) as *const _) }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        let interval = match interval {
            0 => glfw::SwapInterval::None,
            frames => glfw::SwapInterval::Sync(frames),
        };
        self.glfw.set_swap_interval(interval);
    }

    fn framebuffer_size(&self, window: &GlfwWindow) -> (i32, i32) {
        window.window.get_framebuffer_size()
    }

    fn poll_events(&mut self, window: &mut GlfwWindow) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&window.events) {
            log::trace!("Window event: {event:?}");
        }
    }

    fn window_should_close(&self, window: &GlfwWindow) -> bool {
        window.window.should_close()
    }

    fn set_window_should_close(&mut self, window: &mut GlfwWindow, value: bool) {
        window.window.set_should_close(value);
    }

    fn swap_buffers(&mut self, window: &mut GlfwWindow) {
        window.window.swap_buffers();
    }

    fn destroy_window(&mut self, window: GlfwWindow) {
        // PWindow destroys the native window on drop
        drop(window);
    }

    fn terminate(self) {
        // glfwTerminate runs when the last Glfw handle drops
        drop(self.glfw);
    }
}

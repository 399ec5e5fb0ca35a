//! OpenGL and GLFW backends
//!
//! - **`backend`**: [`GlBackend`], the raw OpenGL 3.3 core [`GpuBackend`](crate::render::GpuBackend)
//! - **`window`**: [`GlfwSystem`], the GLFW [`WindowSystem`](crate::render::WindowSystem)

pub mod backend;
pub mod window;

pub use backend::GlBackend;
pub use window::{GlfwSystem, GlfwWindow};

/// Graphics context driven by GLFW
pub type GlfwContext = crate::render::window::GraphicsContext<GlfwSystem>;

/// Session issuing raw OpenGL commands
pub type GlSession = crate::render::session::GraphicsSession<GlBackend>;

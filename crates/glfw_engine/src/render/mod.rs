//! # Rendering System
//!
//! Bootstraps a GLFW window with an OpenGL 3.3 core context and draws geometry
//! through a linked shader program.
//!
//! ## Architecture
//!
//! - **`window`**: [`GraphicsContext`] lifecycle over a [`WindowSystem`]
//! - **`session`**: [`GraphicsSession`], the explicit holder of the context's
//!   binding state (active program, bound vertex array and buffer)
//! - **`shader`**: compile, link, validate and use shader programs
//! - **`geometry`**: vertex buffers, vertex arrays and their attribute layout
//! - **`vertex_layout`**: attribute descriptions and the bind-time check
//!   against a program's reflected inputs
//! - **`render_loop`**: the per-frame poll, clear, draw, present cycle
//! - **`opengl`**: the raw OpenGL [`GpuBackend`] and the GLFW [`WindowSystem`]
//!
//! Every GPU object is owned by a wrapper that deletes it on drop, and every
//! GPU call goes through a [`GraphicsSession`] passed in explicitly.

pub mod backend;
pub mod geometry;
pub mod opengl;
pub mod primitives;
pub mod render_loop;
pub mod session;
pub mod shader;
pub mod vertex_layout;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::{
    ActiveAttribute, BufferId, BufferUsage, ClearColor, GpuBackend, Primitive, ProgramId, ShaderId,
    VertexArrayId, Viewport,
};
pub use geometry::{GeometryBuffer, GeometryError, GeometryResult, VertexBuffer};
pub use opengl::{GlBackend, GlSession, GlfwContext, GlfwSystem};
pub use render_loop::{Drawable, FrameStats, RenderError, RenderLoop};
pub use session::{GraphicsSession, SessionHandle};
pub use shader::{CompiledShader, ShaderError, ShaderProgram, ShaderResult, ShaderSource, ShaderStage};
pub use vertex_layout::{ComponentType, LayoutError, ShaderInput, ShaderInputLayout, VertexAttribute};
pub use window::{ContextError, ContextHint, ContextProfile, ContextResult, GraphicsContext, WindowSystem};

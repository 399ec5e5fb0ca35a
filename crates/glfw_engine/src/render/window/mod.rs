//! Window management subsystem
//!
//! - **`backend`**: the [`WindowSystem`] trait a windowing library must implement
//! - **`context`**: [`GraphicsContext`], which drives a `WindowSystem` through
//!   initialization, the frame loop primitives and teardown
//!
//! The GLFW implementation lives in `../opengl/window.rs`.

pub mod backend;
pub mod context;

pub use backend::{ContextHint, ContextProfile, WindowSystem};
pub use context::{ContextError, ContextResult, GraphicsContext};

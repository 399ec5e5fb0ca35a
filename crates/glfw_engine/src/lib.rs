//! # GLFW Engine
//!
//! A minimal OpenGL rendering bootstrap: open a GLFW window with a 3.3 core
//! context, compile and link a shader program, upload vertex data and draw it
//! every frame until the window closes.
//!
//! ## Features
//!
//! - **Ordered Context Setup**: hints, window, current context, entry points, viewport
//! - **Checked Shaders**: compile and link failures carry the driver's log
//! - **Layout Checking**: vertex attributes are matched against the program's
//!   inputs before drawing
//! - **RAII Teardown**: every window and GPU object releases itself on drop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use glfw_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::default();
//!     let (mut context, mut session) = GlfwContext::initialize(&config.window)?;
//!
//!     let program = ShaderProgram::from_sources(&session, &triangle_sources(), true)?;
//!     let mut geometry = GeometryBuffer::new(&session)?;
//!     geometry.upload(&mut session, &TRIANGLE_VERTICES, BufferUsage::Static)?;
//!     geometry.describe_layout(&mut session, triangle_layout())?;
//!     geometry.unbind(&mut session);
//!
//!     RenderLoop::from_config(&config.render).run(
//!         &mut context,
//!         &mut session,
//!         Some(Drawable::new(&program, &geometry)),
//!     )?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::{AppConfig, Config, ConfigError, LoggingConfig, RenderConfig, WindowConfig},
        foundation::logging,
        render::{
            primitives::{triangle_layout, triangle_sources, TRIANGLE_VERTICES},
            BufferUsage, ClearColor, ContextError, Drawable, FrameStats, GeometryBuffer, GeometryError,
            GlfwContext, GraphicsContext, GraphicsSession, LayoutError, RenderError, RenderLoop,
            ShaderError, ShaderProgram, ShaderSource, ShaderStage, VertexAttribute,
        },
    };
}

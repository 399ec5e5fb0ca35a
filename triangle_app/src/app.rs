//! Triangle demo application
//!
//! Opens the window, builds the triangle program and geometry, and runs the
//! frame loop until the window is closed.

use glfw_engine::prelude::*;
use glfw_engine::render::{GlBackend, GlSession};
use thiserror::Error;

/// Errors that end the application with a non-zero exit code
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Context error: {0}")]
    Context(#[from] ContextError),

    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

impl From<LayoutError> for AppError {
    fn from(error: LayoutError) -> Self {
        Self::Render(error.into())
    }
}

pub struct TriangleApp {
    config: AppConfig,
}

impl TriangleApp {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Run until the window closes
    ///
    /// A shader program that fails to build is logged and the loop keeps
    /// clearing the window without drawing. Context, geometry and layout
    /// errors are returned.
    pub fn run(&self) -> Result<FrameStats, AppError> {
        log::info!("Starting triangle demo...");

        // Declared first so every GPU resource below is dropped before it
        let (mut context, mut session) = GlfwContext::initialize(&self.config.window)?;

        let program = self.build_program(&session);
        let geometry = Self::build_geometry(&mut session)?;

        if let Some(program) = &program {
            self.check_program(&mut session, program, &geometry)?;
        }

        let drawable = program.as_ref().map(|program| Drawable::new(program, &geometry));
        let stats = RenderLoop::from_config(&self.config.render).run(&mut context, &mut session, drawable)?;

        log::info!("Triangle demo completed");
        Ok(stats)
    }

    fn build_program(&self, session: &GlSession) -> Option<ShaderProgram<GlBackend>> {
        let release = self.config.render.release_shaders_after_link;
        match ShaderProgram::from_sources(session, &triangle_sources(), release) {
            Ok(program) => Some(program),
            Err(e) => {
                log::error!("Shader program unavailable, frames will only be cleared: {e}");
                None
            }
        }
    }

    fn build_geometry(session: &mut GlSession) -> Result<GeometryBuffer<GlBackend>, GeometryError> {
        let mut geometry = GeometryBuffer::new(session)?;
        geometry.upload(session, &TRIANGLE_VERTICES, BufferUsage::Static)?;
        geometry.describe_layout(session, triangle_layout())?;
        geometry.unbind(session);
        Ok(geometry)
    }

    /// Check the layout once up front, and validate with the geometry bound
    fn check_program(
        &self,
        session: &mut GlSession,
        program: &ShaderProgram<GlBackend>,
        geometry: &GeometryBuffer<GlBackend>,
    ) -> Result<(), LayoutError> {
        program.use_program(session);
        let bound = geometry.bind(session, program);

        if bound.is_ok() && self.config.render.validate_program {
            // Failure is already logged as a warning and is not fatal
            let _ = program.validate(session);
        }

        geometry.unbind(session);
        program.unuse(session);
        bound
    }
}

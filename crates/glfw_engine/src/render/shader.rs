//! Shader management and compilation
//!
//! GLSL source is compiled into [`CompiledShader`] objects, which are linked
//! into a [`ShaderProgram`]. Both wrappers follow RAII: dropping them deletes
//! the GPU object. Compile, link and validate failures are logged where they are
//! detected and returned as [`ShaderError`]; none of them abort the process.
//!
//! A `ShaderProgram` value only exists once linking has succeeded, so a program
//! whose link failed can never be made active.

use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::render::backend::{GpuBackend, ProgramId, ShaderId};
use crate::render::session::{GraphicsSession, SessionHandle};
use crate::render::vertex_layout::{ShaderInput, ShaderInputLayout};

/// Maximum number of bytes read from a shader or program info log
pub const INFO_LOG_CAPACITY: usize = 1024;

const EMPTY_LOG: &str = "<driver returned no diagnostic output>";

/// Programmable pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Per-vertex stage
    Vertex,
    /// Per-fragment stage
    Fragment,
}

impl ShaderStage {
    /// Stages a program must contain before it is linked
    pub const REQUIRED: [Self; 2] = [Self::Vertex, Self::Fragment];
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Shader errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The driver could not allocate a shader or program object
    #[error("Failed to create {what}: {reason}")]
    ObjectCreation { what: &'static str, reason: String },

    /// Compilation failed; `log` holds the driver diagnostics
    #[error("Failed to compile {stage} shader:\n{log}")]
    Compile { stage: ShaderStage, log: String },

    /// Linking failed; `log` holds the program info log
    #[error("Failed to link program:\n{log}")]
    Link { log: String },

    /// Validation against the current state failed
    #[error("Program validation failed:\n{log}")]
    Validate { log: String },

    /// A required stage was not supplied to the link
    #[error("Program has no {0} shader")]
    MissingStage(ShaderStage),

    /// The graphics context has shut down
    #[error("Graphics context has shut down")]
    ContextLost,
}

/// Result type for shader operations
pub type ShaderResult<T> = Result<T, ShaderError>;

fn non_empty(log: String) -> String {
    if log.trim().is_empty() {
        EMPTY_LOG.to_string()
    } else {
        log
    }
}

/// Shader source text for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    stage: ShaderStage,
    source: Cow<'static, str>,
}

impl ShaderSource {
    /// Create a source for `stage`
    pub fn new(stage: ShaderStage, source: impl Into<Cow<'static, str>>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// Vertex stage source
    pub fn vertex(source: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Vertex, source)
    }

    /// Fragment stage source
    pub fn fragment(source: impl Into<Cow<'static, str>>) -> Self {
        Self::new(ShaderStage::Fragment, source)
    }

    /// Stage this source targets
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// GLSL text
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Successfully compiled shader object with RAII cleanup
pub struct CompiledShader<B: GpuBackend> {
    session: SessionHandle<B>,
    id: ShaderId,
    stage: ShaderStage,
}

impl<B: GpuBackend> CompiledShader<B> {
    /// Compile `source` into a new shader object
    ///
    /// On failure the shader object is deleted and the (bounded) compile log is
    /// returned in [`ShaderError::Compile`].
    pub fn compile(session: &GraphicsSession<B>, source: &ShaderSource) -> ShaderResult<Self> {
        let gpu = session.gpu().ok_or(ShaderError::ContextLost)?;
        let stage = source.stage();

        let id = gpu.create_shader(stage).map_err(|reason| ShaderError::ObjectCreation {
            what: "shader object",
            reason,
        })?;
        let shader = Self {
            session: session.handle(),
            id,
            stage,
        };

        gpu.shader_source(id, source.source());
        gpu.compile_shader(id);

        if !gpu.shader_compile_status(id) {
            let log = non_empty(gpu.shader_info_log(id, INFO_LOG_CAPACITY));
            log::error!("Error compiling the {stage} shader:\n{log}");
            return Err(ShaderError::Compile { stage, log });
        }

        log::debug!("Compiled {stage} shader {}", id.0);
        Ok(shader)
    }

    /// Shader object name
    pub fn id(&self) -> ShaderId {
        self.id
    }

    /// Stage this shader was compiled for
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl<B: GpuBackend> Drop for CompiledShader<B> {
    fn drop(&mut self) {
        self.session.delete_shader(self.id);
    }
}

/// Linked shader program with RAII cleanup
pub struct ShaderProgram<B: GpuBackend> {
    session: SessionHandle<B>,
    id: ProgramId,
    inputs: ShaderInputLayout,
}

impl<B: GpuBackend> ShaderProgram<B> {
    /// Link `shaders` into a program, detaching them afterwards
    pub fn link(session: &GraphicsSession<B>, shaders: &[&CompiledShader<B>]) -> ShaderResult<Self> {
        Self::link_with(session, shaders, true)
    }

    /// Link `shaders` into a program
    ///
    /// Fails with [`ShaderError::MissingStage`] before touching the GPU when the
    /// set lacks a vertex or fragment shader. When `release_shaders` is set the
    /// shaders are detached after a successful link so that dropping them frees
    /// their objects immediately.
    pub fn link_with(
        session: &GraphicsSession<B>,
        shaders: &[&CompiledShader<B>],
        release_shaders: bool,
    ) -> ShaderResult<Self> {
        if let Some(missing) = ShaderStage::REQUIRED
            .into_iter()
            .find(|stage| !shaders.iter().any(|shader| shader.stage() == *stage))
        {
            log::error!("Refusing to link a program without a {missing} shader");
            return Err(ShaderError::MissingStage(missing));
        }

        let gpu = session.gpu().ok_or(ShaderError::ContextLost)?;
        let id = gpu.create_program().map_err(|reason| ShaderError::ObjectCreation {
            what: "program object",
            reason,
        })?;
        let mut program = Self {
            session: session.handle(),
            id,
            inputs: ShaderInputLayout::default(),
        };

        for shader in shaders {
            gpu.attach_shader(id, shader.id());
        }

        log::trace!("Linking program {}", id.0);
        gpu.link_program(id);

        if !gpu.program_link_status(id) {
            let log = non_empty(gpu.program_info_log(id, INFO_LOG_CAPACITY));
            log::error!("Error linking program:\n{log}");
            return Err(ShaderError::Link { log });
        }

        program.inputs = ShaderInputLayout::new(gpu.active_attributes(id).into_iter().map(ShaderInput::from));

        if release_shaders {
            for shader in shaders {
                gpu.detach_shader(id, shader.id());
            }
        }

        log::info!(
            "Linked program {} from {} shaders ({} vertex inputs)",
            id.0,
            shaders.len(),
            program.inputs.inputs().len()
        );
        Ok(program)
    }

    /// Compile every source and link the results
    ///
    /// All sources are compiled before the first error is returned, so every
    /// broken stage gets its diagnostics logged.
    pub fn from_sources(
        session: &GraphicsSession<B>,
        sources: &[ShaderSource],
        release_shaders: bool,
    ) -> ShaderResult<Self> {
        let compiled: Vec<ShaderResult<CompiledShader<B>>> = sources
            .iter()
            .map(|source| CompiledShader::compile(session, source))
            .collect();
        let compiled: Vec<CompiledShader<B>> = compiled.into_iter().collect::<ShaderResult<_>>()?;
        let shaders: Vec<&CompiledShader<B>> = compiled.iter().collect();

        Self::link_with(session, &shaders, release_shaders)
    }

    /// Check the program against the current GPU state
    ///
    /// A failure is logged as a warning and returned, but the program stays
    /// usable.
    pub fn validate(&self, session: &GraphicsSession<B>) -> ShaderResult<()> {
        let gpu = session.gpu().ok_or(ShaderError::ContextLost)?;
        gpu.validate_program(self.id);

        if gpu.program_validate_status(self.id) {
            log::debug!("Program {} validated", self.id.0);
            Ok(())
        } else {
            let log = non_empty(gpu.program_info_log(self.id, INFO_LOG_CAPACITY));
            log::warn!("Error validating program:\n{log}");
            Err(ShaderError::Validate { log })
        }
    }

    /// Make this the active program for subsequent draws
    pub fn use_program(&self, session: &mut GraphicsSession<B>) {
        session.bind_program(Some(self.id));
    }

    /// Clear the active program
    pub fn unuse(&self, session: &mut GraphicsSession<B>) {
        session.bind_program(None);
    }

    /// Whether this program is the active one
    pub fn is_active(&self, session: &GraphicsSession<B>) -> bool {
        session.active_program() == Some(self.id)
    }

    /// Program object name
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Vertex inputs reflected at link time
    pub fn input_layout(&self) -> &ShaderInputLayout {
        &self.inputs
    }
}

impl<B: GpuBackend> Drop for ShaderProgram<B> {
    fn drop(&mut self) {
        self.session.delete_program(self.id);
    }
}

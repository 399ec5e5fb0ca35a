//! Backend abstraction for GPU commands
//!
//! This module defines the trait that a GPU command backend must implement so the
//! shader, geometry and frame-loop code can run against real OpenGL or a test
//! double. Handles are plain newtypes over the driver's object names; ownership
//! lives in the resource wrappers (`CompiledShader`, `ShaderProgram`,
//! `VertexBuffer`, `GeometryBuffer`), which release their handle on drop.
//!
//! # Thread Safety
//! Implementations are expected to be `!Send`: every call must happen on the
//! thread that holds the current graphics context.

use crate::render::shader::ShaderStage;
use crate::render::vertex_layout::VertexAttribute;

/// Shader object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub u32);

/// Program object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(pub u32);

/// Buffer object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

/// Vertex array object name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayId(pub u32);

/// Expected usage pattern of a buffer's data store
///
/// The usage is an optimization hint for the driver, not a correctness
/// constraint. A `Static` buffer can still be re-uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferUsage {
    /// Written once, drawn many times
    #[default]
    Static,
    /// Rewritten occasionally, drawn many times
    Dynamic,
    /// Rewritten every frame
    Stream,
}

/// Primitive topology for draw calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Primitive {
    /// Independent triangles, three vertices each
    #[default]
    Triangles,
    /// Independent line segments
    Lines,
    /// Single points
    Points,
}

/// RGBA clear colour in normalized floats
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClearColor {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}

impl ClearColor {
    /// Create a clear colour from its channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for ClearColor {
    fn default() -> Self {
        Self::new(0.2, 0.4, 0.6, 0.8)
    }
}

/// Region of the framebuffer that rendering maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    /// Left edge in pixels
    pub x: i32,
    /// Bottom edge in pixels
    pub y: i32,
    /// Width in pixels
    pub width: i32,
    /// Height in pixels
    pub height: i32,
}

/// A vertex input reported by a linked program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAttribute {
    /// Input variable name as declared in the vertex shader
    pub name: String,
    /// Bound input location
    pub location: u32,
    /// Number of scalar components (1 for `float`, 3 for `vec3`, ...)
    pub components: u8,
}

/// GPU command interface
///
/// Mirrors the subset of the OpenGL 3.3 core API this engine needs. All
/// methods take `&self` because the driver owns the state; implementations
/// are cheap handles and are cloned into each resource wrapper so that
/// wrappers can release their objects on drop.
pub trait GpuBackend: Clone {
    /// Create an empty shader object for `stage`
    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String>;

    /// Replace the source text of a shader object
    fn shader_source(&self, shader: ShaderId, source: &str);

    /// Compile the shader object's current source
    fn compile_shader(&self, shader: ShaderId);

    /// Whether the last compilation succeeded
    fn shader_compile_status(&self, shader: ShaderId) -> bool;

    /// Read the shader info log, truncated to `capacity` bytes
    fn shader_info_log(&self, shader: ShaderId, capacity: usize) -> String;

    /// Delete a shader object
    fn delete_shader(&self, shader: ShaderId);

    /// Create an empty program object
    fn create_program(&self) -> Result<ProgramId, String>;

    /// Attach a shader object to a program
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);

    /// Detach a shader object from a program
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);

    /// Link the attached shaders into an executable
    fn link_program(&self, program: ProgramId);

    /// Whether the last link succeeded
    fn program_link_status(&self, program: ProgramId) -> bool;

    /// Check whether the program can execute given the current GPU state
    fn validate_program(&self, program: ProgramId);

    /// Whether the last validation succeeded
    fn program_validate_status(&self, program: ProgramId) -> bool;

    /// Read the program info log, truncated to `capacity` bytes
    fn program_info_log(&self, program: ProgramId, capacity: usize) -> String;

    /// Enumerate the program's active vertex inputs
    ///
    /// Built-in inputs such as `gl_VertexID` have no location and are skipped.
    fn active_attributes(&self, program: ProgramId) -> Vec<ActiveAttribute>;

    /// Make `program` the active program, or clear it with `None`
    fn use_program(&self, program: Option<ProgramId>);

    /// Delete a program object
    fn delete_program(&self, program: ProgramId);

    /// Create a buffer object
    fn create_buffer(&self) -> Result<BufferId, String>;

    /// Bind `buffer` to the array-buffer target, or clear it with `None`
    fn bind_array_buffer(&self, buffer: Option<BufferId>);

    /// Allocate and fill the data store of the bound array buffer
    fn buffer_data(&self, data: &[u8], usage: BufferUsage);

    /// Delete a buffer object
    fn delete_buffer(&self, buffer: BufferId);

    /// Create a vertex array object
    fn create_vertex_array(&self) -> Result<VertexArrayId, String>;

    /// Bind a vertex array object, or clear it with `None`
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);

    /// Record `attribute` in the bound vertex array, reading from the bound
    /// array buffer, and enable it
    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute);

    /// Delete a vertex array object
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);

    /// Set the viewport transform
    fn viewport(&self, viewport: Viewport);

    /// Set the colour used by [`GpuBackend::clear`]
    fn clear_color(&self, color: ClearColor);

    /// Clear the colour buffer
    fn clear(&self);

    /// Draw `count` vertices starting at `first` from the bound vertex array
    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32);

    /// Read one RGBA8 pixel from the framebuffer being drawn into
    fn read_pixel(&self, x: i32, y: i32) -> [u8; 4];
}

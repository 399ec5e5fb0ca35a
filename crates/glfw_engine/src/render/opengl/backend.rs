//! OpenGL 3.3 core implementation of [`GpuBackend`]
//!
//! Thin wrappers over the raw `gl` bindings. Every call requires the context
//! that loaded the entry points to be current on the calling thread, which is
//! why [`GlBackend`] is `!Send` and can only be obtained from
//! [`GlBackend::load`] after the context has been made current.

#![allow(unsafe_code)]

use std::ffi::{c_void, CStr};
use std::marker::PhantomData;

use gl::types::{GLchar, GLenum, GLint, GLsizei, GLsizeiptr, GLuint};

use crate::render::backend::{
    ActiveAttribute, BufferId, BufferUsage, ClearColor, GpuBackend, Primitive, ProgramId, ShaderId,
    VertexArrayId, Viewport,
};
use crate::render::shader::ShaderStage;
use crate::render::vertex_layout::{ComponentType, VertexAttribute};

/// Raw OpenGL command backend
#[derive(Debug, Clone)]
pub struct GlBackend {
    // Entry points are only valid on the context's thread
    _not_send: PhantomData<*const ()>,
}

impl GlBackend {
    /// Resolve entry points with `loader` and check the ones the engine uses
    ///
    /// Only the presence of each required entry point is checked, not that it
    /// is callable.
    ///
    /// ```compile_fail
    /// // Loading is only possible inside an unsafe block
    /// let backend = glfw_engine::render::GlBackend::load(|_| std::ptr::null());
    /// ```
    ///
    /// # Safety
    ///
    /// The GL context must be current on the calling thread and `loader` must
    /// return valid entry points for it (or null for missing ones). Every
    /// [`GpuBackend`] method of the returned value calls through them.
    pub unsafe fn load<F>(loader: F) -> Result<Self, String>
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(loader);

        let required = [
            ("glCreateShader", gl::CreateShader::is_loaded()),
            ("glShaderSource", gl::ShaderSource::is_loaded()),
            ("glCompileShader", gl::CompileShader::is_loaded()),
            ("glCreateProgram", gl::CreateProgram::is_loaded()),
            ("glLinkProgram", gl::LinkProgram::is_loaded()),
            ("glGetActiveAttrib", gl::GetActiveAttrib::is_loaded()),
            ("glGenBuffers", gl::GenBuffers::is_loaded()),
            ("glBufferData", gl::BufferData::is_loaded()),
            ("glGenVertexArrays", gl::GenVertexArrays::is_loaded()),
            ("glVertexAttribPointer", gl::VertexAttribPointer::is_loaded()),
            ("glDrawArrays", gl::DrawArrays::is_loaded()),
            ("glReadPixels", gl::ReadPixels::is_loaded()),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, loaded)| !loaded)
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(format!("missing entry points: {}", missing.join(", ")));
        }

        let backend = Self { _not_send: PhantomData };
        log::info!("OpenGL {} ({})", backend.string(gl::VERSION), backend.string(gl::RENDERER));
        Ok(backend)
    }

    fn string(&self, name: GLenum) -> String {
        let ptr = unsafe { gl::GetString(name) };
        if ptr.is_null() {
            return "unknown".to_string();
        }
        unsafe { CStr::from_ptr(ptr.cast()) }.to_string_lossy().into_owned()
    }
}

fn shader_kind(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn usage_hint(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::Static => gl::STATIC_DRAW,
        BufferUsage::Dynamic => gl::DYNAMIC_DRAW,
        BufferUsage::Stream => gl::STREAM_DRAW,
    }
}

fn primitive_mode(primitive: Primitive) -> GLenum {
    match primitive {
        Primitive::Triangles => gl::TRIANGLES,
        Primitive::Lines => gl::LINES,
        Primitive::Points => gl::POINTS,
    }
}

fn component_type(component_type: ComponentType) -> GLenum {
    match component_type {
        ComponentType::Float => gl::FLOAT,
    }
}

/// Scalar components per attribute type; matrices report one column
fn attribute_components(kind: GLenum) -> u8 {
    match kind {
        gl::FLOAT | gl::INT | gl::UNSIGNED_INT => 1,
        gl::FLOAT_VEC2 | gl::INT_VEC2 | gl::UNSIGNED_INT_VEC2 | gl::FLOAT_MAT2 => 2,
        gl::FLOAT_VEC3 | gl::INT_VEC3 | gl::UNSIGNED_INT_VEC3 | gl::FLOAT_MAT3 => 3,
        _ => 4,
    }
}

/// Read an info log through a buffer of `capacity` bytes
fn read_log(capacity: usize, fetch: impl FnOnce(GLsizei, &mut GLsizei, *mut GLchar)) -> String {
    let mut buffer = vec![0_u8; capacity.max(1)];
    let mut written: GLsizei = 0;
    fetch(
        GLsizei::try_from(buffer.len()).unwrap_or(GLsizei::MAX),
        &mut written,
        buffer.as_mut_ptr().cast(),
    );
    buffer.truncate(usize::try_from(written).unwrap_or(0).min(capacity));
    String::from_utf8_lossy(&buffer).trim_end().to_string()
}

fn name_or(id: Option<u32>) -> GLuint {
    id.unwrap_or(0)
}

impl GpuBackend for GlBackend {
    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String> {
        match unsafe { gl::CreateShader(shader_kind(stage)) } {
            0 => Err(format!("glCreateShader returned 0 for a {stage} shader")),
            id => Ok(ShaderId(id)),
        }
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        let ptr: *const GLchar = source.as_ptr().cast();
        let len = GLint::try_from(source.len()).unwrap_or(GLint::MAX);
        unsafe { gl::ShaderSource(shader.0, 1, &ptr, &len) };
    }

    fn compile_shader(&self, shader: ShaderId) {
        unsafe { gl::CompileShader(shader.0) };
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetShaderiv(shader.0, gl::COMPILE_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn shader_info_log(&self, shader: ShaderId, capacity: usize) -> String {
        read_log(capacity, |size, written, buffer| unsafe {
            gl::GetShaderInfoLog(shader.0, size, written, buffer);
        })
    }

    fn delete_shader(&self, shader: ShaderId) {
        unsafe { gl::DeleteShader(shader.0) };
    }

    fn create_program(&self) -> Result<ProgramId, String> {
        match unsafe { gl::CreateProgram() } {
            0 => Err("glCreateProgram returned 0".to_string()),
            id => Ok(ProgramId(id)),
        }
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::AttachShader(program.0, shader.0) };
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        unsafe { gl::DetachShader(program.0, shader.0) };
    }

    fn link_program(&self, program: ProgramId) {
        unsafe { gl::LinkProgram(program.0) };
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetProgramiv(program.0, gl::LINK_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn validate_program(&self, program: ProgramId) {
        unsafe { gl::ValidateProgram(program.0) };
    }

    fn program_validate_status(&self, program: ProgramId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetProgramiv(program.0, gl::VALIDATE_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn program_info_log(&self, program: ProgramId, capacity: usize) -> String {
        read_log(capacity, |size, written, buffer| unsafe {
            gl::GetProgramInfoLog(program.0, size, written, buffer);
        })
    }

    fn active_attributes(&self, program: ProgramId) -> Vec<ActiveAttribute> {
        let mut count: GLint = 0;
        let mut max_length: GLint = 0;
        unsafe {
            gl::GetProgramiv(program.0, gl::ACTIVE_ATTRIBUTES, &mut count);
            gl::GetProgramiv(program.0, gl::ACTIVE_ATTRIBUTE_MAX_LENGTH, &mut max_length);
        }

        let capacity = usize::try_from(max_length).unwrap_or(0).max(1);
        let mut attributes = Vec::new();
        for index in 0..GLuint::try_from(count).unwrap_or(0) {
            let mut name = vec![0_u8; capacity];
            let mut written: GLsizei = 0;
            let mut size: GLint = 0;
            let mut kind: GLenum = 0;
            let location = unsafe {
                gl::GetActiveAttrib(
                    program.0,
                    index,
                    max_length,
                    &mut written,
                    &mut size,
                    &mut kind,
                    name.as_mut_ptr().cast(),
                );
                gl::GetAttribLocation(program.0, name.as_ptr().cast())
            };

            // Built-ins such as gl_VertexID report -1
            let Ok(location) = u32::try_from(location) else {
                continue;
            };
            name.truncate(usize::try_from(written).unwrap_or(0));
            attributes.push(ActiveAttribute {
                name: String::from_utf8_lossy(&name).into_owned(),
                location,
                components: attribute_components(kind),
            });
        }
        attributes
    }

    fn use_program(&self, program: Option<ProgramId>) {
        unsafe { gl::UseProgram(name_or(program.map(|p| p.0))) };
    }

    fn delete_program(&self, program: ProgramId) {
        unsafe { gl::DeleteProgram(program.0) };
    }

    fn create_buffer(&self) -> Result<BufferId, String> {
        let mut id: GLuint = 0;
        unsafe { gl::GenBuffers(1, &mut id) };
        match id {
            0 => Err("glGenBuffers returned no name".to_string()),
            id => Ok(BufferId(id)),
        }
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        unsafe { gl::BindBuffer(gl::ARRAY_BUFFER, name_or(buffer.map(|b| b.0))) };
    }

    fn buffer_data(&self, data: &[u8], usage: BufferUsage) {
        let size = GLsizeiptr::try_from(data.len()).unwrap_or(GLsizeiptr::MAX);
        unsafe { gl::BufferData(gl::ARRAY_BUFFER, size, data.as_ptr().cast(), usage_hint(usage)) };
    }

    fn delete_buffer(&self, buffer: BufferId) {
        unsafe { gl::DeleteBuffers(1, &buffer.0) };
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, String> {
        let mut id: GLuint = 0;
        unsafe { gl::GenVertexArrays(1, &mut id) };
        match id {
            0 => Err("glGenVertexArrays returned no name".to_string()),
            id => Ok(VertexArrayId(id)),
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        unsafe { gl::BindVertexArray(name_or(vertex_array.map(|v| v.0))) };
    }

    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute) {
        let stride = GLsizei::try_from(attribute.stride).unwrap_or(GLsizei::MAX);
        // The "pointer" is a byte offset into the bound array buffer
        let offset = attribute.offset as usize as *const c_void;
        unsafe {
            gl::VertexAttribPointer(
                attribute.location,
                GLint::from(attribute.components),
                component_type(attribute.component_type),
                gl::FALSE,
                stride,
                offset,
            );
            gl::EnableVertexAttribArray(attribute.location);
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        unsafe { gl::DeleteVertexArrays(1, &vertex_array.0) };
    }

    fn viewport(&self, viewport: Viewport) {
        unsafe { gl::Viewport(viewport.x, viewport.y, viewport.width, viewport.height) };
    }

    fn clear_color(&self, color: ClearColor) {
        unsafe { gl::ClearColor(color.r, color.g, color.b, color.a) };
    }

    fn clear(&self) {
        unsafe { gl::Clear(gl::COLOR_BUFFER_BIT) };
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        unsafe { gl::DrawArrays(primitive_mode(primitive), first, count) };
    }

    fn read_pixel(&self, x: i32, y: i32) -> [u8; 4] {
        let mut pixel = [0_u8; 4];
        unsafe {
            gl::ReadPixels(x, y, 1, 1, gl::RGBA, gl::UNSIGNED_BYTE, pixel.as_mut_ptr().cast());
        }
        pixel
    }
}

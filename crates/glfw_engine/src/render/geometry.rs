//! Vertex buffers and vertex array layouts
//!
//! [`VertexBuffer`] owns one GPU buffer filled from `f32` vertex data.
//! [`GeometryBuffer`] owns a vertex array object, the buffers feeding it and the
//! attribute layout recorded in it. Layout calls apply to whatever vertex array
//! and buffer are bound, so [`GeometryBuffer::describe_layout`] refuses to run
//! unless this geometry's objects are the bound ones.

use thiserror::Error;

use crate::render::backend::{BufferId, BufferUsage, GpuBackend, Primitive, VertexArrayId};
use crate::render::session::{GraphicsSession, SessionHandle};
use crate::render::shader::ShaderProgram;
use crate::render::vertex_layout::{LayoutError, VertexAttribute};

/// Geometry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// The driver could not allocate a buffer or vertex array
    #[error("Failed to create {what}: {reason}")]
    ObjectCreation { what: &'static str, reason: String },

    /// Uploads need at least one value
    #[error("Vertex data is empty")]
    EmptyVertices,

    /// Layout calls need this geometry's vertex array and a buffer bound
    #[error("Layout described while vertex array {0:?} or one of its buffers is not bound")]
    NotBound(VertexArrayId),

    /// Component count outside 1..=4
    #[error("Attribute at location {location} has {components} components, expected 1 to 4")]
    InvalidAttribute { location: u32, components: u8 },

    /// Location already described
    #[error("Location {0} already has an attribute")]
    DuplicateLocation(u32),

    /// First element extends past the buffer
    #[error("Attribute at location {location} reads past the end of a {available}-byte buffer")]
    OutOfBounds { location: u32, available: usize },

    /// Buffer index out of range
    #[error("No vertex buffer with index {0}")]
    NoSuchBuffer(usize),

    /// The graphics context has shut down
    #[error("Graphics context has shut down")]
    ContextLost,
}

/// Result type for geometry operations
pub type GeometryResult<T> = Result<T, GeometryError>;

/// GPU buffer holding vertex data, with RAII cleanup
pub struct VertexBuffer<B: GpuBackend> {
    session: SessionHandle<B>,
    id: BufferId,
    len_bytes: usize,
    usage: BufferUsage,
}

impl<B: GpuBackend> VertexBuffer<B> {
    /// Allocate a buffer sized to `vertices` and copy them in
    ///
    /// The buffer is left bound to the array-buffer target.
    pub fn upload(session: &mut GraphicsSession<B>, vertices: &[f32], usage: BufferUsage) -> GeometryResult<Self> {
        if vertices.is_empty() {
            return Err(GeometryError::EmptyVertices);
        }

        let gpu = session.gpu().ok_or(GeometryError::ContextLost)?;
        let id = gpu.create_buffer().map_err(|reason| GeometryError::ObjectCreation {
            what: "vertex buffer",
            reason,
        })?;
        let mut buffer = Self {
            session: session.handle(),
            id,
            len_bytes: 0,
            usage,
        };
        buffer.write(session, vertices)?;

        log::debug!("Uploaded {} bytes to vertex buffer {} ({usage:?})", buffer.len_bytes, id.0);
        Ok(buffer)
    }

    /// Replace the buffer's contents
    pub fn reupload(&mut self, session: &mut GraphicsSession<B>, vertices: &[f32]) -> GeometryResult<()> {
        if vertices.is_empty() {
            return Err(GeometryError::EmptyVertices);
        }
        self.write(session, vertices)
    }

    fn write(&mut self, session: &mut GraphicsSession<B>, vertices: &[f32]) -> GeometryResult<()> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        session.bind_array_buffer(Some(self.id));
        session.gpu().ok_or(GeometryError::ContextLost)?.buffer_data(bytes, self.usage);
        self.len_bytes = bytes.len();
        Ok(())
    }

    /// Bind to the array-buffer target
    pub fn bind(&self, session: &mut GraphicsSession<B>) {
        session.bind_array_buffer(Some(self.id));
    }

    /// Buffer object name
    pub fn id(&self) -> BufferId {
        self.id
    }

    /// Size of the data store in bytes
    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    /// Usage hint given at upload
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl<B: GpuBackend> Drop for VertexBuffer<B> {
    fn drop(&mut self) {
        self.session.delete_buffer(self.id);
    }
}

#[derive(Debug, Clone, Copy)]
struct BoundAttribute {
    buffer: usize,
    attribute: VertexAttribute,
}

/// Vertex array object plus the buffers and layout it draws from
pub struct GeometryBuffer<B: GpuBackend> {
    // Buffers are declared before the vertex array so they drop first
    buffers: Vec<VertexBuffer<B>>,
    session: SessionHandle<B>,
    vertex_array: VertexArrayId,
    attributes: Vec<BoundAttribute>,
    vertex_count: i32,
}

impl<B: GpuBackend> GeometryBuffer<B> {
    /// Create an empty vertex array
    pub fn new(session: &GraphicsSession<B>) -> GeometryResult<Self> {
        let vertex_array = session
            .gpu()
            .ok_or(GeometryError::ContextLost)?
            .create_vertex_array()
            .map_err(|reason| GeometryError::ObjectCreation {
                what: "vertex array",
                reason,
            })?;

        Ok(Self {
            buffers: Vec::new(),
            session: session.handle(),
            vertex_array,
            attributes: Vec::new(),
            vertex_count: 0,
        })
    }

    /// Upload `vertices` into a new buffer owned by this geometry
    ///
    /// Leaves this vertex array and the new buffer bound, ready for
    /// [`describe_layout`](Self::describe_layout). Returns the buffer's index.
    pub fn upload(&mut self, session: &mut GraphicsSession<B>, vertices: &[f32], usage: BufferUsage) -> GeometryResult<usize> {
        session.bind_vertex_array(Some(self.vertex_array));
        let buffer = VertexBuffer::upload(session, vertices, usage)?;
        self.buffers.push(buffer);
        Ok(self.buffers.len() - 1)
    }

    /// Replace the contents of buffer `index`
    pub fn reupload(&mut self, session: &mut GraphicsSession<B>, index: usize, vertices: &[f32]) -> GeometryResult<()> {
        self.buffers
            .get_mut(index)
            .ok_or(GeometryError::NoSuchBuffer(index))?
            .reupload(session, vertices)?;
        self.vertex_count = self.compute_vertex_count();
        Ok(())
    }

    /// Bind this vertex array and buffer `index` so more attributes can be described
    pub fn select_buffer(&self, session: &mut GraphicsSession<B>, index: usize) -> GeometryResult<()> {
        let buffer = self.buffers.get(index).ok_or(GeometryError::NoSuchBuffer(index))?;
        session.bind_vertex_array(Some(self.vertex_array));
        buffer.bind(session);
        Ok(())
    }

    /// Record `attribute` against the bound buffer
    ///
    /// This vertex array and one of its buffers must be bound, which is the
    /// state [`upload`](Self::upload) and [`select_buffer`](Self::select_buffer)
    /// leave behind.
    pub fn describe_layout(&mut self, session: &mut GraphicsSession<B>, attribute: VertexAttribute) -> GeometryResult<()> {
        if session.bound_vertex_array() != Some(self.vertex_array) {
            return Err(GeometryError::NotBound(self.vertex_array));
        }
        let buffer = self
            .buffers
            .iter()
            .position(|buffer| session.bound_array_buffer() == Some(buffer.id()))
            .ok_or(GeometryError::NotBound(self.vertex_array))?;

        if !(1..=4).contains(&attribute.components) {
            return Err(GeometryError::InvalidAttribute {
                location: attribute.location,
                components: attribute.components,
            });
        }
        if self.attributes.iter().any(|bound| bound.attribute.location == attribute.location) {
            return Err(GeometryError::DuplicateLocation(attribute.location));
        }

        let available = self.buffers[buffer].len_bytes();
        let first_vertex_end = attribute.offset as usize
            + attribute.components as usize * attribute.component_type.size_bytes() as usize;
        if first_vertex_end > available {
            return Err(GeometryError::OutOfBounds {
                location: attribute.location,
                available,
            });
        }

        session.gpu().ok_or(GeometryError::ContextLost)?.vertex_attrib_pointer(&attribute);
        self.attributes.push(BoundAttribute { buffer, attribute });
        self.vertex_count = self.compute_vertex_count();

        log::debug!(
            "Vertex array {}: location {} <- buffer {} ({} x {:?}, stride {}, offset {})",
            self.vertex_array.0,
            attribute.location,
            self.buffers[buffer].id().0,
            attribute.components,
            attribute.component_type,
            attribute.effective_stride(),
            attribute.offset
        );
        Ok(())
    }

    /// Vertices every attribute can supply
    fn compute_vertex_count(&self) -> i32 {
        self.attributes
            .iter()
            .map(|bound| {
                let attribute = &bound.attribute;
                let len = self.buffers[bound.buffer].len_bytes();
                let element = attribute.components as usize * attribute.component_type.size_bytes() as usize;
                let start = attribute.offset as usize;
                if len < start + element {
                    0
                } else {
                    (len - start - element) / attribute.effective_stride() as usize + 1
                }
            })
            .min()
            .map_or(0, |count| i32::try_from(count).unwrap_or(i32::MAX))
    }

    /// Bind for drawing with `program`
    ///
    /// `program` must be the active program, and the recorded attributes must
    /// match its reflected inputs exactly; otherwise the draw would silently read
    /// the wrong data and a [`LayoutError`] is returned instead.
    pub fn bind(&self, session: &mut GraphicsSession<B>, program: &ShaderProgram<B>) -> Result<(), LayoutError> {
        if session.active_program() != Some(program.id()) {
            return Err(LayoutError::ProgramNotActive {
                expected: program.id(),
                active: session.active_program(),
            });
        }

        let attributes: Vec<VertexAttribute> = self.attributes.iter().map(|bound| bound.attribute).collect();
        program.input_layout().check(&attributes).map_err(|e| {
            log::error!("Vertex array {} does not match program {}: {e}", self.vertex_array.0, program.id().0);
            e
        })?;

        session.bind_vertex_array(Some(self.vertex_array));
        Ok(())
    }

    /// Unbind the vertex array
    pub fn unbind(&self, session: &mut GraphicsSession<B>) {
        session.bind_vertex_array(None);
    }

    /// Draw every vertex as a triangle list
    pub fn draw(&self, session: &mut GraphicsSession<B>) {
        session.draw_arrays(Primitive::Triangles, 0, self.vertex_count);
    }

    /// Vertex array object name
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Number of vertices drawn by [`draw`](Self::draw)
    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    /// Attributes recorded so far
    pub fn attributes(&self) -> impl Iterator<Item = &VertexAttribute> {
        self.attributes.iter().map(|bound| &bound.attribute)
    }

    /// Owned buffers in upload order
    pub fn buffers(&self) -> &[VertexBuffer<B>] {
        &self.buffers
    }
}

impl<B: GpuBackend> Drop for GeometryBuffer<B> {
    fn drop(&mut self) {
        self.buffers.clear();
        self.session.delete_vertex_array(self.vertex_array);
    }
}

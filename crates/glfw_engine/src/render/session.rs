//! Explicit holder for the context's global binding state
//!
//! OpenGL keeps the active program, the bound vertex array and the bound array
//! buffer in hidden per-context state. `GraphicsSession` mirrors that state so
//! the engine can check binding preconditions (for example "this vertex array
//! must be bound before describing its layout") and so every component receives
//! its GPU access through one explicit reference.
//!
//! Resource wrappers keep a [`SessionHandle`] so that dropping them both deletes
//! the GPU object and clears any binding the mirror still records for it.
//!
//! The session is linked to the [`GraphicsContext`](crate::render::window::GraphicsContext)
//! that created it. Once the context shuts down no further command reaches the
//! backend: creation fails, binds and draws are skipped, and dropped wrappers
//! only forget their bindings.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::render::backend::{
    BufferId, ClearColor, GpuBackend, Primitive, ProgramId, ShaderId, VertexArrayId, Viewport,
};

#[derive(Debug, Default)]
struct Bindings {
    active_program: Option<ProgramId>,
    vertex_array: Option<VertexArrayId>,
    array_buffer: Option<BufferId>,
}

/// Liveness flag shared between a context and the sessions it created
#[derive(Debug, Clone)]
pub(crate) struct ContextLink {
    live: Rc<Cell<bool>>,
}

impl ContextLink {
    fn new() -> Self {
        Self {
            live: Rc::new(Cell::new(true)),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.get()
    }

    /// Stop every linked session from issuing commands
    pub(crate) fn sever(&self) {
        self.live.set(false);
    }
}

/// Shared access to the backend and binding mirror, held by resource wrappers
#[derive(Clone)]
pub struct SessionHandle<B: GpuBackend> {
    gpu: B,
    bindings: Rc<RefCell<Bindings>>,
    link: ContextLink,
}

impl<B: GpuBackend> SessionHandle<B> {
    fn live_gpu(&self) -> Option<&B> {
        self.link.is_live().then_some(&self.gpu)
    }

    pub(crate) fn delete_shader(&self, shader: ShaderId) {
        if let Some(gpu) = self.live_gpu() {
            gpu.delete_shader(shader);
        }
    }

    pub(crate) fn delete_program(&self, program: ProgramId) {
        if let Some(gpu) = self.live_gpu() {
            gpu.delete_program(program);
        }
        let mut bindings = self.bindings.borrow_mut();
        if bindings.active_program == Some(program) {
            bindings.active_program = None;
        }
    }

    pub(crate) fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        if let Some(gpu) = self.live_gpu() {
            gpu.delete_vertex_array(vertex_array);
        }
        let mut bindings = self.bindings.borrow_mut();
        if bindings.vertex_array == Some(vertex_array) {
            bindings.vertex_array = None;
        }
    }

    pub(crate) fn delete_buffer(&self, buffer: BufferId) {
        if let Some(gpu) = self.live_gpu() {
            gpu.delete_buffer(buffer);
        }
        let mut bindings = self.bindings.borrow_mut();
        if bindings.array_buffer == Some(buffer) {
            bindings.array_buffer = None;
        }
    }
}

/// GPU command access plus the bindings currently in effect
pub struct GraphicsSession<B: GpuBackend> {
    handle: SessionHandle<B>,
    viewport: Viewport,
}

impl<B: GpuBackend> GraphicsSession<B> {
    /// Wrap a backend whose context is current on this thread
    pub fn new(gpu: B) -> Self {
        Self {
            handle: SessionHandle {
                gpu,
                bindings: Rc::new(RefCell::new(Bindings::default())),
                link: ContextLink::new(),
            },
            viewport: Viewport::default(),
        }
    }

    pub(crate) fn link(&self) -> ContextLink {
        self.handle.link.clone()
    }

    /// Whether the context behind this session is still alive
    pub fn is_live(&self) -> bool {
        self.handle.link.is_live()
    }

    /// Command interface, or `None` once the context has shut down
    pub fn gpu(&self) -> Option<&B> {
        self.handle.live_gpu()
    }

    /// Handle for resource wrappers that must release GPU objects on drop
    pub fn handle(&self) -> SessionHandle<B> {
        self.handle.clone()
    }

    /// Currently active program
    pub fn active_program(&self) -> Option<ProgramId> {
        self.handle.bindings.borrow().active_program
    }

    /// Currently bound vertex array
    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.handle.bindings.borrow().vertex_array
    }

    /// Buffer currently bound to the array-buffer target
    pub fn bound_array_buffer(&self) -> Option<BufferId> {
        self.handle.bindings.borrow().array_buffer
    }

    /// Last viewport set through this session
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Set the viewport transform
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(gpu) = self.gpu() {
            gpu.viewport(viewport);
            self.viewport = viewport;
        }
    }

    /// Clear the colour buffer to `color`
    pub fn clear(&mut self, color: ClearColor) {
        if let Some(gpu) = self.gpu() {
            gpu.clear_color(color);
            gpu.clear();
        }
    }

    /// Issue a non-indexed draw from the bound vertex array
    pub fn draw_arrays(&mut self, primitive: Primitive, first: i32, count: i32) {
        if let Some(gpu) = self.gpu() {
            log::trace!("draw {primitive:?} first={first} count={count}");
            gpu.draw_arrays(primitive, first, count);
        }
    }

    /// Read one RGBA8 pixel from the framebuffer
    pub fn read_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        self.gpu().map(|gpu| gpu.read_pixel(x, y))
    }

    pub(crate) fn bind_program(&mut self, program: Option<ProgramId>) {
        let Some(gpu) = self.handle.live_gpu() else {
            return;
        };
        let mut bindings = self.handle.bindings.borrow_mut();
        if bindings.active_program != program {
            gpu.use_program(program);
            bindings.active_program = program;
        }
    }

    pub(crate) fn bind_vertex_array(&mut self, vertex_array: Option<VertexArrayId>) {
        let Some(gpu) = self.handle.live_gpu() else {
            return;
        };
        let mut bindings = self.handle.bindings.borrow_mut();
        if bindings.vertex_array != vertex_array {
            gpu.bind_vertex_array(vertex_array);
            bindings.vertex_array = vertex_array;
        }
    }

    pub(crate) fn bind_array_buffer(&mut self, buffer: Option<BufferId>) {
        let Some(gpu) = self.handle.live_gpu() else {
            return;
        };
        let mut bindings = self.handle.bindings.borrow_mut();
        if bindings.array_buffer != buffer {
            gpu.bind_array_buffer(buffer);
            bindings.array_buffer = buffer;
        }
    }
}

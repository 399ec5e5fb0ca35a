//! Test doubles for the windowing system and the GPU
//!
//! `MockGpu` records every command and simulates just enough of a driver to
//! exercise the engine: shader compilation succeeds when the source has a
//! `#version` directive, a `main` function and balanced braces; linking reflects
//! `layout(location = N) in ...` declarations from vertex sources; a draw
//! "covers" the read-back pixel with the fragment shader's constant `vec4(...)`
//! only when every vertex input has an attribute at its location. Object names
//! are tracked so tests can assert nothing leaks and nothing is freed twice.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::render::backend::{
    ActiveAttribute, BufferId, BufferUsage, ClearColor, GpuBackend, Primitive, ProgramId, ShaderId,
    VertexArrayId, Viewport,
};
use crate::render::shader::ShaderStage;
use crate::render::vertex_layout::VertexAttribute;
use crate::render::window::{ContextHint, WindowSystem};

/// A recorded GPU command
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CreateShader(ShaderStage),
    CompileShader(ShaderId),
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader(ProgramId, ShaderId),
    DetachShader(ProgramId, ShaderId),
    LinkProgram(ProgramId),
    ValidateProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    DeleteProgram(ProgramId),
    CreateBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    BufferData { bytes: usize, usage: BufferUsage },
    DeleteBuffer(BufferId),
    CreateVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    VertexAttribPointer(VertexAttribute),
    DeleteVertexArray(VertexArrayId),
    Viewport(Viewport),
    ClearColor(ClearColor),
    Clear,
    DrawArrays { primitive: Primitive, first: i32, count: i32 },
}

struct MockShader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct MockProgram {
    attached: Vec<u32>,
    linked: bool,
    validated: bool,
    log: String,
    attributes: Vec<ActiveAttribute>,
    color: Option<[f32; 4]>,
}

#[derive(Default)]
struct GpuState {
    next_name: u32,
    calls: Vec<GpuCall>,
    shaders: HashMap<u32, MockShader>,
    programs: HashMap<u32, MockProgram>,
    buffers: HashMap<u32, usize>,
    vertex_arrays: HashMap<u32, Vec<VertexAttribute>>,
    active_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_buffer: Option<u32>,
    clear_color: ClearColor,
    pixel: [u8; 4],
    double_frees: usize,
    fail_link: bool,
    fail_validate: bool,
    silent_compile_log: bool,
}

impl GpuState {
    fn name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }
}

/// Recording GPU backend
#[derive(Clone, Default)]
pub struct MockGpu {
    state: Rc<RefCell<GpuState>>,
}

impl MockGpu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every link fail with a program log
    pub fn failing_link(self) -> Self {
        self.state.borrow_mut().fail_link = true;
        self
    }

    /// Make every validation fail with a program log
    pub fn failing_validation(self) -> Self {
        self.state.borrow_mut().fail_validate = true;
        self
    }

    /// Return an empty info log for failed compiles
    pub fn silent_compile_log(self) -> Self {
        self.state.borrow_mut().silent_compile_log = true;
        self
    }

    pub fn calls(&self) -> Vec<GpuCall> {
        self.state.borrow().calls.clone()
    }

    /// Shader, program, buffer and vertex array names still alive
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.shaders.len() + state.programs.len() + state.buffers.len() + state.vertex_arrays.len()
    }

    pub fn double_frees(&self) -> usize {
        self.state.borrow().double_frees
    }

    pub fn attached_shaders(&self, program: ProgramId) -> usize {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .map_or(0, |p| p.attached.len())
    }

    fn record(&self, call: GpuCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn compile_source(source: &str) -> Result<(), String> {
    if !source.trim_start().starts_with("#version") {
        return Err("0:1(1): error: missing #version directive".to_string());
    }
    if !source.contains("void main") {
        return Err("0:1(1): error: no function with name 'main'".to_string());
    }
    if source.matches('{').count() != source.matches('}').count() {
        return Err("0:1(1): error: syntax error, unexpected end of file".to_string());
    }
    Ok(())
}

fn parse_inputs(source: &str) -> Vec<ActiveAttribute> {
    source
        .split(';')
        .filter_map(|statement| {
            let cleaned: String = statement
                .chars()
                .map(|c| if "()=,".contains(c) { ' ' } else { c })
                .collect();
            let tokens: Vec<&str> = cleaned.split_whitespace().collect();
            let tokens = &tokens[tokens.iter().position(|t| *t == "layout")?..];
            let location = tokens.get(tokens.iter().position(|t| *t == "location")? + 1)?.parse().ok()?;
            let input = tokens.iter().position(|t| *t == "in")?;
            let components = match *tokens.get(input + 1)? {
                "float" => 1,
                "vec2" => 2,
                "vec3" => 3,
                "vec4" => 4,
                _ => return None,
            };
            let name = (*tokens.get(input + 2)?).to_string();
            Some(ActiveAttribute { name, location, components })
        })
        .collect()
}

fn parse_color(source: &str) -> Option<[f32; 4]> {
    let start = source.rfind("vec4(")? + "vec4(".len();
    let end = start + source[start..].find(')')?;
    let values: Vec<f32> = source[start..end]
        .split(',')
        .map(|value| value.trim().parse())
        .collect::<Result<_, _>>()
        .ok()?;
    <[f32; 4]>::try_from(values).ok()
}

fn to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|channel| (channel.clamp(0.0, 1.0) * 255.0).round() as u8)
}

impl GpuBackend for MockGpu {
    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String> {
        self.record(GpuCall::CreateShader(stage));
        let mut state = self.state.borrow_mut();
        let name = state.name();
        state.shaders.insert(
            name,
            MockShader { stage, source: String::new(), compiled: false, log: String::new() },
        );
        Ok(ShaderId(name))
    }

    fn shader_source(&self, shader: ShaderId, source: &str) {
        if let Some(entry) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            entry.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderId) {
        self.record(GpuCall::CompileShader(shader));
        if let Some(entry) = self.state.borrow_mut().shaders.get_mut(&shader.0) {
            match compile_source(&entry.source) {
                Ok(()) => {
                    entry.compiled = true;
                    entry.log.clear();
                }
                Err(log) => {
                    entry.compiled = false;
                    entry.log = log;
                }
            }
        }
    }

    fn shader_compile_status(&self, shader: ShaderId) -> bool {
        self.state.borrow().shaders.get(&shader.0).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderId, capacity: usize) -> String {
        let state = self.state.borrow();
        if state.silent_compile_log {
            return String::new();
        }
        let log = state.shaders.get(&shader.0).map_or("", |s| s.log.as_str());
        log.chars().take(capacity).collect()
    }

    fn delete_shader(&self, shader: ShaderId) {
        self.record(GpuCall::DeleteShader(shader));
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader.0).is_none() {
            state.double_frees += 1;
        }
    }

    fn create_program(&self) -> Result<ProgramId, String> {
        let name = {
            let mut state = self.state.borrow_mut();
            let name = state.name();
            state.programs.insert(name, MockProgram::default());
            name
        };
        self.record(GpuCall::CreateProgram(ProgramId(name)));
        Ok(ProgramId(name))
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.record(GpuCall::AttachShader(program, shader));
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program.0) {
            entry.attached.push(shader.0);
        }
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        self.record(GpuCall::DetachShader(program, shader));
        if let Some(entry) = self.state.borrow_mut().programs.get_mut(&program.0) {
            entry.attached.retain(|&name| name != shader.0);
        }
    }

    fn link_program(&self, program: ProgramId) {
        self.record(GpuCall::LinkProgram(program));
        let mut state = self.state.borrow_mut();
        let Some(attached) = state.programs.get(&program.0).map(|p| p.attached.clone()) else {
            return;
        };

        let shaders: Vec<&MockShader> = attached.iter().filter_map(|name| state.shaders.get(name)).collect();
        let all_compiled = shaders.iter().all(|s| s.compiled);
        let has_vertex = shaders.iter().any(|s| s.stage == ShaderStage::Vertex);
        let has_fragment = shaders.iter().any(|s| s.stage == ShaderStage::Fragment);
        let attributes: Vec<ActiveAttribute> = shaders
            .iter()
            .filter(|s| s.stage == ShaderStage::Vertex)
            .flat_map(|s| parse_inputs(&s.source))
            .collect();
        let color = shaders
            .iter()
            .filter(|s| s.stage == ShaderStage::Fragment)
            .find_map(|s| parse_color(&s.source));

        let failure = if state.fail_link {
            Some("error: program link failed: unresolved varying 'vColour'")
        } else if !all_compiled {
            Some("error: linking with uncompiled shader")
        } else if !(has_vertex && has_fragment) {
            Some("error: program lacks a vertex or fragment stage")
        } else {
            None
        };

        if let Some(entry) = state.programs.get_mut(&program.0) {
            entry.linked = failure.is_none();
            entry.log = failure.unwrap_or_default().to_string();
            entry.attributes = attributes;
            entry.color = color;
        }
    }

    fn program_link_status(&self, program: ProgramId) -> bool {
        self.state.borrow().programs.get(&program.0).is_some_and(|p| p.linked)
    }

    fn validate_program(&self, program: ProgramId) {
        self.record(GpuCall::ValidateProgram(program));
        let mut state = self.state.borrow_mut();
        let fail = state.fail_validate;
        if let Some(entry) = state.programs.get_mut(&program.0) {
            entry.validated = entry.linked && !fail;
            if !entry.validated {
                entry.log = "error: validation failed: no vertex array object bound".to_string();
            }
        }
    }

    fn program_validate_status(&self, program: ProgramId) -> bool {
        self.state.borrow().programs.get(&program.0).is_some_and(|p| p.validated)
    }

    fn program_info_log(&self, program: ProgramId, capacity: usize) -> String {
        let state = self.state.borrow();
        let log = state.programs.get(&program.0).map_or("", |p| p.log.as_str());
        log.chars().take(capacity).collect()
    }

    fn active_attributes(&self, program: ProgramId) -> Vec<ActiveAttribute> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .filter(|p| p.linked)
            .map(|p| p.attributes.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramId>) {
        self.record(GpuCall::UseProgram(program));
        self.state.borrow_mut().active_program = program.map(|p| p.0);
    }

    fn delete_program(&self, program: ProgramId) {
        self.record(GpuCall::DeleteProgram(program));
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program.0).is_none() {
            state.double_frees += 1;
        }
    }

    fn create_buffer(&self) -> Result<BufferId, String> {
        let name = {
            let mut state = self.state.borrow_mut();
            let name = state.name();
            state.buffers.insert(name, 0);
            name
        };
        self.record(GpuCall::CreateBuffer(BufferId(name)));
        Ok(BufferId(name))
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        self.record(GpuCall::BindArrayBuffer(buffer));
        self.state.borrow_mut().bound_buffer = buffer.map(|b| b.0);
    }

    fn buffer_data(&self, data: &[u8], usage: BufferUsage) {
        self.record(GpuCall::BufferData { bytes: data.len(), usage });
        let mut state = self.state.borrow_mut();
        if let Some(bound) = state.bound_buffer {
            state.buffers.insert(bound, data.len());
        }
    }

    fn delete_buffer(&self, buffer: BufferId) {
        self.record(GpuCall::DeleteBuffer(buffer));
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer.0).is_none() {
            state.double_frees += 1;
        }
        if state.bound_buffer == Some(buffer.0) {
            state.bound_buffer = None;
        }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayId, String> {
        let name = {
            let mut state = self.state.borrow_mut();
            let name = state.name();
            state.vertex_arrays.insert(name, Vec::new());
            name
        };
        self.record(GpuCall::CreateVertexArray(VertexArrayId(name)));
        Ok(VertexArrayId(name))
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        self.record(GpuCall::BindVertexArray(vertex_array));
        self.state.borrow_mut().bound_vertex_array = vertex_array.map(|v| v.0);
    }

    fn vertex_attrib_pointer(&self, attribute: &VertexAttribute) {
        self.record(GpuCall::VertexAttribPointer(*attribute));
        let mut state = self.state.borrow_mut();
        if let Some(bound) = state.bound_vertex_array {
            if let Some(attributes) = state.vertex_arrays.get_mut(&bound) {
                attributes.retain(|a| a.location != attribute.location);
                attributes.push(*attribute);
            }
        }
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        self.record(GpuCall::DeleteVertexArray(vertex_array));
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array.0).is_none() {
            state.double_frees += 1;
        }
        if state.bound_vertex_array == Some(vertex_array.0) {
            state.bound_vertex_array = None;
        }
    }

    fn viewport(&self, viewport: Viewport) {
        self.record(GpuCall::Viewport(viewport));
    }

    fn clear_color(&self, color: ClearColor) {
        self.record(GpuCall::ClearColor(color));
        self.state.borrow_mut().clear_color = color;
    }

    fn clear(&self) {
        self.record(GpuCall::Clear);
        let mut state = self.state.borrow_mut();
        let ClearColor { r, g, b, a } = state.clear_color;
        state.pixel = to_rgba8([r, g, b, a]);
    }

    fn draw_arrays(&self, primitive: Primitive, first: i32, count: i32) {
        self.record(GpuCall::DrawArrays { primitive, first, count });
        let mut state = self.state.borrow_mut();
        let covered = match (state.active_program, state.bound_vertex_array) {
            (Some(program), Some(vertex_array)) => {
                let program = &state.programs[&program];
                let attributes = &state.vertex_arrays[&vertex_array];
                let fed = program
                    .attributes
                    .iter()
                    .all(|input| attributes.iter().any(|a| a.location == input.location));
                if program.linked && fed && count >= 3 {
                    program.color
                } else {
                    None
                }
            }
            _ => None,
        };
        if let Some(color) = covered {
            state.pixel = to_rgba8(color);
        }
    }

    fn read_pixel(&self, _x: i32, _y: i32) -> [u8; 4] {
        self.state.borrow().pixel
    }
}

/// A recorded windowing-system call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemEvent {
    Hint(ContextHint),
    CreateWindow { width: u32, height: u32 },
    MakeCurrent,
    LoadExtensions,
    SwapInterval(u32),
    PollEvents,
    SwapBuffers,
    DestroyWindow,
    Terminate,
}

struct SystemState {
    events: Vec<SystemEvent>,
    fail_window: bool,
    fail_extensions: bool,
    framebuffer_size: (i32, i32),
    close_after_polls: Option<u64>,
    polls: u64,
    should_close: bool,
}

/// Scripted windowing system
#[derive(Clone)]
pub struct MockSystem {
    state: Rc<RefCell<SystemState>>,
    gpu: MockGpu,
}

/// Window produced by [`MockSystem`]
pub struct MockWindow;

impl MockSystem {
    pub fn new() -> Self {
        Self::with_gpu(MockGpu::new())
    }

    /// Hand out `gpu` from `load_extensions`
    pub fn with_gpu(gpu: MockGpu) -> Self {
        Self {
            state: Rc::new(RefCell::new(SystemState {
                events: Vec::new(),
                fail_window: false,
                fail_extensions: false,
                framebuffer_size: (800, 600),
                close_after_polls: None,
                polls: 0,
                should_close: false,
            })),
            gpu,
        }
    }

    pub fn failing_window(self) -> Self {
        self.state.borrow_mut().fail_window = true;
        self
    }

    pub fn failing_extensions(self) -> Self {
        self.state.borrow_mut().fail_extensions = true;
        self
    }

    pub fn with_framebuffer_size(self, width: i32, height: i32) -> Self {
        self.state.borrow_mut().framebuffer_size = (width, height);
        self
    }

    /// Flag the window for closing during the `polls`-th event poll
    pub fn closing_after(self, polls: u64) -> Self {
        self.state.borrow_mut().close_after_polls = Some(polls);
        self
    }

    pub fn events(&self) -> Vec<SystemEvent> {
        self.state.borrow().events.clone()
    }

    pub fn count(&self, event: &SystemEvent) -> usize {
        self.state.borrow().events.iter().filter(|e| *e == event).count()
    }

    fn record(&self, event: SystemEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl WindowSystem for MockSystem {
    type Window = MockWindow;
    type Gpu = MockGpu;

    fn init() -> Result<Self, String> {
        Ok(Self::new())
    }

    fn window_hint(&mut self, hint: ContextHint) {
        self.record(SystemEvent::Hint(hint));
    }

    fn create_window(&mut self, width: u32, height: u32, _title: &str) -> Option<MockWindow> {
        self.record(SystemEvent::CreateWindow { width, height });
        (!self.state.borrow().fail_window).then_some(MockWindow)
    }

    fn make_context_current(&mut self, _window: &mut MockWindow) {
        self.record(SystemEvent::MakeCurrent);
    }

    fn load_extensions(&mut self, _window: &mut MockWindow) -> Result<MockGpu, String> {
        self.record(SystemEvent::LoadExtensions);
        if self.state.borrow().fail_extensions {
            Err("missing entry points: glCreateShader".to_string())
        } else {
            Ok(self.gpu.clone())
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.record(SystemEvent::SwapInterval(interval));
    }

    fn framebuffer_size(&self, _window: &MockWindow) -> (i32, i32) {
        self.state.borrow().framebuffer_size
    }

    fn poll_events(&mut self, _window: &mut MockWindow) {
        self.record(SystemEvent::PollEvents);
        let mut state = self.state.borrow_mut();
        state.polls += 1;
        if state.close_after_polls == Some(state.polls) {
            state.should_close = true;
        }
    }

    fn window_should_close(&self, _window: &MockWindow) -> bool {
        self.state.borrow().should_close
    }

    fn set_window_should_close(&mut self, _window: &mut MockWindow, value: bool) {
        self.state.borrow_mut().should_close = value;
    }

    fn swap_buffers(&mut self, _window: &mut MockWindow) {
        self.record(SystemEvent::SwapBuffers);
    }

    fn destroy_window(&mut self, _window: MockWindow) {
        self.record(SystemEvent::DestroyWindow);
    }

    fn terminate(self) {
        self.record(SystemEvent::Terminate);
    }
}

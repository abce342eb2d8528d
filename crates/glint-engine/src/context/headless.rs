//! Software stand-in for a GL context.
//!
//! `HeadlessContext` keeps just enough state to answer the questions a test or
//! a trace tool asks: what was uploaded, what is bound, which draw calls were
//! issued and with which objects. It never rasterizes.
//!
//! GL error semantics are approximated: a call that would raise a GL error is
//! ignored and a message is appended to [`HeadlessContext::errors`].

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroU32;

use super::{
    BufferHandle, BufferKind, BufferUsage, GlContext, ProgramHandle, ShaderHandle, ShaderStage,
    TextureHandle, UniformLocation, VertexArrayHandle,
};

/// One recorded state-changing call.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBuffer(BufferKind, Option<BufferHandle>),
    BufferData { kind: BufferKind, len: usize, usage: BufferUsage },
    BufferInit { kind: BufferKind, size: usize, usage: BufferUsage },
    BufferSubData { kind: BufferKind, offset: usize, len: usize },
    VertexAttribPointer { index: u32, components: i32, stride: i32, offset: i32 },
    EnableVertexAttribArray(u32),
    DrawTriangles(DrawCall),

    CreateShader(ShaderStage, ShaderHandle),
    ShaderSource(ShaderHandle),
    CompileShader(ShaderHandle),
    DeleteShader(ShaderHandle),
    CreateProgram(ProgramHandle),
    AttachShader(ProgramHandle, ShaderHandle),
    DetachShader(ProgramHandle, ShaderHandle),
    LinkProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    DeleteProgram(ProgramHandle),
    UniformMatrix4 { location: Option<UniformLocation>, matrix: [f32; 16] },

    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    BindTexture(Option<TextureHandle>),
    TexImage { width: i32, height: i32, filled: bool },
    TexSubImage { x: i32, y: i32, width: i32, height: i32 },
    TexParameter { parameter: u32, value: i32 },

    CreateVertexArray(VertexArrayHandle),
    DeleteVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),

    Viewport { x: i32, y: i32, width: i32, height: i32 },
    ClearColor([f32; 4]),
    Clear,
}

/// Snapshot of the bind state at the moment of a draw call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub count: i32,
    pub offset: i32,
    pub program: Option<ProgramHandle>,
    pub texture: Option<TextureHandle>,
    pub vertex_array: Option<VertexArrayHandle>,
    pub element_buffer: Option<BufferHandle>,
}

/// Float attribute layout as last described by `vertex_attrib_pointer_f32`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub buffer: BufferHandle,
    pub components: i32,
    pub stride: i32,
    pub offset: i32,
    pub enabled: bool,
}

#[derive(Debug, Default)]
struct VertexArrayState {
    element_buffer: Option<BufferHandle>,
    attributes: BTreeMap<u32, Attribute>,
}

#[derive(Debug)]
struct Shader {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Debug, Default)]
struct Program {
    attached: Vec<ShaderHandle>,
    linked: bool,
    log: String,
    uniforms: Vec<String>,
    matrices: HashMap<u32, [f32; 16]>,
}

#[derive(Debug, Default)]
struct Texture {
    width: i32,
    height: i32,
    pixels: Vec<u8>,
    parameters: HashMap<u32, i32>,
}

#[derive(Debug)]
struct State {
    next_name: u32,
    calls: Vec<GlCall>,
    errors: Vec<String>,

    buffers: HashMap<BufferHandle, Vec<u8>>,
    array_buffer: Option<BufferHandle>,

    shaders: HashMap<ShaderHandle, Shader>,
    programs: HashMap<ProgramHandle, Program>,
    current_program: Option<ProgramHandle>,

    textures: HashMap<TextureHandle, Texture>,
    bound_texture: Option<TextureHandle>,

    // `None` is the default vertex array (name 0).
    vertex_arrays: HashMap<Option<VertexArrayHandle>, VertexArrayState>,
    bound_vertex_array: Option<VertexArrayHandle>,

    viewport: [i32; 4],
    clear_color: [f32; 4],
}

impl Default for State {
    fn default() -> Self {
        let mut vertex_arrays = HashMap::new();
        vertex_arrays.insert(None, VertexArrayState::default());
        Self {
            next_name: 1,
            calls: Vec::new(),
            errors: Vec::new(),
            buffers: HashMap::new(),
            array_buffer: None,
            shaders: HashMap::new(),
            programs: HashMap::new(),
            current_program: None,
            textures: HashMap::new(),
            bound_texture: None,
            vertex_arrays,
            bound_vertex_array: None,
            viewport: [0; 4],
            clear_color: [0.0; 4],
        }
    }
}

impl State {
    fn alloc_name(&mut self) -> NonZeroU32 {
        let name = NonZeroU32::new(self.next_name).unwrap_or(NonZeroU32::MIN);
        self.next_name = self.next_name.wrapping_add(1).max(1);
        name
    }

    fn error(&mut self, message: String) {
        log::trace!("headless gl error: {message}");
        self.errors.push(message);
    }

    fn vao(&mut self) -> &mut VertexArrayState {
        self.vertex_arrays.entry(self.bound_vertex_array).or_default()
    }

    fn bound_buffer(&self, kind: BufferKind) -> Option<BufferHandle> {
        match kind {
            BufferKind::Data => self.array_buffer,
            BufferKind::Element => self
                .vertex_arrays
                .get(&self.bound_vertex_array)
                .and_then(|vao| vao.element_buffer),
        }
    }

    fn bound_storage(&mut self, kind: BufferKind, call: &str) -> Option<&mut Vec<u8>> {
        let Some(buffer) = self.bound_buffer(kind) else {
            self.error(format!("{call}: no buffer bound to {kind:?}"));
            return None;
        };
        self.buffers.get_mut(&buffer)
    }

    fn bound_texture_mut(&mut self, call: &str) -> Option<&mut Texture> {
        let Some(texture) = self.bound_texture else {
            self.error(format!("{call}: no texture bound"));
            return None;
        };
        self.textures.get_mut(&texture)
    }
}

/// Recording, read-back capable [`GlContext`] with no native backend.
#[derive(Debug)]
pub struct HeadlessContext {
    vertex_arrays: bool,
    state: RefCell<State>,
}

impl HeadlessContext {
    /// A context that supports every capability this crate queries.
    pub fn new() -> Self {
        Self {
            vertex_arrays: true,
            state: RefCell::new(State::default()),
        }
    }

    /// A context that reports no vertex array object support (GLES 2.0 class).
    pub fn without_vertex_arrays() -> Self {
        Self {
            vertex_arrays: false,
            state: RefCell::new(State::default()),
        }
    }

    /// All recorded calls, oldest first.
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    /// Drains the call log.
    pub fn take_calls(&self) -> Vec<GlCall> {
        std::mem::take(&mut self.state.borrow_mut().calls)
    }

    /// Recorded draw calls, oldest first.
    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.state
            .borrow()
            .calls
            .iter()
            .filter_map(|call| match call {
                GlCall::DrawTriangles(draw) => Some(*draw),
                _ => None,
            })
            .collect()
    }

    /// Messages for calls a real driver would have flagged with a GL error.
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    /// Current contents of a live buffer.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    pub fn bound_buffer(&self, kind: BufferKind) -> Option<BufferHandle> {
        self.state.borrow().bound_buffer(kind)
    }

    /// Attribute layout recorded in the given vertex array (`None` = default).
    pub fn attribute(&self, vertex_array: Option<VertexArrayHandle>, index: u32) -> Option<Attribute> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .and_then(|vao| vao.attributes.get(&index).copied())
    }

    /// `(width, height, rgba pixels)` of a live texture.
    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<(i32, i32, Vec<u8>)> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .map(|t| (t.width, t.height, t.pixels.clone()))
    }

    pub fn texture_parameter(&self, texture: TextureHandle, parameter: u32) -> Option<i32> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .and_then(|t| t.parameters.get(&parameter).copied())
    }

    pub fn bound_texture(&self) -> Option<TextureHandle> {
        self.state.borrow().bound_texture
    }

    pub fn current_program(&self) -> Option<ProgramHandle> {
        self.state.borrow().current_program
    }

    pub fn bound_vertex_array(&self) -> Option<VertexArrayHandle> {
        self.state.borrow().bound_vertex_array
    }

    /// Source text last given to a live shader.
    pub fn shader_source_text(&self, shader: ShaderHandle) -> Option<String> {
        self.state.borrow().shaders.get(&shader).map(|s| s.source.clone())
    }

    /// Last matrix uploaded to `location` while `program` was current.
    pub fn uniform_matrix(&self, program: ProgramHandle, location: UniformLocation) -> Option<[f32; 16]> {
        self.state
            .borrow()
            .programs
            .get(&program)
            .and_then(|p| p.matrices.get(&location.0).copied())
    }

    pub fn viewport_rect(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn clear_color_value(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    /// Number of native objects not yet deleted (all kinds, shaders included).
    pub fn live_objects(&self) -> usize {
        let st = self.state.borrow();
        st.buffers.len()
            + st.shaders.len()
            + st.programs.len()
            + st.textures.len()
            + st.vertex_arrays.keys().filter(|k| k.is_some()).count()
    }

    fn record(&self, call: GlCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl Default for HeadlessContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Collects uniform names from `uniform <type> <name>;` declarations.
fn declared_uniforms(source: &str) -> impl Iterator<Item = String> + '_ {
    source.lines().filter_map(|line| {
        let mut tokens = line.split_whitespace();
        if tokens.next()? != "uniform" {
            return None;
        }
        // The type may be preceded by a precision qualifier.
        let name = match tokens.next()? {
            "lowp" | "mediump" | "highp" => tokens.nth(1)?,
            _ => tokens.next()?,
        };
        let name = name.trim_end_matches(';');
        let name = name.split('[').next().unwrap_or(name);
        (!name.is_empty()).then(|| name.to_string())
    })
}

impl GlContext for HeadlessContext {
    fn supports_vertex_arrays(&self) -> bool {
        self.vertex_arrays
    }

    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let mut st = self.state.borrow_mut();
        let buffer = BufferHandle::new(st.alloc_name());
        st.buffers.insert(buffer, Vec::new());
        st.calls.push(GlCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DeleteBuffer(buffer));
        if st.buffers.remove(&buffer).is_none() {
            // Deleting an unknown name is silently ignored by GL.
            return;
        }
        if st.array_buffer == Some(buffer) {
            st.array_buffer = None;
        }
        let bound_vao = st.bound_vertex_array;
        if let Some(vao) = st.vertex_arrays.get_mut(&bound_vao) {
            if vao.element_buffer == Some(buffer) {
                vao.element_buffer = None;
            }
        }
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferHandle>) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BindBuffer(kind, buffer));
        if let Some(b) = buffer {
            if !st.buffers.contains_key(&b) {
                st.error(format!("bind_buffer: {b:?} is not a live buffer"));
                return;
            }
        }
        match kind {
            BufferKind::Data => st.array_buffer = buffer,
            BufferKind::Element => st.vao().element_buffer = buffer,
        }
    }

    fn buffer_data(&self, kind: BufferKind, data: &[u8], usage: BufferUsage) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BufferData { kind, len: data.len(), usage });
        if let Some(storage) = st.bound_storage(kind, "buffer_data") {
            *storage = data.to_vec();
        }
    }

    fn buffer_init(&self, kind: BufferKind, size: usize, usage: BufferUsage) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BufferInit { kind, size, usage });
        if let Some(storage) = st.bound_storage(kind, "buffer_init") {
            *storage = vec![0; size];
        }
    }

    fn buffer_sub_data(&self, kind: BufferKind, offset: usize, data: &[u8]) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BufferSubData { kind, offset, len: data.len() });
        let Some(storage) = st.bound_storage(kind, "buffer_sub_data") else {
            return;
        };
        let end = offset + data.len();
        if end > storage.len() {
            let size = storage.len();
            st.error(format!("buffer_sub_data: range {offset}..{end} exceeds buffer size {size}"));
            return;
        }
        storage[offset..end].copy_from_slice(data);
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::VertexAttribPointer { index, components, stride, offset });
        let Some(buffer) = st.array_buffer else {
            st.error("vertex_attrib_pointer: no data buffer bound".to_string());
            return;
        };
        let enabled = st.vao().attributes.get(&index).is_some_and(|a| a.enabled);
        st.vao().attributes.insert(
            index,
            Attribute { buffer, components, stride, offset, enabled },
        );
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::EnableVertexAttribArray(index));
        match st.vao().attributes.get_mut(&index) {
            Some(attribute) => attribute.enabled = true,
            None => st.error(format!("enable_vertex_attrib_array: attribute {index} has no pointer")),
        }
    }

    fn draw_triangles_u32(&self, count: i32, offset: i32) {
        let mut st = self.state.borrow_mut();
        let draw = DrawCall {
            count,
            offset,
            program: st.current_program,
            texture: st.bound_texture,
            vertex_array: st.bound_vertex_array,
            element_buffer: st.bound_buffer(BufferKind::Element),
        };
        st.calls.push(GlCall::DrawTriangles(draw));
        if draw.element_buffer.is_none() {
            st.error("draw_elements: no element buffer bound".to_string());
        }
        if draw.program.is_none() {
            st.error("draw_elements: no program in use".to_string());
        }
    }

    // ── shaders / programs ────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle, String> {
        let mut st = self.state.borrow_mut();
        let shader = ShaderHandle::new(st.alloc_name());
        st.shaders.insert(
            shader,
            Shader { stage, source: String::new(), compiled: false, log: String::new() },
        );
        st.calls.push(GlCall::CreateShader(stage, shader));
        Ok(shader)
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::ShaderSource(shader));
        if let Some(s) = st.shaders.get_mut(&shader) {
            s.source = source.to_string();
        }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::CompileShader(shader));
        if let Some(s) = st.shaders.get_mut(&shader) {
            s.compiled = s.source.trim_start().starts_with("#version") && s.source.contains("void main");
            s.log = if s.compiled {
                String::new()
            } else {
                "ERROR: 0:1: missing #version directive or main entry point".to_string()
            };
        }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        self.state.borrow().shaders.get(&shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|s| s.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DeleteShader(shader));
        st.shaders.remove(&shader);
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        let mut st = self.state.borrow_mut();
        let program = ProgramHandle::new(st.alloc_name());
        st.programs.insert(program, Program::default());
        st.calls.push(GlCall::CreateProgram(program));
        Ok(program)
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::AttachShader(program, shader));
        if let Some(p) = st.programs.get_mut(&program) {
            p.attached.push(shader);
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DetachShader(program, shader));
        if let Some(p) = st.programs.get_mut(&program) {
            p.attached.retain(|s| *s != shader);
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::LinkProgram(program));

        let Some(attached) = st.programs.get(&program).map(|p| p.attached.clone()) else {
            return;
        };
        let shaders: Vec<&Shader> = attached.iter().filter_map(|s| st.shaders.get(s)).collect();
        let has_stage = |stage: ShaderStage| shaders.iter().any(|s| s.stage == stage && s.compiled);
        let linked = has_stage(ShaderStage::Vertex) && has_stage(ShaderStage::Fragment);

        let mut uniforms: Vec<String> = Vec::new();
        for shader in &shaders {
            for name in declared_uniforms(&shader.source) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }

        if let Some(p) = st.programs.get_mut(&program) {
            p.linked = linked;
            p.log = if linked {
                String::new()
            } else {
                "error: program needs a compiled vertex and fragment shader".to_string()
            };
            p.uniforms = if linked { uniforms } else { Vec::new() };
            p.matrices.clear();
        }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        self.state.borrow().programs.get(&program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::UseProgram(program));
        if let Some(p) = program {
            if !st.programs.get(&p).is_some_and(|p| p.linked) {
                st.error(format!("use_program: {p:?} is not a linked program"));
                return;
            }
        }
        st.current_program = program;
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DeleteProgram(program));
        st.programs.remove(&program);
        if st.current_program == Some(program) {
            st.current_program = None;
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let st = self.state.borrow();
        let p = st.programs.get(&program)?;
        p.uniforms
            .iter()
            .position(|u| u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn uniform_matrix4(&self, location: Option<UniformLocation>, matrix: &[f32; 16]) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::UniformMatrix4 { location, matrix: *matrix });
        let Some(location) = location else {
            return;
        };
        let Some(current) = st.current_program else {
            st.error("uniform_matrix4: no program in use".to_string());
            return;
        };
        if let Some(p) = st.programs.get_mut(&current) {
            p.matrices.insert(location.0, *matrix);
        }
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let mut st = self.state.borrow_mut();
        let texture = TextureHandle::new(st.alloc_name());
        st.textures.insert(texture, Texture::default());
        st.calls.push(GlCall::CreateTexture(texture));
        Ok(texture)
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DeleteTexture(texture));
        st.textures.remove(&texture);
        if st.bound_texture == Some(texture) {
            st.bound_texture = None;
        }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BindTexture(texture));
        if let Some(t) = texture {
            if !st.textures.contains_key(&t) {
                st.error(format!("bind_texture: {t:?} is not a live texture"));
                return;
            }
        }
        st.bound_texture = texture;
    }

    fn tex_image_rgba(&self, width: i32, height: i32, pixels: Option<&[u8]>) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::TexImage { width, height, filled: pixels.is_some() });
        let size = (width.max(0) as usize) * (height.max(0) as usize) * 4;
        if pixels.is_some_and(|p| p.len() < size) {
            st.error(format!("tex_image_2d: pixel data shorter than {size} bytes"));
            return;
        }
        if let Some(t) = st.bound_texture_mut("tex_image_2d") {
            t.width = width;
            t.height = height;
            t.pixels = match pixels {
                Some(p) => p[..size].to_vec(),
                None => vec![0; size],
            };
        }
    }

    fn tex_sub_image_rgba(&self, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::TexSubImage { x, y, width, height });
        let Some(t) = st.bound_texture_mut("tex_sub_image_2d") else {
            return;
        };
        let fits = x >= 0 && y >= 0 && x + width <= t.width && y + height <= t.height;
        let row = width.max(0) as usize * 4;
        if !fits || pixels.len() < row * height.max(0) as usize {
            st.error(format!("tex_sub_image_2d: region {x},{y} {width}x{height} out of range"));
            return;
        }
        let stride = t.width as usize * 4;
        for (r, src) in pixels.chunks_exact(row).take(height as usize).enumerate() {
            let start = (y as usize + r) * stride + x as usize * 4;
            t.pixels[start..start + row].copy_from_slice(src);
        }
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::TexParameter { parameter, value });
        if let Some(t) = st.bound_texture_mut("tex_parameter") {
            t.parameters.insert(parameter, value);
        }
    }

    // ── vertex arrays ─────────────────────────────────────────────────────

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        if !self.vertex_arrays {
            return Err("vertex array objects are not supported".to_string());
        }
        let mut st = self.state.borrow_mut();
        let vertex_array = VertexArrayHandle::new(st.alloc_name());
        st.vertex_arrays.insert(Some(vertex_array), VertexArrayState::default());
        st.calls.push(GlCall::CreateVertexArray(vertex_array));
        Ok(vertex_array)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::DeleteVertexArray(vertex_array));
        st.vertex_arrays.remove(&Some(vertex_array));
        if st.bound_vertex_array == Some(vertex_array) {
            st.bound_vertex_array = None;
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::BindVertexArray(vertex_array));
        if !st.vertex_arrays.contains_key(&vertex_array) {
            st.error(format!("bind_vertex_array: {vertex_array:?} is not a live vertex array"));
            return;
        }
        st.bound_vertex_array = vertex_array;
    }

    // ── frame ─────────────────────────────────────────────────────────────

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::Viewport { x, y, width, height });
        st.viewport = [x, y, width, height];
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        let mut st = self.state.borrow_mut();
        st.calls.push(GlCall::ClearColor(rgba));
        st.clear_color = rgba;
    }

    fn clear_color_buffer(&self) {
        self.record(GlCall::Clear);
    }
}

use glow::HasContext;

use super::{
    BufferHandle, BufferKind, BufferUsage, GlContext, ProgramHandle, ShaderHandle, ShaderStage,
    TextureHandle, UniformLocation, VertexArrayHandle,
};

const VERTEX_ARRAY_EXTENSIONS: [&str; 3] = [
    "GL_OES_vertex_array_object",
    "GL_ARB_vertex_array_object",
    "GL_APPLE_vertex_array_object",
];

/// [`GlContext`] backed by a native OpenGL (ES) context through `glow`.
///
/// The wrapped context must be current on the calling thread for as long as
/// this value is used. Every method is a single glow call.
pub struct GlowContext {
    gl: glow::Context,
    vertex_arrays: bool,
}

impl GlowContext {
    /// Wraps an existing glow context and probes its capabilities.
    pub fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        let vertex_arrays = version.major >= 3
            || VERTEX_ARRAY_EXTENSIONS
                .iter()
                .any(|ext| gl.supported_extensions().contains(*ext));

        log::debug!(
            "glow context: {}.{} (embedded: {}), vertex arrays: {}",
            version.major,
            version.minor,
            version.is_embedded,
            vertex_arrays
        );

        Self { gl, vertex_arrays }
    }

    /// Borrows the underlying glow context.
    pub fn raw(&self) -> &glow::Context {
        &self.gl
    }
}

#[inline]
fn buffer_target(kind: BufferKind) -> u32 {
    match kind {
        BufferKind::Data => glow::ARRAY_BUFFER,
        BufferKind::Element => glow::ELEMENT_ARRAY_BUFFER,
    }
}

#[inline]
fn usage(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::Static => glow::STATIC_DRAW,
        BufferUsage::Dynamic => glow::DYNAMIC_DRAW,
    }
}

// SAFETY (all blocks below): the context is current on this thread (type
// contract) and every handle passed in was produced by the same context.
impl GlContext for GlowContext {
    fn supports_vertex_arrays(&self) -> bool {
        self.vertex_arrays
    }

    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { self.gl.create_buffer() }.map(|b| BufferHandle::new(b.0))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.raw())) }
    }

    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(buffer_target(kind), buffer.map(|b| glow::NativeBuffer(b.raw())))
        }
    }

    fn buffer_data(&self, kind: BufferKind, data: &[u8], buffer_usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(buffer_target(kind), data, usage(buffer_usage))
        }
    }

    fn buffer_init(&self, kind: BufferKind, size: usize, buffer_usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_size(buffer_target(kind), size as i32, usage(buffer_usage))
        }
    }

    fn buffer_sub_data(&self, kind: BufferKind, offset: usize, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_sub_data_u8_slice(buffer_target(kind), offset as i32, data)
        }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, components, glow::FLOAT, false, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn draw_triangles_u32(&self, count: i32, offset: i32) {
        unsafe {
            self.gl
                .draw_elements(glow::TRIANGLES, count, glow::UNSIGNED_INT, offset)
        }
    }

    // ── shaders / programs ────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle, String> {
        let ty = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(ty) }.map(|s| ShaderHandle::new(s.0))
    }

    fn shader_source(&self, shader: ShaderHandle, source: &str) {
        unsafe { self.gl.shader_source(glow::NativeShader(shader.raw()), source) }
    }

    fn compile_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.compile_shader(glow::NativeShader(shader.raw())) }
    }

    fn shader_compile_status(&self, shader: ShaderHandle) -> bool {
        unsafe { self.gl.get_shader_compile_status(glow::NativeShader(shader.raw())) }
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        unsafe { self.gl.get_shader_info_log(glow::NativeShader(shader.raw())) }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.raw())) }
    }

    fn create_program(&self) -> Result<ProgramHandle, String> {
        unsafe { self.gl.create_program() }.map(|p| ProgramHandle::new(p.0))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .attach_shader(glow::NativeProgram(program.raw()), glow::NativeShader(shader.raw()))
        }
    }

    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        unsafe {
            self.gl
                .detach_shader(glow::NativeProgram(program.raw()), glow::NativeShader(shader.raw()))
        }
    }

    fn link_program(&self, program: ProgramHandle) {
        unsafe { self.gl.link_program(glow::NativeProgram(program.raw())) }
    }

    fn program_link_status(&self, program: ProgramHandle) -> bool {
        unsafe { self.gl.get_program_link_status(glow::NativeProgram(program.raw())) }
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        unsafe { self.gl.get_program_info_log(glow::NativeProgram(program.raw())) }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe { self.gl.use_program(program.map(|p| glow::NativeProgram(p.raw()))) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.raw())) }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.raw()), name)
        }
        .map(|loc| UniformLocation(loc.0))
    }

    fn uniform_matrix4(&self, location: Option<UniformLocation>, matrix: &[f32; 16]) {
        let location = location.map(|loc| glow::NativeUniformLocation(loc.0));
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(location.as_ref(), false, matrix)
        }
    }

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { self.gl.create_texture() }.map(|t| TextureHandle::new(t.0))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.raw())) }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.raw())))
        }
    }

    fn tex_image_rgba(&self, width: i32, height: i32, pixels: Option<&[u8]>) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        }
    }

    fn tex_sub_image_rgba(&self, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                x,
                y,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            )
        }
    }

    fn tex_parameter_i32(&self, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value) }
    }

    // ── vertex arrays ─────────────────────────────────────────────────────

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { self.gl.create_vertex_array() }.map(|v| VertexArrayHandle::new(v.0))
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle) {
        unsafe {
            self.gl
                .delete_vertex_array(glow::NativeVertexArray(vertex_array.raw()))
        }
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vertex_array.map(|v| glow::NativeVertexArray(v.raw())))
        }
    }

    // ── frame ─────────────────────────────────────────────────────────────

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, [r, g, b, a]: [f32; 4]) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear_color_buffer(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT) }
    }
}

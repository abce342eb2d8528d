//! Rendering context seam.
//!
//! Every GPU operation in this crate is issued through a [`GlContext`]. The
//! context is threaded explicitly into each resource method instead of being
//! stashed as hidden global state, so the single-threaded bind model of GL is
//! visible at every call site:
//! - binding a buffer/texture/program/vertex array evicts the previous one of
//!   the same kind
//! - nothing here locks, batches, or reorders calls
//!
//! Two implementations ship with the crate:
//! - [`GlowContext`] forwards to a native OpenGL (ES) context through `glow`
//! - [`HeadlessContext`] is a software stand-in that records every call

mod handle;
pub mod headless;

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
mod native;

use std::fmt;

pub use handle::{BufferHandle, ProgramHandle, ShaderHandle, TextureHandle, UniformLocation, VertexArrayHandle};
pub use headless::{GlCall, HeadlessContext};

#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use native::GlowContext;

/// Raw GL enum values that cross the seam.
pub mod consts {
    pub const ARRAY_BUFFER: u32 = 0x8892;
    pub const ELEMENT_ARRAY_BUFFER: u32 = 0x8893;

    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;

    pub const LINEAR: i32 = 0x2601;
    pub const CLAMP_TO_EDGE: i32 = 0x812F;
}

/// What a buffer object holds. Fixed when the buffer is created.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BufferKind {
    /// Vertex attribute data (`GL_ARRAY_BUFFER`).
    Data,
    /// Triangle indices into a data buffer (`GL_ELEMENT_ARRAY_BUFFER`).
    Element,
}

impl BufferKind {
    /// The GL bind target for this kind.
    #[inline]
    pub const fn target(self) -> u32 {
        match self {
            Self::Data => consts::ARRAY_BUFFER,
            Self::Element => consts::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl TryFrom<u32> for BufferKind {
    type Error = crate::GraphicsError;

    fn try_from(target: u32) -> Result<Self, Self::Error> {
        match target {
            consts::ARRAY_BUFFER => Ok(Self::Data),
            consts::ELEMENT_ARRAY_BUFFER => Ok(Self::Element),
            other => Err(crate::GraphicsError::UnknownBufferKind(other)),
        }
    }
}

/// Upload frequency hint passed to the driver.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BufferUsage {
    /// Written once, drawn many times.
    #[default]
    Static,
    /// Rewritten frequently (e.g. every frame).
    Dynamic,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// The graphics calls this crate needs from a native context.
///
/// Calls mirror their OpenGL ES 3.0 counterparts one to one. Object creation
/// is the only fallible step; the `String` carries the driver's message.
/// Texture calls always target `GL_TEXTURE_2D` on the active texture unit and
/// pixel transfers are always RGBA / unsigned byte.
pub trait GlContext {
    /// Whether vertex array objects are available.
    fn supports_vertex_arrays(&self) -> bool;

    // ── buffers ───────────────────────────────────────────────────────────

    fn create_buffer(&self) -> Result<BufferHandle, String>;
    fn delete_buffer(&self, buffer: BufferHandle);
    fn bind_buffer(&self, kind: BufferKind, buffer: Option<BufferHandle>);
    /// Replaces the bound buffer's storage with `data`.
    fn buffer_data(&self, kind: BufferKind, data: &[u8], usage: BufferUsage);
    /// Replaces the bound buffer's storage with `size` uninitialised bytes.
    fn buffer_init(&self, kind: BufferKind, size: usize, usage: BufferUsage);
    fn buffer_sub_data(&self, kind: BufferKind, offset: usize, data: &[u8]);

    /// Describes a float attribute read from the bound data buffer.
    /// `stride` and `offset` are in bytes.
    fn vertex_attrib_pointer_f32(&self, index: u32, components: i32, stride: i32, offset: i32);
    fn enable_vertex_attrib_array(&self, index: u32);

    /// Draws `count` indices from the bound element buffer as a triangle
    /// list of unsigned 32-bit indices starting at byte `offset`.
    fn draw_triangles_u32(&self, count: i32, offset: i32);

    // ── shaders / programs ────────────────────────────────────────────────

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle, String>;
    fn shader_source(&self, shader: ShaderHandle, source: &str);
    fn compile_shader(&self, shader: ShaderHandle);
    fn shader_compile_status(&self, shader: ShaderHandle) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> Result<ProgramHandle, String>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn detach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    fn link_program(&self, program: ProgramHandle);
    fn program_link_status(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn use_program(&self, program: Option<ProgramHandle>);
    fn delete_program(&self, program: ProgramHandle);

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    /// Uploads a column-major 4x4 matrix. `None` is silently ignored.
    fn uniform_matrix4(&self, location: Option<UniformLocation>, matrix: &[f32; 16]);

    // ── textures ──────────────────────────────────────────────────────────

    fn create_texture(&self) -> Result<TextureHandle, String>;
    fn delete_texture(&self, texture: TextureHandle);
    fn bind_texture(&self, texture: Option<TextureHandle>);
    /// Allocates RGBA8 storage for the bound texture, optionally filled.
    fn tex_image_rgba(&self, width: i32, height: i32, pixels: Option<&[u8]>);
    fn tex_sub_image_rgba(&self, x: i32, y: i32, width: i32, height: i32, pixels: &[u8]);
    fn tex_parameter_i32(&self, parameter: u32, value: i32);

    // ── vertex arrays ─────────────────────────────────────────────────────

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String>;
    fn delete_vertex_array(&self, vertex_array: VertexArrayHandle);
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayHandle>);

    // ── frame ─────────────────────────────────────────────────────────────

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, rgba: [f32; 4]);
    /// Clears `GL_COLOR_BUFFER_BIT`.
    fn clear_color_buffer(&self);
}

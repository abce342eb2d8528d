//! Shader programs.

use crate::context::{GlContext, ProgramHandle, ShaderHandle, ShaderStage, UniformLocation};
use crate::error::{GraphicsError, Result};

/// Default vertex stage: slot 0 = vec3 position, slot 1 = vec2 texcoord.
pub const DEFAULT_VERTEX_SHADER: &str = r#"#version 300 es

layout (location = 0) in vec3 position;
layout (location = 1) in vec2 texCoord;

out vec2 TexCoord;

void main() {
	gl_Position = vec4(position.x, position.y, position.z, 1.0);
	TexCoord = texCoord;
}"#;

/// Default fragment stage: samples the bound texture unchanged.
pub const DEFAULT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec2 TexCoord;

out vec4 color;

uniform sampler2D ourTexture;

void main() {
	color = texture(ourTexture, TexCoord);
}"#;

/// A linked vertex + fragment shader pair.
#[derive(Debug)]
pub struct Program {
    handle: Option<ProgramHandle>,
}

impl Program {
    /// Compiles and links a program.
    ///
    /// An empty source selects the built-in default for that stage
    /// ([`DEFAULT_VERTEX_SHADER`], [`DEFAULT_FRAGMENT_SHADER`]).
    pub fn new<G: GlContext + ?Sized>(gl: &G, vertex_src: &str, fragment_src: &str) -> Result<Self> {
        let vertex_src = if vertex_src.is_empty() { DEFAULT_VERTEX_SHADER } else { vertex_src };
        let fragment_src = if fragment_src.is_empty() { DEFAULT_FRAGMENT_SHADER } else { fragment_src };

        let vs = compile(gl, ShaderStage::Vertex, vertex_src)?;
        let fs = match compile(gl, ShaderStage::Fragment, fragment_src) {
            Ok(fs) => fs,
            Err(err) => {
                gl.delete_shader(vs);
                return Err(err);
            }
        };

        let linked = link(gl, vs, fs);

        // Shaders are flagged for deletion either way; a linked program keeps
        // its own copy of the binaries.
        gl.delete_shader(vs);
        gl.delete_shader(fs);

        let handle = linked?;
        log::debug!("program {handle:?} linked");
        Ok(Self { handle: Some(handle) })
    }

    /// Compiles the built-in default program.
    pub fn with_defaults<G: GlContext + ?Sized>(gl: &G) -> Result<Self> {
        Self::new(gl, "", "")
    }

    /// Native handle, `None` once released.
    #[inline]
    pub fn handle(&self) -> Option<ProgramHandle> {
        self.handle
    }

    /// Makes this the current program, replacing whichever one was active.
    pub fn activate<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.use_program(Some(self.live()));
    }

    /// Resolves a uniform by name. `None` when the program has no active
    /// uniform of that name; uploads to `None` are ignored by the backend.
    pub fn uniform_location<G: GlContext + ?Sized>(&self, gl: &G, name: &str) -> Option<UniformLocation> {
        let location = gl.uniform_location(self.live(), name);
        if location.is_none() {
            log::debug!("program {:?}: no active uniform named {name:?}", self.handle);
        }
        location
    }

    /// Uploads a column-major 4x4 matrix to `location` of the current program.
    pub fn set_uniform_matrix4<G: GlContext + ?Sized>(
        &self,
        gl: &G,
        location: Option<UniformLocation>,
        matrix: &[f32; 16],
    ) {
        gl.uniform_matrix4(location, matrix);
    }

    pub fn release<G: GlContext + ?Sized>(mut self, gl: &G) {
        if let Some(handle) = self.handle.take() {
            gl.delete_program(handle);
            log::debug!("program {handle:?} released");
        }
    }

    fn live(&self) -> ProgramHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("program used after release"),
        }
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("program {handle:?} dropped without release; native object leaked");
        }
    }
}

fn compile<G: GlContext + ?Sized>(gl: &G, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
    let shader = gl.create_shader(stage).map_err(GraphicsError::Backend)?;
    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.shader_compile_status(shader) {
        let log = gl.shader_info_log(shader);
        gl.delete_shader(shader);
        return Err(GraphicsError::ShaderCompile { stage, log });
    }
    Ok(shader)
}

fn link<G: GlContext + ?Sized>(gl: &G, vs: ShaderHandle, fs: ShaderHandle) -> Result<ProgramHandle> {
    let program = gl.create_program().map_err(GraphicsError::Backend)?;
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    let linked = gl.program_link_status(program);
    gl.detach_shader(program, vs);
    gl.detach_shader(program, fs);

    if !linked {
        let log = gl.program_info_log(program);
        gl.delete_program(program);
        return Err(GraphicsError::ProgramLink(log));
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GlCall, HeadlessContext};

    const VS: &str = "#version 300 es\nuniform mat4 projection;\nvoid main() {}";
    const FS: &str = "#version 300 es\nprecision mediump float;\nvoid main() {}";

    #[test]
    fn empty_sources_use_defaults() {
        let gl = HeadlessContext::new();
        let program = Program::new(&gl, "", "").unwrap();

        let shaders: Vec<_> = gl
            .calls()
            .iter()
            .filter_map(|c| match c {
                GlCall::CreateShader(stage, shader) => Some((*stage, *shader)),
                _ => None,
            })
            .collect();
        assert_eq!(shaders.len(), 2);
        assert_eq!(shaders[0].0, ShaderStage::Vertex);
        assert_eq!(shaders[1].0, ShaderStage::Fragment);

        // The default fragment stage declares its sampler.
        assert!(program.uniform_location(&gl, "ourTexture").is_some());
        program.release(&gl);
    }

    #[test]
    fn only_program_survives_creation() {
        let gl = HeadlessContext::new();
        let program = Program::new(&gl, VS, FS).unwrap();
        assert_eq!(gl.live_objects(), 1);
        program.release(&gl);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn compile_failure_reports_stage_and_cleans_up() {
        let gl = HeadlessContext::new();
        let err = Program::new(&gl, VS, "not glsl").unwrap_err();
        match err {
            GraphicsError::ShaderCompile { stage, log } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn unknown_uniform_is_none() {
        let gl = HeadlessContext::new();
        let program = Program::new(&gl, VS, FS).unwrap();
        assert_eq!(program.uniform_location(&gl, "projection"), Some(UniformLocation(0)));
        assert_eq!(program.uniform_location(&gl, "missing"), None);
        program.release(&gl);
    }

    #[test]
    fn matrix_upload_targets_current_program() {
        let gl = HeadlessContext::new();
        let program = Program::new(&gl, VS, FS).unwrap();
        let location = program.uniform_location(&gl, "projection");
        let m: [f32; 16] = std::array::from_fn(|i| i as f32);

        program.activate(&gl);
        program.set_uniform_matrix4(&gl, location, &m);
        assert_eq!(gl.current_program(), program.handle());
        assert_eq!(gl.uniform_matrix(program.handle().unwrap(), location.unwrap()), Some(m));

        // Uploading to a missing uniform is a silent no-op.
        program.set_uniform_matrix4(&gl, None, &m);
        assert!(gl.errors().is_empty());
        program.release(&gl);
    }

    #[test]
    fn activate_replaces_current_program() {
        let gl = HeadlessContext::new();
        let a = Program::new(&gl, VS, FS).unwrap();
        let b = Program::with_defaults(&gl).unwrap();
        a.activate(&gl);
        b.activate(&gl);
        assert_eq!(gl.current_program(), b.handle());
        a.release(&gl);
        b.release(&gl);
    }
}

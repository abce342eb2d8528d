use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use glam::Mat4;
use image::RgbaImage;

use super::projection::Projection;
use super::raster;
use crate::buffer::{Buffer, BufferKind, BufferUsage, FLOAT_SIZE};
use crate::context::{GlContext, UniformLocation};
use crate::element::ElementBuffer;
use crate::engine::{Engine, SharedListener, ViewportListener};
use crate::error::{GraphicsError, Result};
use crate::program::Program;
use crate::recorder::Recorder;
use crate::texture::Texture;

/// Font vertex stage: slot 0 = vec4 (position.xy, texcoord.zw).
pub const FONT_VERTEX_SHADER: &str = r#"#version 300 es

layout (location = 0) in vec4 vertex;
out vec2 TexCoord;

uniform mat4 projection;

void main() {
	gl_Position = projection * vec4(vertex.xy, 0.0, 1.0);
	TexCoord = vertex.zw;
}"#;

/// Font fragment stage: tints the red channel of the glyph texture white.
pub const FONT_FRAGMENT_SHADER: &str = r#"#version 300 es
precision mediump float;

in vec2 TexCoord;
out vec4 color;

uniform sampler2D text;

void main() {
	color = vec4(1.0) * texture(text, TexCoord).r;
}"#;

const VERTEX_SLOT: u32 = 0;
const QUAD_FLOATS: usize = 4 * 4;
const QUAD_INDICES: [[u32; 3]; 2] = [[0, 1, 2], [0, 2, 3]];

/// Font size and target resolution.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FontOptions {
    /// Size in points.
    pub size: f32,
    pub dpi: f32,
}

impl FontOptions {
    /// Rasterization size in pixels.
    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.size * self.dpi / 72.0
    }
}

impl Default for FontOptions {
    fn default() -> Self {
        Self { size: 12.0, dpi: 180.0 }
    }
}

/// Draws single lines of text as one textured quad per call.
///
/// Each draw rasterizes the string on the CPU, uploads the bitmap into a
/// throwaway texture and renders it through the font program. The font
/// registers with the engine on creation so its projection follows the
/// viewport; [`Font::release`] undoes that.
pub struct Font {
    face: fontdue::Font,
    px: f32,
    program: Program,
    recorder: Recorder,
    vbo: Buffer,
    ebo: ElementBuffer,
    projection_location: Option<UniformLocation>,
    projection: Rc<RefCell<Projection>>,
}

impl Font {
    /// Parses outline font bytes and builds the GPU pipeline for drawing it.
    pub fn new<C: GlContext>(engine: &mut Engine<C>, font_data: &[u8], options: FontOptions) -> Result<Self> {
        let px = options.pixel_size();
        let settings = fontdue::FontSettings {
            scale: px,
            ..fontdue::FontSettings::default()
        };
        let face = fontdue::Font::from_bytes(font_data, settings)
            .map_err(|e| GraphicsError::FontLoad(e.to_string()))?;

        let pipeline = Pipeline::build(engine.gl())?;
        let projection_location = pipeline.program.uniform_location(engine.gl(), "projection");

        let viewport = engine.viewport();
        let projection = Rc::new(RefCell::new(Projection::new(viewport.width, viewport.height)));
        engine.register_viewport_listener(projection.clone());

        log::debug!("font loaded at {px}px ({} glyphs)", face.glyph_count());
        let Pipeline { program, recorder, vbo, ebo } = pipeline;
        Ok(Self {
            face,
            px,
            program,
            recorder,
            vbo,
            ebo,
            projection_location,
            projection,
        })
    }

    /// Reads the whole font file from `reader`, then behaves like [`Font::new`].
    pub fn from_reader<C: GlContext, R: Read>(
        engine: &mut Engine<C>,
        mut reader: R,
        options: FontOptions,
    ) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::new(engine, &data, options)
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.px
    }

    /// Projection uploaded on the next draw.
    pub fn projection(&self) -> Mat4 {
        self.projection.borrow().matrix()
    }

    /// Recomputes the projection for a `width` x `height` viewport.
    ///
    /// Registered fonts get this from [`Engine::update_viewport`].
    pub fn update_viewport(&self, width: u32, height: u32) {
        self.projection.borrow_mut().update_viewport(width, height);
    }

    /// Size of the bitmap [`Font::draw`] would upload for `text`, `(0, 0)`
    /// when it leaves no ink.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        let glyphs = raster::layout(&self.face, self.px, text);
        raster::ink_box(&glyphs).map_or((0, 0), |ink| ink.size())
    }

    /// White-on-black bitmap of `text`; `None` when it leaves no ink.
    pub fn rasterize(&self, text: &str) -> Option<RgbaImage> {
        let glyphs = raster::layout(&self.face, self.px, text);
        let ink = raster::ink_box(&glyphs)?;
        Some(raster::render(&self.face, &glyphs, ink))
    }

    /// Draws `text` with its bitmap's bottom-left corner at `(x, y)`.
    ///
    /// Text without ink issues no GL calls.
    pub fn draw<G: GlContext + ?Sized>(&self, gl: &G, x: f32, y: f32, text: &str) -> Result<()> {
        let Some(bitmap) = self.rasterize(text) else {
            return Ok(());
        };
        let (w, h) = (bitmap.width() as f32, bitmap.height() as f32);

        self.program.activate(gl);
        self.recorder.activate(gl);

        let texture = match Texture::from_rgba_image(gl, &bitmap) {
            Ok(texture) => texture,
            Err(err) => {
                self.recorder.deactivate(gl);
                return Err(err);
            }
        };
        texture.bind(gl);

        #[rustfmt::skip]
        let vertices: [f32; QUAD_FLOATS] = [
            x,     y + h, 0.0, 0.0,
            x,     y,     0.0, 1.0,
            x + w, y,     1.0, 1.0,
            x + w, y + h, 1.0, 0.0,
        ];
        self.vbo.set_data(gl, 0, bytemuck::cast_slice(&vertices));

        let matrix = self.projection.borrow().matrix().to_cols_array();
        self.program.set_uniform_matrix4(gl, self.projection_location, &matrix);
        self.ebo.render(gl);

        texture.unbind(gl);
        texture.release(gl);
        self.recorder.deactivate(gl);
        Ok(())
    }

    /// Stops viewport notifications, then frees the index buffer, vertex
    /// buffer, recorder and program in that order.
    pub fn release<C: GlContext>(self, engine: &mut Engine<C>) {
        let Self { program, recorder, vbo, ebo, projection, .. } = self;

        let listener: SharedListener = projection;
        engine.deregister_viewport_listener(&listener);

        Pipeline { program, recorder, vbo, ebo }.release(engine.gl());
        log::debug!("font released");
    }
}

/// GPU objects shared by every draw of one font.
struct Pipeline {
    program: Program,
    recorder: Recorder,
    vbo: Buffer,
    ebo: ElementBuffer,
}

impl Pipeline {
    /// Creates the objects and records the quad layout into the recorder.
    /// Anything allocated before a failure is released again.
    fn build<G: GlContext + ?Sized>(gl: &G) -> Result<Self> {
        let program = Program::new(gl, FONT_VERTEX_SHADER, FONT_FRAGMENT_SHADER)?;

        let recorder = match Recorder::new(gl) {
            Ok(recorder) => recorder,
            Err(err) => {
                program.release(gl);
                return Err(err);
            }
        };

        recorder.activate(gl);
        let recorded = Self::record(gl);
        recorder.deactivate(gl);

        match recorded {
            Ok((vbo, ebo)) => Ok(Self { program, recorder, vbo, ebo }),
            Err(err) => {
                recorder.release(gl);
                program.release(gl);
                Err(err)
            }
        }
    }

    /// Must run with the recorder active.
    fn record<G: GlContext + ?Sized>(gl: &G) -> Result<(Buffer, ElementBuffer)> {
        let vbo = Buffer::new_empty(gl, BufferKind::Data, QUAD_FLOATS * FLOAT_SIZE, BufferUsage::Dynamic)?;

        let ebo = match ElementBuffer::new(gl, &QUAD_INDICES) {
            Ok(ebo) => ebo,
            Err(err) => {
                vbo.release(gl);
                return Err(err);
            }
        };

        if let Err(err) = vbo.bind_variable(gl, VERTEX_SLOT, 4, 4, 0) {
            ebo.release(gl);
            vbo.release(gl);
            return Err(err);
        }
        Ok((vbo, ebo))
    }

    fn release<G: GlContext + ?Sized>(self, gl: &G) {
        self.ebo.release(gl);
        self.vbo.release(gl);
        self.recorder.release(gl);
        self.program.release(gl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HeadlessContext;
    use crate::engine::EngineConfig;
    use crate::text::projection::ortho_for;

    fn system_font() -> Option<Vec<u8>> {
        [
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
        ]
        .iter()
        .find_map(|p| std::fs::read(p).ok())
    }

    fn engine() -> Engine<HeadlessContext> {
        Engine::new(HeadlessContext::new(), EngineConfig::default())
    }

    // ── options ───────────────────────────────────────────────────────────

    #[test]
    fn default_options_are_12pt_at_180dpi() {
        let options = FontOptions::default();
        assert_eq!((options.size, options.dpi), (12.0, 180.0));
        assert_eq!(options.pixel_size(), 30.0);
    }

    // ── construction failures ─────────────────────────────────────────────

    #[test]
    fn garbage_bytes_fail_before_any_allocation() {
        let mut engine = engine();
        let err = Font::new(&mut engine, b"definitely not a font", FontOptions::default()).err().unwrap();
        assert!(matches!(err, GraphicsError::FontLoad(_)));
        assert!(engine.gl().calls().is_empty());
        assert_eq!(engine.listener_count(), 0);
    }

    #[test]
    fn reader_failure_is_an_io_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let mut engine = engine();
        let err = Font::from_reader(&mut engine, Broken, FontOptions::default()).err().unwrap();
        assert!(matches!(err, GraphicsError::Io(_)));
    }

    #[test]
    fn missing_vertex_arrays_release_the_program() {
        let Some(data) = system_font() else { return };
        let mut engine = Engine::new(HeadlessContext::without_vertex_arrays(), EngineConfig::default());
        let err = Font::new(&mut engine, &data, FontOptions::default()).err().unwrap();
        assert!(matches!(err, GraphicsError::Unsupported(_)));
        assert_eq!(engine.gl().live_objects(), 0);
        assert_eq!(engine.listener_count(), 0);
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    #[test]
    fn create_registers_and_release_cleans_up() {
        let Some(data) = system_font() else { return };
        let mut engine = engine();
        let font = engine.create_font(&data, FontOptions::default()).unwrap();

        // program, recorder, vertex buffer, index buffer
        assert_eq!(engine.gl().live_objects(), 4);
        assert_eq!(engine.listener_count(), 1);
        assert_eq!(engine.gl().bound_vertex_array(), None);

        font.release(&mut engine);
        assert_eq!(engine.gl().live_objects(), 0);
        assert_eq!(engine.listener_count(), 0);
        assert!(engine.gl().errors().is_empty());
    }

    #[test]
    fn projection_follows_engine_viewport() {
        let Some(data) = system_font() else { return };
        let mut engine = engine();
        let font = Font::new(&mut engine, &data, FontOptions::default()).unwrap();
        assert_eq!(font.projection(), ortho_for(600, 800));

        engine.update_viewport(1024, 768);
        assert_eq!(font.projection(), ortho_for(1024, 768));

        engine.update_viewport(600, 800);
        let expected = Mat4::from_cols_array(&[
            1.0 / 600.0, 0.0, 0.0, 0.0,
            0.0, 1.0 / 800.0, 0.0, 0.0,
            0.0, 0.0, -2.0, 0.0,
            -1.0, -1.0, -1.0, 1.0,
        ]);
        assert!(font.projection().abs_diff_eq(expected, 1e-6));

        font.release(&mut engine);
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn draw_submits_one_textured_quad() {
        let Some(data) = system_font() else { return };
        let mut engine = engine();
        let font = Font::new(&mut engine, &data, FontOptions::default()).unwrap();
        let gl = engine.gl();
        gl.take_calls();

        let (w, h) = font.measure("Hello");
        assert!(w > 0 && h > 0);
        font.draw(gl, 10.0, 20.0, "Hello").unwrap();

        let draws = gl.draw_calls();
        assert_eq!(draws.len(), 1);
        let draw = draws[0];
        assert_eq!(draw.count, 6);
        assert_eq!(draw.program, font.program.handle());
        assert_eq!(draw.vertex_array, font.recorder.handle());
        assert_eq!(draw.element_buffer, font.ebo.handle());
        assert!(draw.texture.is_some());

        let (w, h) = (w as f32, h as f32);
        let expected = [
            10.0, 20.0 + h, 0.0, 0.0,
            10.0, 20.0, 0.0, 1.0,
            10.0 + w, 20.0, 1.0, 1.0,
            10.0 + w, 20.0 + h, 1.0, 0.0,
        ];
        let uploaded = gl.buffer_contents(font.vbo.handle().unwrap()).unwrap();
        assert_eq!(uploaded, bytemuck::cast_slice::<f32, u8>(&expected));

        let program = font.program.handle().unwrap();
        let location = font.projection_location.unwrap();
        assert_eq!(gl.uniform_matrix(program, location), Some(font.projection().to_cols_array()));

        // The per-draw texture is gone and the recorder is off again.
        assert_eq!(gl.live_objects(), 4);
        assert_eq!(gl.bound_texture(), None);
        assert_eq!(gl.bound_vertex_array(), None);
        assert!(gl.errors().is_empty());

        font.release(&mut engine);
    }

    #[test]
    fn inkless_text_issues_no_calls() {
        let Some(data) = system_font() else { return };
        let mut engine = engine();
        let font = Font::new(&mut engine, &data, FontOptions::default()).unwrap();
        engine.gl().take_calls();

        font.draw(engine.gl(), 0.0, 0.0, "").unwrap();
        font.draw(engine.gl(), 0.0, 0.0, "   ").unwrap();
        assert!(engine.gl().calls().is_empty());
        assert_eq!(font.measure(" "), (0, 0));
        assert!(font.rasterize("").is_none());

        font.release(&mut engine);
    }

    #[test]
    fn bitmap_is_opaque_white_on_black() {
        let Some(data) = system_font() else { return };
        let mut engine = engine();
        let font = Font::new(&mut engine, &data, FontOptions::default()).unwrap();

        let bitmap = font.rasterize("W").unwrap();
        assert_eq!(bitmap.dimensions(), font.measure("W"));
        assert!(bitmap.pixels().all(|p| p[3] == 255 && p[0] == p[1] && p[1] == p[2]));
        assert!(bitmap.pixels().any(|p| p[0] > 200));
        assert!(bitmap.pixels().any(|p| p[0] == 0));

        font.release(&mut engine);
    }
}

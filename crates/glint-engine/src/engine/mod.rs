//! Engine: owner of the rendering context and viewport.
//!
//! The engine sits between the application and the graphics backend:
//! - owns the [`GlContext`] every resource is created against
//! - tracks the viewport and fans resize notifications out to listeners
//! - clears the frame at the start of each render pass
//!
//! Resources never own the engine. They are created through it (or directly
//! against [`Engine::gl`]) and receive the context again on each call.

mod viewport;

use std::any::Any;
use std::rc::Rc;

use crate::buffer::{Buffer, BufferKind, BufferUsage};
use crate::context::GlContext;
use crate::element::{ElementBuffer, Indices};
use crate::error::{GraphicsError, Result};
use crate::program::Program;
use crate::recorder::Recorder;
use crate::text::{Font, FontOptions};
use crate::texture::Texture;

pub use viewport::{SharedListener, Viewport, ViewportListener};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Color the frame is cleared to by [`Engine::start_render`].
    pub clear_color: [f32; 4],

    /// Viewport assumed until the first [`Engine::update_viewport`].
    pub viewport: Viewport,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            viewport: Viewport::new(600, 800),
        }
    }
}

/// The graphics engine.
pub struct Engine<C: GlContext> {
    gl: C,
    clear_color: [f32; 4],
    viewport: Viewport,
    listeners: Vec<SharedListener>,
}

impl<C: GlContext> Engine<C> {
    pub fn new(gl: C, config: EngineConfig) -> Self {
        log::debug!("engine created, viewport {:?}", config.viewport);
        Self {
            gl,
            clear_color: config.clear_color,
            viewport: config.viewport,
            listeners: Vec::new(),
        }
    }

    /// Builds an engine from a type-erased native context.
    ///
    /// Fails with [`GraphicsError::UnsupportedContext`] when `native` is not a `C`.
    pub fn from_native(native: Box<dyn Any>, config: EngineConfig) -> Result<Self>
    where
        C: 'static,
    {
        match native.downcast::<C>() {
            Ok(gl) => Ok(Self::new(*gl, config)),
            Err(_) => Err(GraphicsError::UnsupportedContext(std::any::type_name::<C>())),
        }
    }

    /// The rendering context resources are driven through.
    #[inline]
    pub fn gl(&self) -> &C {
        &self.gl
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Starts a frame: applies the viewport and clears the color buffer.
    pub fn start_render(&self) {
        let Viewport { width, height } = self.viewport;
        self.gl.viewport(0, 0, width as i32, height as i32);
        self.gl.clear_color(self.clear_color);
        self.gl.clear_color_buffer();
    }

    pub fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.clear_color = rgba;
    }

    // ── viewport listeners ────────────────────────────────────────────────

    /// Adds a listener. Registering the same listener twice notifies it twice.
    pub fn register_viewport_listener(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    /// Removes the first registration of `listener`; no-op when absent.
    ///
    /// Removal swaps the last listener into the freed slot, so notification
    /// order is not preserved across removals.
    pub fn deregister_viewport_listener(&mut self, listener: &SharedListener) {
        if let Some(i) = self.listeners.iter().position(|l| Rc::ptr_eq(l, listener)) {
            self.listeners.swap_remove(i);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Stores the new surface size and notifies every listener before returning.
    pub fn update_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport::new(width, height);
        log::debug!("viewport {width}x{height}, {} listener(s)", self.listeners.len());
        for listener in &self.listeners {
            listener.borrow_mut().update_viewport(width, height);
        }
    }

    // ── factories ─────────────────────────────────────────────────────────

    pub fn create_buffer(&self, kind: BufferKind, data: &[u8], usage: BufferUsage) -> Result<Buffer> {
        Buffer::new(&self.gl, kind, data, usage)
    }

    pub fn create_empty_buffer(&self, kind: BufferKind, size: usize, usage: BufferUsage) -> Result<Buffer> {
        Buffer::new_empty(&self.gl, kind, size, usage)
    }

    pub fn create_element_buffer<'a>(&self, indices: impl Into<Indices<'a>>) -> Result<ElementBuffer> {
        ElementBuffer::new(&self.gl, indices)
    }

    /// Empty sources select the built-in defaults.
    pub fn create_program(&self, vertex_src: &str, fragment_src: &str) -> Result<Program> {
        Program::new(&self.gl, vertex_src, fragment_src)
    }

    pub fn create_texture(&self, image: &image::DynamicImage) -> Result<Texture> {
        Texture::from_image(&self.gl, image)
    }

    pub fn create_recorder(&self) -> Result<Recorder> {
        Recorder::new(&self.gl)
    }

    /// Loads a font and registers it for viewport updates.
    pub fn create_font(&mut self, font_data: &[u8], options: FontOptions) -> Result<Font> {
        Font::new(self, font_data, options)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::context::{GlCall, HeadlessContext};

    #[derive(Default)]
    struct Probe {
        seen: Vec<(u32, u32)>,
    }

    impl ViewportListener for Probe {
        fn update_viewport(&mut self, width: u32, height: u32) {
            self.seen.push((width, height));
        }
    }

    fn engine() -> Engine<HeadlessContext> {
        Engine::new(HeadlessContext::new(), EngineConfig::default())
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn from_native_accepts_matching_context() {
        let native: Box<dyn Any> = Box::new(HeadlessContext::new());
        let engine = Engine::<HeadlessContext>::from_native(native, EngineConfig::default()).unwrap();
        assert_eq!(engine.viewport(), Viewport::new(600, 800));
    }

    #[test]
    fn from_native_rejects_foreign_context() {
        let native: Box<dyn Any> = Box::new("not a context");
        let err = Engine::<HeadlessContext>::from_native(native, EngineConfig::default()).err().unwrap();
        assert!(matches!(err, GraphicsError::UnsupportedContext(_)));
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn start_render_sets_viewport_then_clears_black() {
        let mut engine = engine();
        engine.update_viewport(320, 240);
        engine.start_render();

        assert_eq!(
            engine.gl().calls(),
            vec![
                GlCall::Viewport { x: 0, y: 0, width: 320, height: 240 },
                GlCall::ClearColor([0.0, 0.0, 0.0, 1.0]),
                GlCall::Clear,
            ]
        );
    }

    // ── listeners ─────────────────────────────────────────────────────────

    #[test]
    fn update_notifies_all_listeners_synchronously() {
        let mut engine = engine();
        let a = Rc::new(RefCell::new(Probe::default()));
        let b = Rc::new(RefCell::new(Probe::default()));
        engine.register_viewport_listener(a.clone());
        engine.register_viewport_listener(b.clone());

        engine.update_viewport(1024, 768);

        assert_eq!(engine.viewport(), Viewport::new(1024, 768));
        assert_eq!(a.borrow().seen, vec![(1024, 768)]);
        assert_eq!(b.borrow().seen, vec![(1024, 768)]);
    }

    #[test]
    fn deregistered_listener_is_not_notified() {
        let mut engine = engine();
        let a = Rc::new(RefCell::new(Probe::default()));
        let b = Rc::new(RefCell::new(Probe::default()));
        let a_handle: SharedListener = a.clone();
        engine.register_viewport_listener(a_handle.clone());
        engine.register_viewport_listener(b.clone());

        engine.deregister_viewport_listener(&a_handle);
        engine.update_viewport(10, 20);

        assert!(a.borrow().seen.is_empty());
        assert_eq!(b.borrow().seen, vec![(10, 20)]);
        assert_eq!(engine.listener_count(), 1);
    }

    #[test]
    fn deregistering_unknown_listener_is_a_no_op() {
        let mut engine = engine();
        let a: SharedListener = Rc::new(RefCell::new(Probe::default()));
        let stranger: SharedListener = Rc::new(RefCell::new(Probe::default()));
        engine.register_viewport_listener(a);
        engine.deregister_viewport_listener(&stranger);
        assert_eq!(engine.listener_count(), 1);
    }

    #[test]
    fn duplicate_registration_is_kept() {
        let mut engine = engine();
        let probe = Rc::new(RefCell::new(Probe::default()));
        let handle: SharedListener = probe.clone();
        engine.register_viewport_listener(handle.clone());
        engine.register_viewport_listener(handle.clone());
        engine.update_viewport(1, 1);
        assert_eq!(probe.borrow().seen.len(), 2);

        engine.deregister_viewport_listener(&handle);
        assert_eq!(engine.listener_count(), 1);
    }

    // ── factories ─────────────────────────────────────────────────────────

    #[test]
    fn factories_use_engine_context() {
        let engine = engine();
        let program = engine.create_program("", "").unwrap();
        let recorder = engine.create_recorder().unwrap();
        let ebo = engine.create_element_buffer(&[[0, 1, 2]]).unwrap();
        let vbo = engine.create_empty_buffer(BufferKind::Data, 12, BufferUsage::Static).unwrap();
        assert_eq!(engine.gl().live_objects(), 4);

        vbo.release(engine.gl());
        ebo.release(engine.gl());
        recorder.release(engine.gl());
        program.release(engine.gl());
        assert_eq!(engine.gl().live_objects(), 0);
    }
}

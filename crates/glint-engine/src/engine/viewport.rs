use std::cell::RefCell;
use std::rc::Rc;

/// Rendering surface size in pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A component that recomputes internal state when the surface is resized.
pub trait ViewportListener {
    fn update_viewport(&mut self, width: u32, height: u32);
}

/// Shared handle under which listeners are registered with the engine.
///
/// Registration compares allocations, so the same `Rc` must be passed back
/// to deregister.
pub type SharedListener = Rc<RefCell<dyn ViewportListener>>;

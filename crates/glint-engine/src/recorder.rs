use crate::context::{GlContext, VertexArrayHandle};
use crate::error::{GraphicsError, Result};

/// Records buffer bind state so it can be switched back to in one call.
///
/// Backed by a vertex array object. While active it captures:
/// - the bound element buffer
/// - vertex attribute layouts set through [`Buffer::bind_variable`](crate::buffer::Buffer::bind_variable)
#[derive(Debug)]
pub struct Recorder {
    handle: Option<VertexArrayHandle>,
}

impl Recorder {
    /// Fails with [`GraphicsError::Unsupported`] when the backend has no
    /// vertex array objects; nothing is allocated in that case.
    pub fn new<G: GlContext + ?Sized>(gl: &G) -> Result<Self> {
        if !gl.supports_vertex_arrays() {
            return Err(GraphicsError::Unsupported("Recorder objects (vertex arrays)"));
        }
        let handle = gl.create_vertex_array().map_err(GraphicsError::Backend)?;
        log::debug!("recorder {handle:?} created");
        Ok(Self { handle: Some(handle) })
    }

    #[inline]
    pub fn handle(&self) -> Option<VertexArrayHandle> {
        self.handle
    }

    /// Switches to the recorded state and keeps recording into it.
    // TODO: skip the bind when already active; needs bind tracking per context.
    pub fn activate<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_vertex_array(Some(self.live()));
    }

    /// Binds the default (null) state.
    pub fn deactivate<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_vertex_array(None);
    }

    pub fn release<G: GlContext + ?Sized>(mut self, gl: &G) {
        if let Some(handle) = self.handle.take() {
            gl.delete_vertex_array(handle);
            log::debug!("recorder {handle:?} released");
        }
    }

    fn live(&self) -> VertexArrayHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("recorder used after release"),
        }
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("recorder {handle:?} dropped without release; native object leaked");
        }
    }
}

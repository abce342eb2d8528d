//! GPU data buffers.

use crate::context::{BufferHandle, GlContext};
use crate::error::{GraphicsError, Result};

pub use crate::context::{BufferKind, BufferUsage};

/// Size in bytes of one 32-bit float component.
pub const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

/// A buffer object holding either vertex data or element indices.
///
/// Creating the buffer leaves it bound to its kind's target. Every upload
/// rebinds it first, evicting whatever buffer of the same kind was bound.
/// The buffer must be handed back with [`Buffer::release`].
#[derive(Debug)]
pub struct Buffer {
    kind: BufferKind,
    handle: Option<BufferHandle>,
}

impl Buffer {
    /// Creates a buffer and fills it with `data`.
    pub fn new<G: GlContext + ?Sized>(
        gl: &G,
        kind: BufferKind,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<Self> {
        let buffer = Self::allocate(gl, kind)?;
        gl.buffer_data(kind, data, usage);
        log::debug!("buffer {:?} ({kind:?}) created with {} bytes", buffer.handle, data.len());
        Ok(buffer)
    }

    /// Creates a buffer reserving `size` uninitialised bytes.
    pub fn new_empty<G: GlContext + ?Sized>(
        gl: &G,
        kind: BufferKind,
        size: usize,
        usage: BufferUsage,
    ) -> Result<Self> {
        let buffer = Self::allocate(gl, kind)?;
        gl.buffer_init(kind, size, usage);
        log::debug!("buffer {:?} ({kind:?}) reserved {size} bytes", buffer.handle);
        Ok(buffer)
    }

    /// Like [`Buffer::new`] but takes the raw GL target value.
    ///
    /// An unknown target fails before anything is allocated.
    pub fn from_target<G: GlContext + ?Sized>(
        gl: &G,
        target: u32,
        data: &[u8],
        usage: BufferUsage,
    ) -> Result<Self> {
        let kind = BufferKind::try_from(target)?;
        Self::new(gl, kind, data, usage)
    }

    fn allocate<G: GlContext + ?Sized>(gl: &G, kind: BufferKind) -> Result<Self> {
        let handle = gl.create_buffer().map_err(GraphicsError::Backend)?;
        let buffer = Self {
            kind,
            handle: Some(handle),
        };
        buffer.bind(gl);
        Ok(buffer)
    }

    #[inline]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Native handle, `None` once released.
    #[inline]
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    /// Uploads `data` at byte `offset`, rebinding the buffer first.
    pub fn set_data<G: GlContext + ?Sized>(&self, gl: &G, offset: usize, data: &[u8]) {
        self.bind(gl);
        gl.buffer_sub_data(self.kind, offset, data);
        log::trace!("buffer {:?}: {} bytes at offset {offset}", self.handle, data.len());
    }

    /// Makes this buffer's 32-bit float data available to shaders at
    /// attribute slot `index`.
    ///
    /// - `components`: floats per attribute, 1 to 4
    /// - `stride`: floats per vertex entry
    /// - `offset`: float offset of the attribute within an entry
    pub fn bind_variable<G: GlContext + ?Sized>(
        &self,
        gl: &G,
        index: u32,
        components: i32,
        stride: usize,
        offset: usize,
    ) -> Result<()> {
        if !(1..=4).contains(&components) {
            return Err(GraphicsError::InvalidAttribute { components });
        }
        self.bind(gl);
        gl.vertex_attrib_pointer_f32(
            index,
            components,
            (stride * FLOAT_SIZE) as i32,
            (offset * FLOAT_SIZE) as i32,
        );
        gl.enable_vertex_attrib_array(index);
        Ok(())
    }

    // TODO: skip the bind when this buffer is already bound; needs bind
    // tracking per context.
    pub fn bind<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_buffer(self.kind, Some(self.live()));
    }

    /// Binds the default (null) buffer for this buffer's kind.
    pub fn unbind<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_buffer(self.kind, None);
    }

    /// Deletes the native buffer.
    pub fn release<G: GlContext + ?Sized>(mut self, gl: &G) {
        if let Some(handle) = self.handle.take() {
            gl.delete_buffer(handle);
            log::debug!("buffer {handle:?} released");
        }
    }

    fn live(&self) -> BufferHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("buffer used after release"),
        }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("buffer {handle:?} dropped without release; native object leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{GlCall, HeadlessContext};

    // ── create ────────────────────────────────────────────────────────────

    #[test]
    fn create_uploads_and_leaves_bound() {
        let gl = HeadlessContext::new();
        let data: [f32; 3] = [1.0, -2.5, 0.125];
        let buffer = Buffer::new(&gl, BufferKind::Data, bytemuck::cast_slice(&data), BufferUsage::Static).unwrap();
        let handle = buffer.handle().unwrap();

        assert_eq!(gl.bound_buffer(BufferKind::Data), Some(handle));
        let bytes = gl.buffer_contents(handle).unwrap();
        let expected: Vec<u8> = data.iter().flat_map(|f| f.to_le_bytes()).collect();
        assert_eq!(bytes, expected);

        buffer.release(&gl);
    }

    #[test]
    fn index_payload_round_trips_little_endian() {
        let gl = HeadlessContext::new();
        let indices: [u32; 3] = [0, 0x0102_0304, u32::MAX];
        let buffer =
            Buffer::new(&gl, BufferKind::Element, bytemuck::cast_slice(&indices), BufferUsage::Static).unwrap();

        let bytes = gl.buffer_contents(buffer.handle().unwrap()).unwrap();
        let expected: Vec<u8> = indices.iter().flat_map(|i| i.to_le_bytes()).collect();
        assert_eq!(bytes, expected);

        buffer.release(&gl);
    }

    #[test]
    fn empty_buffer_reserves_size() {
        let gl = HeadlessContext::new();
        let buffer = Buffer::new_empty(&gl, BufferKind::Data, 64, BufferUsage::Dynamic).unwrap();
        assert_eq!(gl.buffer_contents(buffer.handle().unwrap()).unwrap().len(), 64);
        assert!(gl.calls().contains(&GlCall::BufferInit {
            kind: BufferKind::Data,
            size: 64,
            usage: BufferUsage::Dynamic,
        }));
        buffer.release(&gl);
    }

    #[test]
    fn unknown_target_allocates_nothing() {
        let gl = HeadlessContext::new();
        let err = Buffer::from_target(&gl, 0xdead, &[1, 2, 3], BufferUsage::Static).unwrap_err();
        assert!(matches!(err, GraphicsError::UnknownBufferKind(0xdead)));
        assert!(gl.calls().is_empty());
        assert_eq!(gl.live_objects(), 0);
    }

    // ── set_data ──────────────────────────────────────────────────────────

    #[test]
    fn set_data_rebinds_before_upload() {
        let gl = HeadlessContext::new();
        let a = Buffer::new_empty(&gl, BufferKind::Data, 8, BufferUsage::Static).unwrap();
        let b = Buffer::new_empty(&gl, BufferKind::Data, 8, BufferUsage::Static).unwrap();
        assert_eq!(gl.bound_buffer(BufferKind::Data), b.handle());

        a.set_data(&gl, 4, &[1, 2, 3, 4]);
        assert_eq!(gl.bound_buffer(BufferKind::Data), a.handle());
        assert_eq!(gl.buffer_contents(a.handle().unwrap()).unwrap(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
        assert_eq!(gl.buffer_contents(b.handle().unwrap()).unwrap(), vec![0; 8]);

        a.release(&gl);
        b.release(&gl);
    }

    // ── bind_variable ─────────────────────────────────────────────────────

    #[test]
    fn bind_variable_converts_floats_to_bytes() {
        let gl = HeadlessContext::new();
        let buffer = Buffer::new_empty(&gl, BufferKind::Data, 80, BufferUsage::Static).unwrap();
        buffer.bind_variable(&gl, 1, 2, 5, 3).unwrap();

        let attribute = gl.attribute(None, 1).unwrap();
        assert_eq!(attribute.buffer, buffer.handle().unwrap());
        assert_eq!(attribute.components, 2);
        assert_eq!(attribute.stride, 20);
        assert_eq!(attribute.offset, 12);
        assert!(attribute.enabled);

        buffer.release(&gl);
    }

    #[test]
    fn bind_variable_rejects_bad_component_count() {
        let gl = HeadlessContext::new();
        let buffer = Buffer::new_empty(&gl, BufferKind::Data, 16, BufferUsage::Static).unwrap();
        for components in [0, 5] {
            let err = buffer.bind_variable(&gl, 0, components, 4, 0).unwrap_err();
            assert!(matches!(err, GraphicsError::InvalidAttribute { .. }));
        }
        assert!(gl.attribute(None, 0).is_none());
        buffer.release(&gl);
    }

    // ── release ───────────────────────────────────────────────────────────

    #[test]
    fn release_deletes_native_object() {
        let gl = HeadlessContext::new();
        let buffer = Buffer::new(&gl, BufferKind::Data, &[0; 4], BufferUsage::Static).unwrap();
        let handle = buffer.handle().unwrap();
        buffer.release(&gl);
        assert!(gl.buffer_contents(handle).is_none());
        assert_eq!(gl.calls().last(), Some(&GlCall::DeleteBuffer(handle)));
    }
}

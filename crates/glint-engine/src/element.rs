//! Triangle index buffers.

use std::ops::Deref;

use crate::buffer::{Buffer, BufferKind, BufferUsage};
use crate::context::GlContext;
use crate::error::{GraphicsError, Result};

/// Three indices into a data buffer forming one triangle.
pub type TriangleIndices = [u32; 3];

/// Index input accepted by [`ElementBuffer::new`].
#[derive(Debug, Copy, Clone)]
pub enum Indices<'a> {
    /// One entry per triangle.
    Triangles(&'a [TriangleIndices]),
    /// A flat list; its length must be a multiple of 3.
    Flat(&'a [u32]),
}

impl Indices<'_> {
    /// Number of individual indices.
    pub fn count(&self) -> usize {
        match self {
            Self::Triangles(t) => t.len() * 3,
            Self::Flat(f) => f.len(),
        }
    }

    fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Triangles(t) => bytemuck::cast_slice(t),
            Self::Flat(f) => bytemuck::cast_slice(f),
        }
    }
}

impl<'a> From<&'a [TriangleIndices]> for Indices<'a> {
    fn from(triangles: &'a [TriangleIndices]) -> Self {
        Self::Triangles(triangles)
    }
}

impl<'a, const N: usize> From<&'a [TriangleIndices; N]> for Indices<'a> {
    fn from(triangles: &'a [TriangleIndices; N]) -> Self {
        Self::Triangles(triangles)
    }
}

impl<'a> From<&'a [u32]> for Indices<'a> {
    fn from(flat: &'a [u32]) -> Self {
        Self::Flat(flat)
    }
}

impl<'a, const N: usize> From<&'a [u32; N]> for Indices<'a> {
    fn from(flat: &'a [u32; N]) -> Self {
        Self::Flat(flat)
    }
}

/// A [`Buffer`] of kind [`BufferKind::Element`] that knows how many indices
/// it holds and can draw them.
#[derive(Debug)]
pub struct ElementBuffer {
    buffer: Buffer,
    count: usize,
}

impl ElementBuffer {
    /// Uploads `indices` into a new element buffer (left bound).
    pub fn new<'a, G: GlContext + ?Sized>(gl: &G, indices: impl Into<Indices<'a>>) -> Result<Self> {
        let indices = indices.into();
        let count = indices.count();
        if count % 3 != 0 {
            return Err(GraphicsError::InvalidIndexCount(count));
        }

        let buffer = Buffer::new(gl, BufferKind::Element, indices.as_bytes(), BufferUsage::Static)?;
        Ok(Self { buffer, count })
    }

    /// Number of indices drawn by [`ElementBuffer::render`].
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Draws every index as a triangle list of unsigned 32-bit indices,
    /// starting at offset 0.
    ///
    /// Uses whatever program, texture and element binding are current; a
    /// [`Recorder`](crate::recorder::Recorder) that captured this buffer
    /// restores the binding.
    pub fn render<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.draw_triangles_u32(self.count as i32, 0);
    }

    pub fn release<G: GlContext + ?Sized>(self, gl: &G) {
        self.buffer.release(gl);
    }
}

impl Deref for ElementBuffer {
    type Target = Buffer;

    fn deref(&self) -> &Buffer {
        &self.buffer
    }
}

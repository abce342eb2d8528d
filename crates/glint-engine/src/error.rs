use thiserror::Error;

use crate::context::ShaderStage;

/// Errors surfaced by resource construction and drawing.
///
/// Every recoverable failure is returned to the immediate caller; nothing is
/// retried internally.
#[derive(Debug, Error)]
pub enum GraphicsError {
    /// A raw buffer target value did not name a known [`BufferKind`](crate::buffer::BufferKind).
    #[error("unknown buffer kind: {0:#x}")]
    UnknownBufferKind(u32),

    /// The backend lacks a capability the requested object needs.
    #[error("graphics backend does not support {0}")]
    Unsupported(&'static str),

    /// The native context handed to the engine is not of the expected type.
    #[error("unsupported rendering context, expected {0}")]
    UnsupportedContext(&'static str),

    /// The native context refused to allocate an object.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("{stage} shader failed to compile: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("program failed to link: {0}")]
    ProgramLink(String),

    /// A flat index list must describe whole triangles.
    #[error("index count {0} is not a multiple of 3")]
    InvalidIndexCount(usize),

    /// Vertex attributes carry between one and four components.
    #[error("vertex attribute with {components} components (allowed 1 to 4)")]
    InvalidAttribute { components: i32 },

    #[error("texture source has zero width or height")]
    EmptyImage,

    #[error("pixel data holds {actual} bytes, expected {expected}")]
    PixelData { expected: usize, actual: usize },

    #[error("could not parse font data: {0}")]
    FontLoad(String),

    #[error("could not read font data: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GraphicsError>;

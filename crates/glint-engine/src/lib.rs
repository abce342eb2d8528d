//! Thin OpenGL ES resource layer.
//!
//! Every GPU object wrapper here is created against a [`GlContext`] and takes
//! the context again on each call; nothing holds the context itself except the
//! [`Engine`]. Wrappers are released explicitly with a consuming `release`.
//!
//! Module overview:
//! - [`context`]: the backend seam, a `glow` implementation and a headless recorder
//! - [`buffer`], [`element`]: vertex and index buffers
//! - [`program`], [`texture`], [`recorder`]: shaders, images, vertex array state
//! - [`engine`]: context owner, frame start and viewport notifications
//! - [`text`]: bitmap text drawn as a single textured quad
//! - [`logging`]: `env_logger` setup for binaries

pub mod buffer;
pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod logging;
pub mod program;
pub mod recorder;
pub mod text;
pub mod texture;

pub use buffer::{Buffer, BufferKind, BufferUsage};
pub use context::{GlContext, HeadlessContext};
#[cfg(all(feature = "glow", not(target_arch = "wasm32")))]
pub use context::GlowContext;
pub use element::{ElementBuffer, Indices};
pub use engine::{Engine, EngineConfig, SharedListener, Viewport, ViewportListener};
pub use error::{GraphicsError, Result};
pub use program::Program;
pub use recorder::Recorder;
pub use text::{Font, FontOptions};
pub use texture::Texture;

//! Text rendering.
//!
//! A [`Font`] turns a string into a CPU bitmap with `fontdue`, uploads it as a
//! one-shot texture and draws it as a single quad in screen space. Glyph
//! coverage is stored white-on-black; the font shader reads the red channel.

mod font;
mod projection;
mod raster;

pub use font::{Font, FontOptions, FONT_FRAGMENT_SHADER, FONT_VERTEX_SHADER};

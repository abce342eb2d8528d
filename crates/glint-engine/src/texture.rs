//! 2D textures.

use image::{DynamicImage, RgbaImage};

use crate::context::{consts, GlContext, TextureHandle};
use crate::error::{GraphicsError, Result};

/// An RGBA8 2D texture, uploaded once at creation.
///
/// Sampling is clamp-to-edge with linear filtering on both axes. Only one
/// texture is bound at a time: [`Texture::bind`] evicts the previous one.
#[derive(Debug)]
pub struct Texture {
    handle: Option<TextureHandle>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Converts `image` to RGBA8 and uploads it.
    pub fn from_image<G: GlContext + ?Sized>(gl: &G, image: &DynamicImage) -> Result<Self> {
        Self::from_rgba_image(gl, &image.to_rgba8())
    }

    pub fn from_rgba_image<G: GlContext + ?Sized>(gl: &G, image: &RgbaImage) -> Result<Self> {
        Self::from_rgba(gl, image.width(), image.height(), image.as_raw())
    }

    /// Uploads tightly packed RGBA8 rows. The texture is left unbound.
    pub fn from_rgba<G: GlContext + ?Sized>(gl: &G, width: u32, height: u32, pixels: &[u8]) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::EmptyImage);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(GraphicsError::PixelData { expected, actual: pixels.len() });
        }

        let handle = gl.create_texture().map_err(GraphicsError::Backend)?;
        let (w, h) = (width as i32, height as i32);

        gl.bind_texture(Some(handle));
        gl.tex_image_rgba(w, h, None);
        gl.tex_sub_image_rgba(0, 0, w, h, pixels);

        gl.tex_parameter_i32(consts::TEXTURE_WRAP_S, consts::CLAMP_TO_EDGE);
        gl.tex_parameter_i32(consts::TEXTURE_WRAP_T, consts::CLAMP_TO_EDGE);
        gl.tex_parameter_i32(consts::TEXTURE_MIN_FILTER, consts::LINEAR);
        gl.tex_parameter_i32(consts::TEXTURE_MAG_FILTER, consts::LINEAR);

        gl.bind_texture(None);

        log::trace!("texture {handle:?} uploaded ({width}x{height})");
        Ok(Self {
            handle: Some(handle),
            width,
            height,
        })
    }

    #[inline]
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    // TODO: skip the bind when already bound; needs bind tracking per context.
    pub fn bind<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_texture(Some(self.live()));
    }

    pub fn unbind<G: GlContext + ?Sized>(&self, gl: &G) {
        gl.bind_texture(None);
    }

    pub fn release<G: GlContext + ?Sized>(mut self, gl: &G) {
        if let Some(handle) = self.handle.take() {
            gl.delete_texture(handle);
            log::trace!("texture {handle:?} released");
        }
    }

    fn live(&self) -> TextureHandle {
        match self.handle {
            Some(handle) => handle,
            None => unreachable!("texture used after release"),
        }
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            log::warn!("texture {handle:?} dropped without release; native object leaked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HeadlessContext;
    use image::{Luma, Rgba};

    #[test]
    fn upload_converts_to_rgba_and_unbinds() {
        let gl = HeadlessContext::new();
        let gray = image::GrayImage::from_pixel(3, 2, Luma([200]));
        let texture = Texture::from_image(&gl, &DynamicImage::ImageLuma8(gray)).unwrap();
        let handle = texture.handle().unwrap();

        assert_eq!(texture.size(), (3, 2));
        assert_eq!(gl.bound_texture(), None);

        let (w, h, pixels) = gl.texture_pixels(handle).unwrap();
        assert_eq!((w, h), (3, 2));
        assert_eq!(pixels.len(), 3 * 2 * 4);
        assert!(pixels.chunks_exact(4).all(|p| p == [200, 200, 200, 255]));

        texture.release(&gl);
    }

    #[test]
    fn sampling_is_clamped_and_linear() {
        let gl = HeadlessContext::new();
        let img = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 4]));
        let texture = Texture::from_rgba_image(&gl, &img).unwrap();
        let handle = texture.handle().unwrap();

        for (param, value) in [
            (consts::TEXTURE_WRAP_S, consts::CLAMP_TO_EDGE),
            (consts::TEXTURE_WRAP_T, consts::CLAMP_TO_EDGE),
            (consts::TEXTURE_MIN_FILTER, consts::LINEAR),
            (consts::TEXTURE_MAG_FILTER, consts::LINEAR),
        ] {
            assert_eq!(gl.texture_parameter(handle, param), Some(value));
        }
        texture.release(&gl);
    }

    #[test]
    fn bind_unbind_toggle_the_single_slot() {
        let gl = HeadlessContext::new();
        let a = Texture::from_rgba(&gl, 1, 1, &[0; 4]).unwrap();
        let b = Texture::from_rgba(&gl, 1, 1, &[0; 4]).unwrap();

        a.bind(&gl);
        b.bind(&gl);
        assert_eq!(gl.bound_texture(), b.handle());
        b.unbind(&gl);
        assert_eq!(gl.bound_texture(), None);

        a.release(&gl);
        b.release(&gl);
        assert_eq!(gl.live_objects(), 0);
    }

    #[test]
    fn empty_or_short_sources_are_rejected() {
        let gl = HeadlessContext::new();
        assert!(matches!(Texture::from_rgba(&gl, 0, 4, &[]), Err(GraphicsError::EmptyImage)));
        assert!(matches!(
            Texture::from_rgba(&gl, 2, 2, &[0; 8]),
            Err(GraphicsError::PixelData { expected: 16, actual: 8 })
        ));
        assert_eq!(gl.live_objects(), 0);
    }
}

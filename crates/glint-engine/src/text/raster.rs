use fontdue::layout::{CoordinateSystem, GlyphPosition, Layout, LayoutSettings, TextStyle};
use image::{Rgba, RgbaImage};

/// Integer pixel box enclosing every inked glyph of a line, inclusive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct InkBox {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl InkBox {
    /// Bitmap size covering the box with one pixel of slack on each axis.
    pub fn size(&self) -> (u32, u32) {
        (
            (self.max_x - self.min_x + 1) as u32,
            (self.max_y - self.min_y + 1) as u32,
        )
    }
}

/// Lays `text` out on a single line, top-left origin, y growing downwards.
pub(crate) fn layout(face: &fontdue::Font, px: f32, text: &str) -> Vec<GlyphPosition> {
    let mut layout: Layout<()> = Layout::new(CoordinateSystem::PositiveYDown);
    layout.reset(&LayoutSettings::default());
    layout.append(&[face], &TextStyle::new(text, px, 0));
    layout.glyphs().clone()
}

/// `None` when no glyph leaves ink (empty or whitespace-only text).
pub(crate) fn ink_box(glyphs: &[GlyphPosition]) -> Option<InkBox> {
    enclosing(glyphs.iter().map(|g| (g.x, g.y, g.width, g.height)))
}

fn enclosing(rects: impl Iterator<Item = (f32, f32, usize, usize)>) -> Option<InkBox> {
    rects
        .filter(|&(_, _, w, h)| w > 0 && h > 0)
        .map(|(x, y, w, h)| InkBox {
            min_x: x.floor() as i32,
            min_y: y.floor() as i32,
            max_x: (x + w as f32).ceil() as i32,
            max_y: (y + h as f32).ceil() as i32,
        })
        .reduce(|a, b| InkBox {
            min_x: a.min_x.min(b.min_x),
            min_y: a.min_y.min(b.min_y),
            max_x: a.max_x.max(b.max_x),
            max_y: a.max_y.max(b.max_y),
        })
}

/// Renders white-on-black coverage into an opaque RGBA bitmap sized to the
/// ink box. Overlapping glyphs keep the brighter sample.
pub(crate) fn render(face: &fontdue::Font, glyphs: &[GlyphPosition], ink: InkBox) -> RgbaImage {
    let (width, height) = ink.size();
    let mut bitmap = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));

    for glyph in glyphs.iter().filter(|g| g.width > 0 && g.height > 0) {
        let (metrics, coverage) = face.rasterize_config(glyph.key);
        let left = glyph.x.round() as i32 - ink.min_x;
        let top = glyph.y.round() as i32 - ink.min_y;

        for (row, line) in coverage.chunks_exact(metrics.width.max(1)).enumerate() {
            for (col, &c) in line.iter().enumerate() {
                let (px, py) = (left + col as i32, top + row as i32);
                if c == 0 || px < 0 || py < 0 || px as u32 >= width || py as u32 >= height {
                    continue;
                }
                let pixel = bitmap.get_pixel_mut(px as u32, py as u32);
                if c > pixel[0] {
                    *pixel = Rgba([c, c, c, 255]);
                }
            }
        }
    }
    bitmap
}

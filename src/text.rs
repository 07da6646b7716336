// =============================================================================
// duskgreet — Text Measurement & Rasterization
//
// Wraps cosmic-text for the two things the composer needs: measuring a
// string's natural size before any window exists, and blending shaped glyphs
// into a tiny-skia pixmap when a frame is painted.
// =============================================================================

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight};
use tiny_skia::Pixmap;

use crate::config::{FontStyle, Rgba};

/// A resolved font request: family by configured name, pixel size, weight
/// and slant.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDesc {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub style: FontStyle,
}

impl FontDesc {
    pub fn line_height(&self) -> f32 {
        self.size * 1.2
    }

    fn metrics(&self) -> Metrics {
        Metrics::new(self.size, self.line_height())
    }

    fn attrs(&self) -> Attrs<'_> {
        let style = match self.style {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
            FontStyle::Oblique => Style::Oblique,
        };
        Attrs::new()
            .family(Family::Name(&self.family))
            .weight(Weight(self.weight))
            .style(style)
    }
}

pub struct TextRenderer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextRenderer {
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    fn shape(&mut self, text: &str, font: &FontDesc) -> Buffer {
        let mut buffer = Buffer::new(&mut self.font_system, font.metrics());
        buffer.set_text(&mut self.font_system, text, font.attrs(), Shaping::Advanced);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Natural pixel size of a single-line string.
    pub fn measure(&mut self, text: &str, font: &FontDesc) -> (f32, f32) {
        let buffer = self.shape(text, font);

        let mut width = 0.0f32;
        let mut height = 0.0f32;
        for run in buffer.layout_runs() {
            width = width.max(run.line_w);
            height += font.line_height();
        }
        // An empty string still occupies one line vertically.
        if height == 0.0 {
            height = font.line_height();
        }
        (width, height)
    }

    /// Blend `text` into the pixmap with its top-left corner at (x, y).
    pub fn draw(&mut self, pixmap: &mut Pixmap, text: &str, x: i32, y: i32, font: &FontDesc, color: Rgba) {
        let buffer = self.shape(text, font);
        let (canvas_w, canvas_h) = (pixmap.width() as i32, pixmap.height() as i32);
        let data = pixmap.data_mut();

        for run in buffer.layout_runs() {
            let line_y = y as f32 + run.line_y;
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((x as f32, line_y), 1.0);
                let Some(image) = self
                    .swash_cache
                    .get_image(&mut self.font_system, physical.cache_key)
                else {
                    continue;
                };

                let glyph_x = physical.x + image.placement.left;
                let glyph_y = physical.y - image.placement.top;
                let rows = image.data.chunks(image.placement.width as usize);

                for (row_idx, row) in rows.enumerate() {
                    let py = glyph_y + row_idx as i32;
                    if py < 0 || py >= canvas_h {
                        continue;
                    }
                    for (col_idx, &coverage) in row.iter().enumerate() {
                        let px = glyph_x + col_idx as i32;
                        if px < 0 || px >= canvas_w || coverage == 0 {
                            continue;
                        }

                        let offset = ((py * canvas_w + px) * 4) as usize;
                        if offset + 3 >= data.len() {
                            continue;
                        }

                        // Source-over blend; the pixmap stores premultiplied
                        // RGBA, so the text color is premultiplied by its
                        // effective alpha first.
                        let alpha = coverage as f32 / 255.0 * color.a as f32 / 255.0;
                        let inv = 1.0 - alpha;
                        data[offset] = (color.r as f32 * alpha + data[offset] as f32 * inv) as u8;
                        data[offset + 1] =
                            (color.g as f32 * alpha + data[offset + 1] as f32 * inv) as u8;
                        data[offset + 2] =
                            (color.b as f32 * alpha + data[offset + 2] as f32 * inv) as u8;
                        data[offset + 3] =
                            (255.0 * alpha + data[offset + 3] as f32 * inv) as u8;
                    }
                }
            }
        }
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new()
    }
}
